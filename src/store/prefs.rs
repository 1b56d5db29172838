use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Keys used in the preference store.
pub mod keys {
    pub const CHECKER_LAYOUT: &str = "checker:size";
    pub const CHECKER_OS: &str = "checker:os";
    pub const LAST_TAB: &str = "checker:lastTab";
    pub const TYPING_PACK: &str = "typing:pack";
    pub const TYPING_LENGTH: &str = "typing:length";
    pub const THEME: &str = "theme";

    /// Last prompt shown for a pack and length tier.
    pub fn last_prompt(pack: &str, tier: &str) -> String {
        format!("typing:last:{pack}:{tier}")
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not create preference directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not write preferences to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Best-effort key/value store for user preferences. Absent or unreadable
/// values read as `None`; writes never fail from the caller's point of view.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

#[derive(Clone, Debug, Default)]
pub struct MemoryPrefStore {
    values: BTreeMap<String, String>,
}

impl MemoryPrefStore {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PreferenceStore for MemoryPrefStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Flat JSON object on disk, rewritten atomically on every change.
pub struct JsonPrefStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonPrefStore {
    pub fn new() -> Result<Self, StoreError> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keycheck");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&base_dir).map_err(|source| StoreError::CreateDir {
            path: base_dir.clone(),
            source,
        })?;
        let path = base_dir.join("prefs.json");
        let values = load_values(&path);
        debug!(path = %path.display(), entries = values.len(), "preferences loaded");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StoreError> {
        let tmp_path = self.path.with_extension("tmp");
        let json = serde_json::to_string_pretty(&self.values)?;
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = fs::File::create(&tmp_path).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        fs::rename(&tmp_path, &self.path).map_err(write_err)?;
        Ok(())
    }
}

fn load_values(path: &Path) -> BTreeMap<String, String> {
    let Ok(content) = fs::read_to_string(path) else {
        return BTreeMap::new();
    };
    match serde_json::from_str(&content) {
        Ok(values) => values,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable preferences");
            BTreeMap::new()
        }
    }
}

impl PreferenceStore for JsonPrefStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        if self.values.get(key).map(String::as_str) == Some(value) {
            return;
        }
        self.values.insert(key.to_string(), value.to_string());
        if let Err(e) = self.save() {
            warn!(key, "{e}");
        }
    }
}

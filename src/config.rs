use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::keyboard::display::HostOs;
use crate::keyboard::layout::FormFactor;
use crate::prompts::picker::DEFAULT_REPEAT_ATTEMPTS;
use crate::prompts::{DEFAULT_PACK, LengthTier};

pub const MAX_REPEAT_ATTEMPTS: u32 = 20;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_layout")]
    pub default_layout: String,
    #[serde(default = "default_pack")]
    pub default_pack: String,
    #[serde(default = "default_length")]
    pub default_length: String,
    #[serde(default = "default_host_os")]
    pub host_os: String,
    #[serde(default = "default_prompt_repeat_attempts")]
    pub prompt_repeat_attempts: u32,
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_theme() -> String {
    "dark".to_string()
}
fn default_layout() -> String {
    FormFactor::default().as_str().to_string()
}
fn default_pack() -> String {
    DEFAULT_PACK.to_string()
}
fn default_length() -> String {
    LengthTier::default().as_str().to_string()
}
fn default_host_os() -> String {
    HostOs::default().as_str().to_string()
}
fn default_prompt_repeat_attempts() -> u32 {
    DEFAULT_REPEAT_ATTEMPTS
}
fn default_log_file() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keycheck")
        .join("keycheck.log")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            default_layout: default_layout(),
            default_pack: default_pack(),
            default_length: default_length(),
            host_os: default_host_os(),
            prompt_repeat_attempts: default_prompt_repeat_attempts(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keycheck")
            .join("config.toml")
    }

    /// Reset unknown selectors to their defaults and clamp numeric ranges.
    /// Returns one note per value that was changed, for the caller to log
    /// once logging is up.
    pub fn validate(&mut self) -> Vec<String> {
        let mut notes = Vec::new();
        if FormFactor::parse(&self.default_layout).is_none() {
            notes.push(format!("unknown default_layout `{}`", self.default_layout));
            self.default_layout = default_layout();
        }
        if LengthTier::parse(&self.default_length).is_none() {
            notes.push(format!("unknown default_length `{}`", self.default_length));
            self.default_length = default_length();
        }
        if HostOs::parse(&self.host_os).is_none() {
            notes.push(format!("unknown host_os `{}`", self.host_os));
            self.host_os = default_host_os();
        }
        if self.default_pack.trim().is_empty() {
            self.default_pack = default_pack();
        }
        if self.theme.trim().is_empty() {
            self.theme = default_theme();
        }
        let attempts = self.prompt_repeat_attempts.clamp(1, MAX_REPEAT_ATTEMPTS);
        if attempts != self.prompt_repeat_attempts {
            notes.push(format!(
                "prompt_repeat_attempts {} clamped to {attempts}",
                self.prompt_repeat_attempts
            ));
            self.prompt_repeat_attempts = attempts;
        }
        notes
    }

    pub fn form_factor(&self) -> FormFactor {
        FormFactor::from_selector(&self.default_layout)
    }

    pub fn length_tier(&self) -> LengthTier {
        LengthTier::parse(&self.default_length).unwrap_or_default()
    }

    pub fn os(&self) -> HostOs {
        HostOs::parse(&self.host_os).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.theme, "dark");
        assert_eq!(config.default_layout, "60%");
        assert_eq!(config.default_pack, "bourdain");
        assert_eq!(config.prompt_repeat_attempts, 5);
        assert!(config.log_file.ends_with("keycheck.log"));
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
theme = "light"
default_layout = "tkl"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.theme, "light");
        assert_eq!(config.form_factor(), FormFactor::Tkl);
        assert_eq!(config.length_tier(), LengthTier::Short);
        assert_eq!(config.os(), HostOs::Windows);
    }

    #[test]
    fn test_validate_resets_and_clamps() {
        let mut config = Config {
            default_layout: "40%".to_string(),
            default_length: "epic".to_string(),
            host_os: "beos".to_string(),
            prompt_repeat_attempts: 500,
            ..Config::default()
        };
        let notes = config.validate();
        assert_eq!(notes.len(), 4);
        assert!(notes[0].contains("40%"));
        assert_eq!(config.default_layout, "60%");
        assert_eq!(config.default_length, "short");
        assert_eq!(config.host_os, "windows");
        assert_eq!(config.prompt_repeat_attempts, MAX_REPEAT_ATTEMPTS);
        assert!(config.validate().is_empty());

        config.prompt_repeat_attempts = 0;
        assert_eq!(config.validate().len(), 1);
        assert_eq!(config.prompt_repeat_attempts, 1);
    }

    #[test]
    fn test_invalid_values_in_file_are_reported_on_validate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_layout = \"40%\"\nhost_os = \"mac\"\n").unwrap();
        let mut config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_layout, "40%");
        let notes = config.validate();
        assert_eq!(notes, vec!["unknown default_layout `40%`".to_string()]);
        assert_eq!(config.form_factor(), FormFactor::Sixty);
        assert_eq!(config.os(), HostOs::Mac);
    }

    #[test]
    fn test_save_then_load_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            default_layout: "100%".to_string(),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.form_factor(), FormFactor::Full);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.theme, "dark");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "theme = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}

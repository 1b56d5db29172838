//! File logging. The terminal belongs to the TUI, so tracing output goes to a
//! log file filtered by `RUST_LOG` (default `info`).

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber. Returns `false` when the log file cannot be
/// opened or a subscriber is already set; the app runs without logs then.
pub fn init_global(log_file_path: &Path) -> bool {
    if let Some(parent) = log_file_path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return false;
        }
    }
    let Ok(log_file) = File::create(log_file_path) else {
        return false;
    };
    build_subscriber(log_file, env_filter()).try_init().is_ok()
}

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn build_subscriber(
    log_file: File,
    filter: EnvFilter,
) -> impl tracing::Subscriber + Send + Sync {
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_info_is_written_and_debug_filtered() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap(), EnvFilter::new("info"));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(layout = "tkl", "checker session finished");
            tracing::debug!("checker reset");
        });

        let contents = fs::read_to_string(log_file.path()).unwrap();
        assert!(contents.contains("checker session finished"));
        assert!(contents.contains("layout=\"tkl\""));
        assert!(!contents.contains("checker reset"));
    }
}

//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once the configuration is known
//! - Write to the console and to `<logs_dir>/fHDHR.log`
//!
//! # Design Decisions
//! - Level comes from `logging.level`; `RUST_LOG` takes precedence
//! - The log file is plain text (no ANSI escapes)

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file name under the logs directory.
pub const LOG_FILE: &str = "fHDHR.log";

/// Open (or create) the log file for appending.
pub fn open_log_file(logs_dir: &Path) -> std::io::Result<(PathBuf, File)> {
    let path = logs_dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

/// Build the level filter for a configured level.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fhdhr={},tower_http={}", level, level)))
}

/// Install the global subscriber.
pub fn init_logging(level: &str, logs_dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let (path, file) = open_log_file(logs_dir)?;

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_is_created_under_logs_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (path, _file) = open_log_file(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("fHDHR.log"));
        assert!(path.is_file());
    }
}

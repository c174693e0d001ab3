//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Probe the environment and external tools
//!
//! # Design Decisions
//! - Fail fast: any configuration error is fatal
//! - Single-threaded and synchronous; finishes before anything reads the
//!   configuration

use std::path::Path;
use std::sync::Arc;

use crate::config::{load_config, Config, ConfigError};
use crate::lifecycle::versions::{probe_versions, Versions};

/// Everything produced by the boot sequence.
#[derive(Debug, Clone)]
pub struct Boot {
    pub config: Arc<Config>,
    pub versions: Versions,
}

pub fn boot(override_path: &Path, script_dir: &Path) -> Result<Boot, ConfigError> {
    let config = Arc::new(load_config(override_path, script_dir)?);
    let versions = probe_versions(&config.snapshot());

    Ok(Boot { config, versions })
}

//! Persisting single option updates.
//!
//! An update changes the in-memory tree and rewrites the whole override
//! file. The `main.dictpopname` section lives in memory as `origin` but is
//! always written to disk under its original name.

use std::fs;
use std::path::Path;
use std::sync::PoisonError;

use crate::config::effective::{EffectiveConfig, ORIGIN_SECTION};
use crate::config::loader::{read_override_file, ConfigError};
use crate::config::store::Config;
use crate::config::value::ConfigValue;

/// Apply an update to the in-memory tree.
pub fn apply_update(
    config: &mut EffectiveConfig,
    dictpopname: &str,
    section: &str,
    key: &str,
    value: ConfigValue,
) {
    if section.eq_ignore_ascii_case(dictpopname) {
        config.set(ORIGIN_SECTION, key, value);
    } else {
        config.set(section, key, value);
    }
}

/// Read-modify-write one option in the override file.
pub fn persist(path: &Path, section: &str, key: &str, value: &ConfigValue) -> Result<(), ConfigError> {
    let mut doc = read_override_file(path)?;
    doc.set(section, key, &value.to_ini_string());

    fs::write(path, doc.render()).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Config {
    /// Update one option and persist it to the override file.
    ///
    /// The in-memory change is kept even when the file rewrite fails; the
    /// failure is returned to the caller.
    pub fn write(&self, section: &str, key: &str, value: ConfigValue) -> Result<(), ConfigError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = EffectiveConfig::clone(&self.snapshot());
        apply_update(&mut next, self.dictpopname(), section, key, value.clone());
        self.replace(next);

        if let Err(e) = persist(self.override_path(), section, key, &value) {
            tracing::warn!(
                section = %section,
                key = %key,
                error = %e,
                "Failed to persist configuration update"
            );
            return Err(e);
        }

        tracing::info!(section = %section, key = %key, "Configuration updated");
        Ok(())
    }
}

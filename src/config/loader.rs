//! Configuration loading from disk.
//!
//! Boot runs baseline definitions, then the override file, then
//! validation. Any failure here is fatal to startup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::effective::EffectiveConfig;
use crate::config::ini::{IniDocument, IniError};
use crate::config::paths::InternalPaths;
use crate::config::schema::{load_schema, Schema};
use crate::config::store::Config;
use crate::config::validation::validate_config;
use crate::config::value::coerce_override;

/// Error type for configuration loading, validation and persistence.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed definition file {}: {reason}", path.display())]
    Schema { path: PathBuf, reason: String },

    #[error("Malformed configuration file {}: {source}", path.display())]
    Override {
        path: PathBuf,
        #[source]
        source: IniError,
    },

    #[error("Invalid Threading Method: {0}")]
    InvalidThreadMethod(String),

    #[error("Required configuration options missing: {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    #[error("Section named by main.dictpopname not found: {0}")]
    MissingPopSection(String),

    #[error("Invalid EPG Method: {0}")]
    InvalidEpgMethod(String),

    #[error("Invalid EPG Method: no method selected")]
    EmptyEpgMethod,

    #[error("Invalid Cache Directory: {}", .0.display())]
    InvalidCacheDir(PathBuf),

    #[error("Invalid stream type: {0}")]
    InvalidStreamType(String),
}

/// Read the override file. A missing file reads as empty.
pub fn read_override_file(path: &Path) -> Result<IniDocument, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(IniDocument::new()),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    IniDocument::parse(&content).map_err(|source| ConfigError::Override {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge override values into the tree.
///
/// Options with a baseline definition are only taken when that definition
/// allows file edits; options without one are always taken.
pub fn apply_overrides(doc: &IniDocument, config: &mut EffectiveConfig, schema: &Schema) {
    for section in doc.sections() {
        config.section_entry(section);

        for (key, raw) in doc.items(section) {
            let value = coerce_override(&raw);

            if let Some(entry) = schema.get(section, &key) {
                if !entry.file_editable() {
                    tracing::debug!(
                        section = %section,
                        key = %key,
                        "Ignoring override for option that is not file-editable"
                    );
                    continue;
                }
            }

            config.set(section, &key, value);
        }
    }
}

/// Load, merge and validate configuration.
pub fn load_config(override_path: &Path, script_dir: &Path) -> Result<Config, ConfigError> {
    let mut paths = InternalPaths::new(script_dir);
    let mut config = EffectiveConfig::new();

    let schema = load_schema(&paths.internal_config, &mut config)?;

    tracing::info!(path = %override_path.display(), "Loading Configuration File");
    let overrides = read_override_file(override_path)?;
    apply_overrides(&overrides, &mut config, &schema);

    let dictpopname = validate_config(&mut config, &mut paths, override_path)?;

    Ok(Config::new(
        config,
        schema,
        paths,
        override_path.to_path_buf(),
        dictpopname,
    ))
}

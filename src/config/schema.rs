//! Baseline option definitions.
//!
//! Each `*.json` file under the internal config directory maps
//! section → key → `{ value, config_file?, config_web?, config_web_hidden? }`.
//! Loading seeds the effective tree with coerced defaults and records the
//! per-option permission flags. Files are read in file-name order and later
//! files replace earlier entries for the same section/key.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::effective::EffectiveConfig;
use crate::config::loader::ConfigError;
use crate::config::value::{coerce_default, coerce_flag, ConfigValue};

/// One baseline option.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub section: String,
    pub key: String,
    pub value: ConfigValue,
    /// Whether the override file may change the option. `None` when the
    /// definition sets it to none.
    pub config_file: Option<bool>,
    /// Whether the option is exposed on the settings surface.
    pub config_web: Option<bool>,
    /// Whether the exposed value is masked.
    pub config_web_hidden: Option<bool>,
}

impl SchemaEntry {
    pub fn file_editable(&self) -> bool {
        self.config_file.unwrap_or(false)
    }

    pub fn web_visible(&self) -> bool {
        self.config_web.unwrap_or(false)
    }

    pub fn web_hidden(&self) -> bool {
        self.config_web_hidden.unwrap_or(false)
    }
}

/// Lookup table of every baseline option, keyed by lower-cased names.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entries: BTreeMap<(String, String), SchemaEntry>,
}

impl Schema {
    pub fn get(&self, section: &str, key: &str) -> Option<&SchemaEntry> {
        self.entries
            .get(&(section.to_lowercase(), key.to_lowercase()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, entry: SchemaEntry) {
        self.entries
            .insert((entry.section.clone(), entry.key.clone()), entry);
    }
}

fn flag_absent() -> serde_json::Value {
    serde_json::Value::Bool(false)
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    value: serde_json::Value,
    #[serde(default = "flag_absent")]
    config_file: serde_json::Value,
    #[serde(default = "flag_absent")]
    config_web: serde_json::Value,
    #[serde(default = "flag_absent")]
    config_web_hidden: serde_json::Value,
}

type RawDefinitions = BTreeMap<String, BTreeMap<String, RawEntry>>;

fn raw_value(path: &Path, section: &str, key: &str, raw: &serde_json::Value) -> Result<ConfigValue, ConfigError> {
    match raw {
        serde_json::Value::String(s) => Ok(coerce_default(s)),
        serde_json::Value::Null => Ok(ConfigValue::None),
        serde_json::Value::Bool(b) => Ok(ConfigValue::Bool(*b)),
        serde_json::Value::Number(n) => Ok(match n.as_i64() {
            Some(i) => ConfigValue::Int(i),
            None => ConfigValue::Float(n.as_f64().unwrap_or_default()),
        }),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(ConfigValue::List)
            .ok_or_else(|| ConfigError::Schema {
                path: path.to_path_buf(),
                reason: format!("{}/{}: list values must be strings", section, key),
            }),
        serde_json::Value::Object(_) => Err(ConfigError::Schema {
            path: path.to_path_buf(),
            reason: format!("{}/{}: value must not be an object", section, key),
        }),
    }
}

/// Merge one definition file into the tree and the schema.
pub fn read_definition_file(
    path: &Path,
    config: &mut EffectiveConfig,
    schema: &mut Schema,
) -> Result<(), ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let definitions: RawDefinitions =
        serde_json::from_str(&content).map_err(|e| ConfigError::Schema {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    for (section, keys) in definitions {
        let section = section.to_lowercase();
        config.section_entry(&section);

        for (key, raw) in keys {
            let key = key.to_lowercase();
            let value = raw_value(path, &section, &key, &raw.value)?;

            config.set(&section, &key, value.clone());
            schema.insert(SchemaEntry {
                section: section.clone(),
                key,
                value,
                config_file: coerce_flag(&raw.config_file),
                config_web: coerce_flag(&raw.config_web),
                config_web_hidden: coerce_flag(&raw.config_web_hidden),
            });
        }
    }

    Ok(())
}

fn definition_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let read_dir = fs::read_dir(dir).map_err(|source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every definition file in `dir`.
pub fn load_schema(dir: &Path, config: &mut EffectiveConfig) -> Result<Schema, ConfigError> {
    let mut schema = Schema::default();
    for path in definition_files(dir)? {
        tracing::debug!(path = %path.display(), "Reading baseline definitions");
        read_definition_file(&path, config, &mut schema)?;
    }

    tracing::debug!(options = schema.len(), "Baseline definitions loaded");
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_defaults_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "main.json",
            r#"{
                "Main": {
                    "uuid": {"value": "none", "config_file": true, "config_web": "none"},
                    "Port": {"value": "5004"},
                    "methods": {"value": "blocks,origin", "config_web": "True", "config_web_hidden": null}
                }
            }"#,
        );

        let mut config = EffectiveConfig::new();
        let schema = load_schema(dir.path(), &mut config).unwrap();

        assert_eq!(config.get("main", "uuid"), Some(&ConfigValue::None));
        assert_eq!(config.get("main", "port"), Some(&ConfigValue::Int(5004)));

        let uuid = schema.get("MAIN", "UUID").unwrap();
        assert_eq!(uuid.config_file, Some(true));
        assert_eq!(uuid.config_web, None);
        assert_eq!(uuid.config_web_hidden, Some(false));

        let port = schema.get("main", "port").unwrap();
        assert!(!port.file_editable());

        let methods = schema.get("main", "methods").unwrap();
        assert!(methods.web_visible());
        assert_eq!(methods.config_web_hidden, None);
        assert_eq!(
            methods.value,
            ConfigValue::List(vec!["blocks".into(), "origin".into()])
        );
    }

    #[test]
    fn test_later_files_win() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", r#"{"main": {"level": {"value": "info"}, "keep": {"value": "1"}}}"#);
        write(dir.path(), "b.json", r#"{"main": {"level": {"value": "debug", "config_file": true}}}"#);
        write(dir.path(), "notes.txt", "not json at all");

        let mut config = EffectiveConfig::new();
        let schema = load_schema(dir.path(), &mut config).unwrap();

        assert_eq!(config.get_str("main", "level"), Some("debug"));
        assert_eq!(config.get("main", "keep"), Some(&ConfigValue::Int(1)));
        assert!(schema.get("main", "level").unwrap().file_editable());
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.json", r#"{"main": {"uuid": {"config_file": true}}}"#);

        let mut config = EffectiveConfig::new();
        let err = load_schema(dir.path(), &mut config).unwrap_err();
        assert!(matches!(err, ConfigError::Schema { .. }));

        write(dir.path(), "bad.json", "{ not json");
        let err = load_schema(dir.path(), &mut config).unwrap_err();
        assert!(matches!(err, ConfigError::Schema { .. }));
    }

    #[test]
    fn test_native_json_values() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "native.json",
            r#"{"epg": {"days": {"value": 7}, "on": {"value": true}, "list": {"value": ["a"]}}}"#,
        );

        let mut config = EffectiveConfig::new();
        load_schema(dir.path(), &mut config).unwrap();

        assert_eq!(config.get("epg", "days"), Some(&ConfigValue::Int(7)));
        assert_eq!(config.get("epg", "on"), Some(&ConfigValue::Bool(true)));
        assert_eq!(config.get("epg", "list"), Some(&ConfigValue::List(vec!["a".into()])));
    }
}

//! Configuration validation and derived values.
//!
//! # Responsibilities
//! - Enforce enumerated options (`main.thread_method`, `fhdhr.stream_type`)
//! - Check every `main.required` option, reporting all missing at once
//! - Move the `main.dictpopname` section to `origin`
//! - Resolve `epg.method` against `main.valid_epg_methods` and derive
//!   `epg.def_method`
//! - Generate and persist `main.uuid` when unset
//! - Resolve the cache directory, create `logs/`, derive `database.path`
//! - Derive `fhdhr.discovery_address`
//!
//! # Design Decisions
//! - Runs exactly once, after baseline and override loading
//! - Steps run in a fixed order; later steps see earlier results

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::config::effective::{
    EffectiveConfig, StreamType, ThreadMethod, ORIGIN_SECTION, WILDCARD_ADDRESS,
};
use crate::config::loader::ConfigError;
use crate::config::paths::InternalPaths;
use crate::config::value::ConfigValue;
use crate::config::writer::{apply_update, persist};

/// Alphabet for generated device identifiers.
const UUID_ALPHABET: &[u8] = b"hijklmnopqrstuvwxyz";

/// Length of a generated device identifier.
const UUID_LEN: usize = 8;

/// Database file name under the cache directory.
const DATABASE_FILE: &str = "fhdhr.db";

/// Literal that disables a method selection.
const NONE_LITERAL: &str = "None";

fn check_thread_method(config: &EffectiveConfig) -> Result<ThreadMethod, ConfigError> {
    config.thread_method().ok_or_else(|| {
        ConfigError::InvalidThreadMethod(config.value("main", "thread_method").to_string())
    })
}

fn check_required(config: &mut EffectiveConfig) -> Result<(), ConfigError> {
    let required = config.value("main", "required");
    if !required.is_truthy() {
        return Ok(());
    }

    let required = required.to_list();
    let missing: Vec<String> = required
        .iter()
        .filter(|item| {
            let present = item
                .split_once('/')
                .and_then(|(section, key)| config.get(section, key))
                .is_some_and(ConfigValue::is_truthy);
            !present
        })
        .cloned()
        .collect();

    config.set("main", "required", ConfigValue::List(required));

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingRequired(missing))
    }
}

fn pop_origin(config: &mut EffectiveConfig) -> Result<String, ConfigError> {
    let dictpopname = config
        .dictpopname()
        .map(str::to_lowercase)
        .ok_or_else(|| ConfigError::MissingPopSection(config.value("main", "dictpopname").to_string()))?;

    let contents = config
        .remove_section(&dictpopname)
        .ok_or_else(|| ConfigError::MissingPopSection(dictpopname.clone()))?;
    config.insert_section(ORIGIN_SECTION, contents);

    Ok(dictpopname)
}

fn resolve_epg_methods(config: &mut EffectiveConfig, dictpopname: &str) -> Result<(), ConfigError> {
    let valid = config.valid_epg_methods();
    config.set("main", "valid_epg_methods", ConfigValue::List(valid.clone()));

    let method = config.value("epg", "method");
    if method.is_none() || method.as_str() == Some(NONE_LITERAL) {
        config.set("epg", "method", ConfigValue::List(Vec::new()));
        config.set("epg", "def_method", ConfigValue::None);
        return Ok(());
    }

    let mut resolved = Vec::new();
    for candidate in method.to_list() {
        if candidate.eq_ignore_ascii_case(dictpopname) || candidate == ORIGIN_SECTION {
            resolved.push(ORIGIN_SECTION.to_string());
        } else if candidate == NONE_LITERAL {
            return Err(ConfigError::InvalidEpgMethod(candidate));
        } else if valid.contains(&candidate) {
            resolved.push(candidate);
        } else {
            return Err(ConfigError::InvalidEpgMethod(candidate));
        }
    }

    let def_method = resolved.first().cloned().ok_or(ConfigError::EmptyEpgMethod)?;
    config.set("epg", "method", ConfigValue::List(resolved));
    config.set("epg", "def_method", ConfigValue::Str(def_method));
    Ok(())
}

/// Generate a device identifier.
pub fn generate_uuid<R: Rng>(rng: &mut R) -> String {
    (0..UUID_LEN)
        .map(|_| UUID_ALPHABET[rng.gen_range(0..UUID_ALPHABET.len())] as char)
        .collect()
}

fn ensure_uuid(
    config: &mut EffectiveConfig,
    dictpopname: &str,
    override_path: &Path,
) -> Result<(), ConfigError> {
    if config.value("main", "uuid").is_truthy() {
        return Ok(());
    }

    let uuid = ConfigValue::Str(generate_uuid(&mut rand::thread_rng()));
    tracing::info!(uuid = %uuid, "Generated device identifier");
    apply_update(config, dictpopname, "main", "uuid", uuid.clone());
    persist(override_path, "main", "uuid", &uuid)
}

fn resolve_cache_dir(config: &EffectiveConfig, paths: &mut InternalPaths) -> Result<(), ConfigError> {
    let configured = config.value("main", "cache_dir");
    if configured.is_truthy() {
        let dir = PathBuf::from(configured.to_string());
        if !dir.is_dir() {
            return Err(ConfigError::InvalidCacheDir(dir));
        }
        paths.cache_dir = dir;
    }

    let logs_dir = paths.cache_dir.join("logs");
    if !logs_dir.is_dir() {
        fs::create_dir_all(&logs_dir).map_err(|source| ConfigError::Io {
            path: logs_dir.clone(),
            source,
        })?;
    }
    paths.logs_dir = logs_dir;
    Ok(())
}

fn check_stream_type(config: &EffectiveConfig) -> Result<StreamType, ConfigError> {
    config.stream_type().ok_or_else(|| {
        ConfigError::InvalidStreamType(config.value("fhdhr", "stream_type").to_string())
    })
}

fn derive_discovery_address(config: &mut EffectiveConfig) {
    let address = config.value("fhdhr", "address");
    let mut discovery = config.value("fhdhr", "discovery_address");

    if !discovery.is_truthy() && address.as_str() != Some(WILDCARD_ADDRESS) {
        discovery = address;
    }
    if !discovery.is_truthy() || discovery.as_str() == Some(WILDCARD_ADDRESS) {
        discovery = ConfigValue::None;
    }

    config.set("fhdhr", "discovery_address", discovery);
}

/// Validate the merged tree and fill in derived values.
///
/// Returns the original `main.dictpopname` section name.
pub fn validate_config(
    config: &mut EffectiveConfig,
    paths: &mut InternalPaths,
    override_path: &Path,
) -> Result<String, ConfigError> {
    let thread_method = check_thread_method(config)?;
    check_required(config)?;

    let dictpopname = pop_origin(config)?;
    resolve_epg_methods(config, &dictpopname)?;

    ensure_uuid(config, &dictpopname, override_path)?;

    resolve_cache_dir(config, paths)?;
    config.set(
        "database",
        "path",
        ConfigValue::Str(paths.cache_dir.join(DATABASE_FILE).display().to_string()),
    );

    let stream_type = check_stream_type(config)?;
    derive_discovery_address(config);

    tracing::debug!(
        thread_method = ?thread_method,
        stream_type = %stream_type,
        origin = %dictpopname,
        cache_dir = %paths.cache_dir.display(),
        "Configuration validated"
    );

    Ok(dictpopname)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::read_override_file;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        dir: tempfile::TempDir,
        config: EffectiveConfig,
        paths: InternalPaths,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let paths = InternalPaths::new(dir.path());

            let mut config = EffectiveConfig::new();
            config.set("main", "thread_method", "threading".into());
            config.set("main", "required", ConfigValue::None);
            config.set("main", "dictpopname", "nextpvr".into());
            config.set(
                "main",
                "valid_epg_methods",
                ConfigValue::List(vec!["None".into(), "blocks".into(), "origin".into()]),
            );
            config.set("main", "uuid", "abcdefgh".into());
            config.set("main", "cache_dir", ConfigValue::None);
            config.set("epg", "method", "blocks".into());
            config.set("fhdhr", "stream_type", "direct".into());
            config.set("fhdhr", "address", "0.0.0.0".into());
            config.set("fhdhr", "discovery_address", ConfigValue::None);
            config.set("nextpvr", "address", "10.0.0.1".into());

            Self { dir, config, paths }
        }

        fn override_path(&self) -> PathBuf {
            self.dir.path().join("config.ini")
        }

        fn validate(&mut self) -> Result<String, ConfigError> {
            let override_path = self.override_path();
            validate_config(&mut self.config, &mut self.paths, &override_path)
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let mut fx = Fixture::new();
        assert_eq!(fx.validate().unwrap(), "nextpvr");
        assert_eq!(fx.config.epg_def_method(), Some("blocks"));
        assert!(!fx.override_path().exists());
    }

    #[test]
    fn test_invalid_thread_method() {
        let mut fx = Fixture::new();
        fx.config.set("main", "thread_method", "greenlets".into());
        assert!(matches!(fx.validate(), Err(ConfigError::InvalidThreadMethod(m)) if m == "greenlets"));
    }

    #[test]
    fn test_required_options_are_aggregated() {
        let mut fx = Fixture::new();
        fx.config.set(
            "main",
            "required",
            ConfigValue::List(vec![
                "nextpvr/address".into(),
                "nextpvr/pin".into(),
                "fhdhr/discovery_address".into(),
                "malformed".into(),
            ]),
        );

        match fx.validate() {
            Err(ConfigError::MissingRequired(missing)) => assert_eq!(
                missing,
                vec!["nextpvr/pin", "fhdhr/discovery_address", "malformed"]
            ),
            other => panic!("expected MissingRequired, got {:?}", other),
        }
    }

    #[test]
    fn test_single_required_string_is_a_list() {
        let mut fx = Fixture::new();
        fx.config.set("main", "required", "nextpvr/address".into());
        fx.validate().unwrap();
        assert_eq!(
            fx.config.get("main", "required"),
            Some(&ConfigValue::List(vec!["nextpvr/address".into()]))
        );
    }

    #[test]
    fn test_pop_section_becomes_origin() {
        let mut fx = Fixture::new();
        fx.validate().unwrap();
        assert!(!fx.config.has_section("nextpvr"));
        assert_eq!(fx.config.get_str("origin", "address"), Some("10.0.0.1"));
    }

    #[test]
    fn test_missing_pop_section_is_fatal() {
        let mut fx = Fixture::new();
        fx.config.remove_section("nextpvr");
        assert!(matches!(fx.validate(), Err(ConfigError::MissingPopSection(_))));
    }

    #[test]
    fn test_epg_methods_are_remapped() {
        let mut fx = Fixture::new();
        fx.config.set(
            "epg",
            "method",
            ConfigValue::List(vec!["nextpvr".into(), "blocks".into()]),
        );
        fx.validate().unwrap();

        assert_eq!(
            fx.config.epg_methods(),
            vec!["origin".to_string(), "blocks".to_string()]
        );
        assert_eq!(fx.config.epg_def_method(), Some("origin"));
    }

    #[test]
    fn test_invalid_epg_methods() {
        let mut fx = Fixture::new();
        fx.config.set("epg", "method", ConfigValue::List(vec!["blocks".into(), "None".into()]));
        assert!(matches!(fx.validate(), Err(ConfigError::InvalidEpgMethod(m)) if m == "None"));

        let mut fx = Fixture::new();
        fx.config.set("epg", "method", "zap2it".into());
        assert!(matches!(fx.validate(), Err(ConfigError::InvalidEpgMethod(m)) if m == "zap2it"));
    }

    #[test]
    fn test_empty_epg_method_list_fails() {
        let mut fx = Fixture::new();
        fx.config.set("epg", "method", ConfigValue::List(Vec::new()));
        assert!(matches!(fx.validate(), Err(ConfigError::EmptyEpgMethod)));
    }

    #[test]
    fn test_non_string_epg_method_is_rejected() {
        let mut config = EffectiveConfig::new();
        config.set("epg", "method", ConfigValue::Int(1));
        config.set("main", "valid_epg_methods", ConfigValue::None);
        assert!(matches!(
            resolve_epg_methods(&mut config, "nextpvr"),
            Err(ConfigError::InvalidEpgMethod(m)) if m == "1"
        ));
        assert_eq!(config.valid_epg_methods(), Vec::<String>::new());
    }

    #[test]
    fn test_disabled_epg_method() {
        let mut fx = Fixture::new();
        fx.config.set("epg", "method", "None".into());
        fx.validate().unwrap();
        assert_eq!(fx.config.epg_methods(), Vec::<String>::new());
        assert_eq!(fx.config.epg_def_method(), None);
    }

    #[test]
    fn test_uuid_is_generated_and_persisted() {
        let mut fx = Fixture::new();
        fx.config.set("main", "uuid", ConfigValue::None);
        fx.validate().unwrap();

        let uuid = fx.config.uuid().unwrap().to_string();
        assert_eq!(uuid.len(), 8);
        assert!(uuid.chars().all(|c| ('h'..='z').contains(&c)));

        let doc = read_override_file(&fx.override_path()).unwrap();
        assert_eq!(doc.get("main", "uuid"), Some(uuid.as_str()));
    }

    #[test]
    fn test_generated_uuid_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let uuid = generate_uuid(&mut rng);
            assert_eq!(uuid.len(), UUID_LEN);
            assert!(uuid.bytes().all(|b| UUID_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_cache_dir_resolution() {
        let mut fx = Fixture::new();
        fx.validate().unwrap();
        assert!(fx.dir.path().join("data/cache/logs").is_dir());
        assert_eq!(
            fx.config.database_path(),
            Some(fx.dir.path().join("data/cache/fhdhr.db"))
        );

        let cache = tempfile::tempdir().unwrap();
        let mut fx = Fixture::new();
        fx.config.set("main", "cache_dir", cache.path().display().to_string().into());
        fx.validate().unwrap();
        assert_eq!(fx.paths.cache_dir, cache.path());
        assert_eq!(fx.paths.logs_dir, cache.path().join("logs"));
        assert!(cache.path().join("logs").is_dir());
        assert!(!cache.path().join("fhdhr.db").exists());
    }

    #[test]
    fn test_missing_cache_dir_is_fatal() {
        let mut fx = Fixture::new();
        let missing = fx.dir.path().join("nowhere");
        fx.config.set("main", "cache_dir", missing.display().to_string().into());
        assert!(matches!(fx.validate(), Err(ConfigError::InvalidCacheDir(p)) if p == missing));
    }

    #[test]
    fn test_invalid_stream_type() {
        let mut fx = Fixture::new();
        fx.config.set("fhdhr", "stream_type", "mpv".into());
        assert!(matches!(fx.validate(), Err(ConfigError::InvalidStreamType(s)) if s == "mpv"));
    }

    #[test]
    fn test_discovery_address_derivation() {
        let mut fx = Fixture::new();
        fx.validate().unwrap();
        assert_eq!(fx.config.get("fhdhr", "discovery_address"), Some(&ConfigValue::None));

        let mut fx = Fixture::new();
        fx.config.set("fhdhr", "address", "192.168.1.2".into());
        fx.validate().unwrap();
        assert_eq!(fx.config.discovery_address(), Some("192.168.1.2"));

        let mut fx = Fixture::new();
        fx.config.set("fhdhr", "address", "192.168.1.2".into());
        fx.config.set("fhdhr", "discovery_address", "0.0.0.0".into());
        fx.validate().unwrap();
        assert_eq!(fx.config.get("fhdhr", "discovery_address"), Some(&ConfigValue::None));
    }
}

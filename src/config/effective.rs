//! The resolved configuration tree.
//!
//! Section and key names are stored lower-cased. Typed accessors cover the
//! options the service reads directly, so a misspelled name is a compile
//! error rather than a silent `None`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::config::value::ConfigValue;

/// Options of one section.
pub type Section = BTreeMap<String, ConfigValue>;

/// Section name the `main.dictpopname` section is moved to.
pub const ORIGIN_SECTION: &str = "origin";

/// Address meaning "every interface".
pub const WILDCARD_ADDRESS: &str = "0.0.0.0";

/// How the service runs its background workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadMethod {
    Threading,
    Multiprocessing,
}

impl FromStr for ThreadMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "threading" => Ok(ThreadMethod::Threading),
            "multiprocessing" => Ok(ThreadMethod::Multiprocessing),
            other => Err(other.to_string()),
        }
    }
}

/// How tuner streams are delivered to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Direct,
    Ffmpeg,
    Vlc,
}

impl FromStr for StreamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(StreamType::Direct),
            "ffmpeg" => Ok(StreamType::Ffmpeg),
            "vlc" => Ok(StreamType::Vlc),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamType::Direct => write!(f, "direct"),
            StreamType::Ffmpeg => write!(f, "ffmpeg"),
            StreamType::Vlc => write!(f, "vlc"),
        }
    }
}

/// Section name → key name → typed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EffectiveConfig {
    sections: BTreeMap<String, Section>,
}

impl EffectiveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&ConfigValue> {
        self.sections
            .get(&section.to_lowercase())
            .and_then(|s| s.get(&key.to_lowercase()))
    }

    /// Value of an option, `ConfigValue::None` when absent.
    pub fn value(&self, section: &str, key: &str) -> ConfigValue {
        self.get(section, key).cloned().unwrap_or(ConfigValue::None)
    }

    pub fn get_str(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).and_then(ConfigValue::as_str)
    }

    pub fn set(&mut self, section: &str, key: &str, value: ConfigValue) {
        self.section_entry(section)
            .insert(key.to_lowercase(), value);
    }

    /// The named section, created empty if missing.
    pub fn section_entry(&mut self, section: &str) -> &mut Section {
        self.sections.entry(section.to_lowercase()).or_default()
    }

    pub fn section(&self, section: &str) -> Option<&Section> {
        self.sections.get(&section.to_lowercase())
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(&section.to_lowercase())
    }

    pub fn remove_section(&mut self, section: &str) -> Option<Section> {
        self.sections.remove(&section.to_lowercase())
    }

    pub fn insert_section(&mut self, section: &str, contents: Section) {
        self.sections.insert(section.to_lowercase(), contents);
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn thread_method(&self) -> Option<ThreadMethod> {
        self.get_str("main", "thread_method")?.parse().ok()
    }

    pub fn stream_type(&self) -> Option<StreamType> {
        self.get_str("fhdhr", "stream_type")?.parse().ok()
    }

    pub fn uuid(&self) -> Option<&str> {
        self.get_str("main", "uuid")
    }

    pub fn dictpopname(&self) -> Option<&str> {
        self.get_str("main", "dictpopname")
    }

    pub fn valid_epg_methods(&self) -> Vec<String> {
        self.value("main", "valid_epg_methods").to_list()
    }

    pub fn epg_methods(&self) -> Vec<String> {
        self.value("epg", "method").to_list()
    }

    pub fn epg_def_method(&self) -> Option<&str> {
        self.get_str("epg", "def_method")
    }

    pub fn discovery_address(&self) -> Option<&str> {
        self.get_str("fhdhr", "discovery_address")
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.get_str("database", "path").map(PathBuf::from)
    }

    /// `logging.level` as a tracing level name. Accepts the classic
    /// `WARNING`/`CRITICAL`/`NOTSET` spellings.
    pub fn log_level(&self) -> String {
        let level = self.get_str("logging", "level").unwrap_or("info").to_lowercase();
        match level.as_str() {
            "warning" => "warn".to_string(),
            "critical" | "fatal" => "error".to_string(),
            "notset" => "trace".to_string(),
            _ => level,
        }
    }

    /// `fhdhr.address:fhdhr.port` for the HTTP listener.
    pub fn bind_address(&self) -> String {
        let address = self.get_str("fhdhr", "address").unwrap_or(WILDCARD_ADDRESS);
        let port = self.get("fhdhr", "port").and_then(ConfigValue::as_int).unwrap_or(5004);
        format!("{}:{}", address, port)
    }
}

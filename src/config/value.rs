//! Typed configuration values and text coercion.
//!
//! # Responsibilities
//! - Model every option value as an explicit tagged union
//! - Coerce raw baseline text (`coerce_default`) and raw override text
//!   (`coerce_override`) into typed values
//! - Coerce permission flags (`coerce_flag`)
//! - Render values back to override-file text
//!
//! # Design Decisions
//! - Coercion never fails: unmatched input stays a string
//! - The two coercion orders differ on purpose and are kept separate
//! - Arithmetic goes through the restricted evaluator in `arith`

use std::fmt;

use serde::Serialize;

use crate::config::arith::{self, Number};

/// A single resolved option value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl ConfigValue {
    /// Truthiness as used by required-option checks and derivations.
    pub fn is_truthy(&self) -> bool {
        match self {
            ConfigValue::None => false,
            ConfigValue::Bool(b) => *b,
            ConfigValue::Int(i) => *i != 0,
            ConfigValue::Float(f) => *f != 0.0,
            ConfigValue::Str(s) => !s.is_empty(),
            ConfigValue::List(items) => !items.is_empty(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ConfigValue::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Normalize to a sequence: a list as-is, `None` as empty, any other
    /// value as a single element.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            ConfigValue::List(items) => items.clone(),
            ConfigValue::None => Vec::new(),
            other => vec![other.to_string()],
        }
    }

    /// Text written to the override file. Reads back to the same value for
    /// every scalar and every list of two or more items.
    pub fn to_ini_string(&self) -> String {
        match self {
            ConfigValue::None => String::new(),
            ConfigValue::Bool(true) => "True".to_string(),
            ConfigValue::Bool(false) => "False".to_string(),
            ConfigValue::Int(i) => i.to_string(),
            ConfigValue::Float(f) => format!("{:?}", f),
            ConfigValue::Str(s) => s.clone(),
            ConfigValue::List(items) => items.join(","),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::None => write!(f, "None"),
            ConfigValue::List(items) => write!(f, "{}", items.join(",")),
            other => write!(f, "{}", other.to_ini_string()),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<Number> for ConfigValue {
    fn from(value: Number) -> Self {
        match value {
            Number::Int(i) => ConfigValue::Int(i),
            Number::Float(f) => ConfigValue::Float(f),
        }
    }
}

fn parse_int(raw: &str) -> Option<ConfigValue> {
    raw.trim().parse::<i64>().ok().map(ConfigValue::Int)
}

fn parse_float(raw: &str) -> Option<ConfigValue> {
    raw.trim().parse::<f64>().ok().map(ConfigValue::Float)
}

fn parse_arithmetic(raw: &str) -> Option<ConfigValue> {
    if raw.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    arith::evaluate(raw.trim()).ok().map(ConfigValue::from)
}

fn split_list(raw: &str) -> Option<ConfigValue> {
    if raw.contains(',') {
        Some(ConfigValue::List(raw.split(',').map(str::to_string).collect()))
    } else {
        None
    }
}

fn parse_keyword(raw: &str) -> Option<ConfigValue> {
    match raw.to_lowercase().as_str() {
        "" | "none" => Some(ConfigValue::None),
        "false" => Some(ConfigValue::Bool(false)),
        "true" => Some(ConfigValue::Bool(true)),
        _ => None,
    }
}

/// Coerce a baseline default: int, float, arithmetic, comma list,
/// none/empty, false, true, then the unchanged string.
pub fn coerce_default(raw: &str) -> ConfigValue {
    parse_int(raw)
        .or_else(|| parse_float(raw))
        .or_else(|| parse_arithmetic(raw))
        .or_else(|| split_list(raw))
        .or_else(|| parse_keyword(raw))
        .unwrap_or_else(|| ConfigValue::Str(raw.to_string()))
}

/// Coerce an override value: empty/none, false, true, int, float,
/// arithmetic, comma list, then the unchanged string.
pub fn coerce_override(raw: &str) -> ConfigValue {
    parse_keyword(raw)
        .or_else(|| parse_int(raw))
        .or_else(|| parse_float(raw))
        .or_else(|| parse_arithmetic(raw))
        .or_else(|| split_list(raw))
        .unwrap_or_else(|| ConfigValue::Str(raw.to_string()))
}

/// Coerce a permission flag from a baseline file.
///
/// `None` means the flag was explicitly set to none/null.
pub fn coerce_flag(raw: &serde_json::Value) -> Option<bool> {
    match raw {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::String(s) => match s.to_lowercase().as_str() {
            "none" => None,
            "false" => Some(false),
            "true" => Some(true),
            other => Some(!other.is_empty()),
        },
        serde_json::Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        serde_json::Value::Array(items) => Some(!items.is_empty()),
        serde_json::Value::Object(map) => Some(!map.is_empty()),
    }
}

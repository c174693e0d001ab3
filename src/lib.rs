//! fHDHR configuration engine and device API.

pub mod config;
pub mod epg;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::{Config, ConfigError, ConfigValue, EffectiveConfig};
pub use http::HttpServer;
pub use lifecycle::{boot, Boot};

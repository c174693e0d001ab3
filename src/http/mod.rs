//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! Client Request
//!     → server.rs (router, trace layer)
//!     → epg.rs      /api/epg       guide JSON, update, clear cache
//!     → settings.rs /api/settings  web-exposed options, updates via Config::write
//!     → server.rs   /api/versions  environment probe results
//! ```

pub mod epg;
pub mod server;
pub mod settings;

pub use server::{AppState, HttpServer};

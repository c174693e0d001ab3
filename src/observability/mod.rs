//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!
//! Consumers:
//!     → console (fmt layer)
//!     → <cache_dir>/logs/fHDHR.log
//! ```

pub mod logging;

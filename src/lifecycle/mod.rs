//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load baseline → Merge overrides → Validate → Probe versions
//!
//! Shutdown:
//!     Ctrl+C → Stop accepting → Exit
//! ```

pub mod startup;
pub mod versions;

pub use startup::{boot, Boot};
pub use versions::Versions;

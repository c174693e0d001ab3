//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! data/internal_config/*.json
//!     → schema.rs (baseline defaults + permission flags)
//! override file (INI)
//!     → ini.rs (parse)
//!     → loader.rs (coerce, merge where file edits are allowed)
//!     → validation.rs (checks, derived values, origin rename)
//!     → Config (shared via Arc to all subsystems)
//!
//! On administrative update:
//!     Config::write
//!     → writer.rs updates the tree and rewrites the override file
//!     → readers observe the new snapshot
//! ```
//!
//! # Design Decisions
//! - Values are an explicit tagged union, coerced once at load time
//! - Arithmetic values use a restricted evaluator, never code execution
//! - Writes are serialized; readers never block

pub mod arith;
pub mod effective;
pub mod ini;
pub mod loader;
pub mod paths;
pub mod schema;
pub mod store;
pub mod validation;
pub mod value;
pub mod writer;

pub use effective::{EffectiveConfig, StreamType, ThreadMethod};
pub use loader::{load_config, ConfigError};
pub use paths::InternalPaths;
pub use schema::{Schema, SchemaEntry};
pub use store::Config;
pub use value::ConfigValue;

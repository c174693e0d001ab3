//! Process-wide configuration handle.
//!
//! Built once at boot and shared via `Arc<Config>`. Readers take snapshots
//! of the tree; `write` is the only mutator and is serialized internally.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::config::effective::EffectiveConfig;
use crate::config::paths::InternalPaths;
use crate::config::schema::Schema;

pub struct Config {
    dict: ArcSwap<EffectiveConfig>,
    schema: Schema,
    paths: InternalPaths,
    override_path: PathBuf,
    dictpopname: String,
    pub(crate) write_lock: Mutex<()>,
}

impl Config {
    pub fn new(
        dict: EffectiveConfig,
        schema: Schema,
        paths: InternalPaths,
        override_path: PathBuf,
        dictpopname: String,
    ) -> Self {
        Self {
            dict: ArcSwap::from_pointee(dict),
            schema,
            paths,
            override_path,
            dictpopname,
            write_lock: Mutex::new(()),
        }
    }

    /// Current tree. Later writes do not affect a snapshot already taken.
    pub fn snapshot(&self) -> Arc<EffectiveConfig> {
        self.dict.load_full()
    }

    pub(crate) fn replace(&self, dict: EffectiveConfig) {
        self.dict.store(Arc::new(dict));
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn paths(&self) -> &InternalPaths {
        &self.paths
    }

    pub fn override_path(&self) -> &Path {
        &self.override_path
    }

    /// Original name of the section now stored as `origin`.
    pub fn dictpopname(&self) -> &str {
        &self.dictpopname
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("override_path", &self.override_path)
            .field("dictpopname", &self.dictpopname)
            .field("options", &self.schema.len())
            .finish()
    }
}

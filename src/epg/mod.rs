//! Electronic program guide sources.
//!
//! The HTTP layer only sees the `EpgProvider` trait. `EpgCache` keeps one
//! guide per source in memory, refreshed from
//! `<cache_dir>/epg/<source>.json`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

/// Guide operations used by the EPG route.
pub trait EpgProvider: Send + Sync {
    /// Current guide for a source; an empty object when none is cached.
    fn get_epg(&self, source: &str) -> Value;

    /// Refresh a source's guide.
    fn update(&self, source: &str) -> io::Result<()>;

    /// Drop a source's cached guide.
    fn clear_cache(&self, source: &str) -> io::Result<()>;
}

/// File-backed per-source guide cache.
#[derive(Clone)]
pub struct EpgCache {
    dir: PathBuf,
    guides: Arc<DashMap<String, Value>>,
}

impl EpgCache {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            dir: cache_dir.join("epg"),
            guides: Arc::new(DashMap::new()),
        }
    }

    fn guide_path(&self, source: &str) -> PathBuf {
        self.dir.join(format!("{}.json", source))
    }

    /// Number of sources with a cached guide.
    pub fn len(&self) -> usize {
        self.guides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guides.is_empty()
    }
}

impl EpgProvider for EpgCache {
    fn get_epg(&self, source: &str) -> Value {
        self.guides
            .get(source)
            .map(|guide| guide.value().clone())
            .unwrap_or_else(|| Value::Object(Default::default()))
    }

    fn update(&self, source: &str) -> io::Result<()> {
        let path = self.guide_path(source);
        let guide = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Value::Object(Default::default()),
            Err(e) => return Err(e),
        };

        self.guides.insert(source.to_string(), guide);
        tracing::info!(source = %source, path = %path.display(), "EPG updated");
        Ok(())
    }

    fn clear_cache(&self, source: &str) -> io::Result<()> {
        self.guides.remove(source);

        let path = self.guide_path(source);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        tracing::info!(source = %source, "EPG cache cleared");
        Ok(())
    }
}

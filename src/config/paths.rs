//! Internal path table established at bootstrap.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Filesystem locations derived from the install directory. `cache_dir` and
/// `logs_dir` are finalized by validation.
#[derive(Debug, Clone, Serialize)]
pub struct InternalPaths {
    pub script_dir: PathBuf,
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub internal_config: PathBuf,
    pub www_dir: PathBuf,
    pub www_templates_dir: PathBuf,
    pub font: PathBuf,
    pub logs_dir: PathBuf,
}

impl InternalPaths {
    pub fn new(script_dir: &Path) -> Self {
        let data_dir = script_dir.join("data");
        let www_dir = data_dir.join("www");
        let cache_dir = data_dir.join("cache");

        Self {
            script_dir: script_dir.to_path_buf(),
            internal_config: data_dir.join("internal_config"),
            www_templates_dir: www_dir.join("templates"),
            font: data_dir.join("garamond.ttf"),
            logs_dir: cache_dir.join("logs"),
            cache_dir,
            www_dir,
            data_dir,
        }
    }
}

//! Shared fixtures for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A scratch install directory seeded with the shipped baseline.
pub struct Install {
    pub dir: TempDir,
}

impl Install {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/internal_config");
        let target = dir.path().join("data/internal_config");
        fs::create_dir_all(&target).unwrap();

        for entry in fs::read_dir(shipped).unwrap() {
            let entry = entry.unwrap();
            fs::copy(entry.path(), target.join(entry.file_name())).unwrap();
        }

        Self { dir }
    }

    pub fn script_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn override_path(&self) -> PathBuf {
        self.dir.path().join("config.ini")
    }

    /// Write the user override file.
    pub fn write_overrides(&self, text: &str) {
        fs::write(self.override_path(), text).unwrap();
    }

    /// Add an extra baseline definition file.
    #[allow(dead_code)]
    pub fn write_definitions(&self, name: &str, json: &str) {
        fs::write(self.dir.path().join("data/internal_config").join(name), json).unwrap();
    }
}

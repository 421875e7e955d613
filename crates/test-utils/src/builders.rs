#![allow(dead_code)]

use std::path::{Path, PathBuf};

use scriptmon::catalog::{CatalogStore, NewScript, ScriptRecord};
use tempfile::TempDir;

/// A catalog in a fresh temp directory. The directory lives as long as the
/// fixture.
pub struct CatalogFixture {
    dir: TempDir,
    pub store: CatalogStore,
}

impl CatalogFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("creating temp dir");
        let store = CatalogStore::open(dir.path().join("scripts.db")).expect("opening catalog");
        Self { dir, store }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Register a script and return the stored record.
    pub fn add(&self, title: &str, path: impl AsRef<Path>) -> ScriptRecord {
        let id = self
            .store
            .insert(&NewScript::now(title, format!("{title} description"), path))
            .expect("inserting script");
        self.store
            .get_by_id(id)
            .expect("reading script back")
            .expect("script just inserted")
    }

    /// Write `body` to `<tempdir>/<name>` and register it.
    pub fn add_file(&self, title: &str, name: &str, body: &str) -> ScriptRecord {
        let path = self.script_path(name);
        std::fs::write(&path, body).expect("writing script file");
        self.add(title, path)
    }

    pub fn script_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Default for CatalogFixture {
    fn default() -> Self {
        Self::new()
    }
}

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::FileSystem;
use crate::errors::StoreError;

/// Map-backed file system for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    root: PathBuf,
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
}

impl InMemoryFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: RwLock::new(BTreeMap::new()),
        }
    }

    /// Seed a file, creating or replacing it.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.write().insert(path.into(), contents.into());
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.read().keys().cloned().collect()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn working_directory(&self) -> &Path {
        &self.root
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        self.files.write().insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }

    fn remove(&self, path: &Path) -> Result<(), StoreError> {
        self.files
            .write()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }
}

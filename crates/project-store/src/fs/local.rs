use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{DirectoryKind, FileSystem};
use crate::errors::StoreError;

/// File system rooted at a working directory on local disk.
#[derive(Clone, Debug)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the working directory and its named subdirectories.
    pub fn initialize(&self) -> Result<(), StoreError> {
        for kind in DirectoryKind::all() {
            let dir = self.directory(kind);
            fs::create_dir_all(&dir).map_err(|err| StoreError::io(&dir, err))?;
        }
        debug!(root = %self.root.display(), "initialized working directory");
        Ok(())
    }
}

impl FileSystem for LocalFileSystem {
    fn working_directory(&self) -> &Path {
        &self.root
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        fs::read(path).map_err(|err| StoreError::io(path, err))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        write_atomic(path, data).map_err(|err| StoreError::io(path, err))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove(&self, path: &Path) -> Result<(), StoreError> {
        fs::remove_file(path).map_err(|err| StoreError::io(path, err))
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::new(dir.path());
        fs.initialize().unwrap();
        assert!(fs.directory(DirectoryKind::Scripts).is_dir());

        let path = fs.resolve(DirectoryKind::Temp, Path::new("nested/out.txt"));
        fs.write(&path, b"hello").unwrap();
        assert!(fs.exists(&path));
        assert_eq!(fs.read_to_string(&path).unwrap(), "hello");

        fs.remove(&path).unwrap();
        assert!(matches!(fs.read(&path), Err(StoreError::NotFound(_))));
    }
}

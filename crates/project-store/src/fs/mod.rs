pub mod layout;
mod local;
mod memory;

use std::path::{Path, PathBuf};

pub use local::LocalFileSystem;
pub use memory::InMemoryFileSystem;

use crate::errors::StoreError;

/// Named subdirectories of a project working directory.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DirectoryKind {
    Scripts,
    DataModel,
    References,
    Temp,
}

impl DirectoryKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            DirectoryKind::Scripts => "scripts",
            DirectoryKind::DataModel => "data-model",
            DirectoryKind::References => "references",
            DirectoryKind::Temp => "temp",
        }
    }

    pub fn all() -> [DirectoryKind; 4] {
        [
            DirectoryKind::Scripts,
            DirectoryKind::DataModel,
            DirectoryKind::References,
            DirectoryKind::Temp,
        ]
    }
}

/// File access used by the runtime.
///
/// Relative paths are always resolved against a named directory of the
/// working directory; absolute paths pass through unchanged.
pub trait FileSystem: Send + Sync {
    fn working_directory(&self) -> &Path;

    fn read(&self, path: &Path) -> Result<Vec<u8>, StoreError>;

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), StoreError>;

    fn exists(&self, path: &Path) -> bool;

    fn remove(&self, path: &Path) -> Result<(), StoreError>;

    fn directory(&self, kind: DirectoryKind) -> PathBuf {
        self.working_directory().join(kind.dir_name())
    }

    fn resolve(&self, kind: DirectoryKind, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.directory(kind).join(relative)
        }
    }

    fn read_to_string(&self, path: &Path) -> Result<String, StoreError> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|err| StoreError::Io {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_keeps_absolute_paths() {
        let fs = InMemoryFileSystem::new("/work");
        let absolute = PathBuf::from("/elsewhere/a.rhai");
        assert_eq!(fs.resolve(DirectoryKind::Scripts, &absolute), absolute);
        assert_eq!(
            fs.resolve(DirectoryKind::Scripts, Path::new("a.rhai")),
            PathBuf::from("/work/scripts/a.rhai")
        );
    }
}

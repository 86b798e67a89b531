use std::io;
use std::path::{Path, PathBuf};

use autoflow_core_types::ErrorClass;
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum StoreError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("io failure on {}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },
    #[error("serialization failed for {}: {reason}", .path.display())]
    Serialization { path: PathBuf, reason: String },
    #[error("unsupported document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

impl StoreError {
    pub(crate) fn io(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            return StoreError::NotFound(path.to_path_buf());
        }
        StoreError::Io {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn serialization(path: &Path, reason: impl ToString) -> Self {
        StoreError::Serialization {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::NotFound(_) | StoreError::Io { .. } => ErrorClass::Io,
            StoreError::Serialization { .. } | StoreError::UnsupportedFormat(_) => {
                ErrorClass::Configuration
            }
        }
    }
}

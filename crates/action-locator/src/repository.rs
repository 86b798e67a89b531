//! Control descriptions on disk

use std::path::{Path, PathBuf};
use std::sync::Arc;

use autoflow_project_store::{
    control_description_path, serializer_for, DirectoryKind, FileSystem, JsonSerializer,
    SerializerExt,
};
use tracing::debug;

use crate::errors::LocatorError;
use crate::types::ControlDescription;

/// Loads and stores [`ControlDescription`]s under the references directory.
#[derive(Clone)]
pub struct ControlRepository {
    fs: Arc<dyn FileSystem>,
}

impl ControlRepository {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    pub fn resolve(&self, control_file: &str) -> PathBuf {
        self.fs
            .resolve(DirectoryKind::References, Path::new(control_file))
    }

    /// Load a description and propagate its application id down the chain.
    pub fn load(&self, control_file: &str) -> Result<ControlDescription, LocatorError> {
        if control_file.trim().is_empty() {
            return Err(LocatorError::InvalidConfiguration(
                "control file is not set".into(),
            ));
        }
        let path = self.resolve(control_file);
        let serializer = serializer_for(&path, Arc::clone(&self.fs))?;
        let mut description: ControlDescription = serializer.deserialize(&path)?;
        description.control_details.propagate_application_id();
        debug!(
            path = %path.display(),
            control_id = %description.control_id,
            chain = description.control_details.chain_len(),
            "loaded control description"
        );
        Ok(description)
    }

    /// Store under `references/<application>/controls/<id>/` and return the
    /// path relative to the references directory.
    pub fn save(&self, description: &ControlDescription) -> Result<String, LocatorError> {
        let path = control_description_path(
            self.fs.as_ref(),
            description.application_id(),
            &description.control_id,
        );
        JsonSerializer::new(Arc::clone(&self.fs)).serialize(&path, description)?;
        let references = self.fs.directory(DirectoryKind::References);
        let relative = path
            .strip_prefix(&references)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        Ok(relative)
    }
}

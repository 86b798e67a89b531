//! Process documents, data models and control snapshots loaded from disk

use std::path::{Path, PathBuf};
use std::sync::Arc;

use action_flow::{ComponentDocument, EntityManager};
use action_locator::SnapshotControlProvider;
use anyhow::{Context, Result};
use autoflow_project_store::{serializer_for, FileSystem, LocalFileSystem, SerializerExt};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::Config;

/// Files named on the command line. Relative paths resolve against the
/// current directory.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceOptions {
    pub process: PathBuf,
    pub data: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

/// A loaded process ready to validate, inspect or run.
pub struct Workspace {
    pub manager: Arc<EntityManager>,
    pub working_dir: PathBuf,
    pub process: PathBuf,
}

impl Workspace {
    pub fn load(options: &WorkspaceOptions, config: &Config) -> Result<Self> {
        let working_dir = options
            .working_dir
            .clone()
            .unwrap_or_else(|| config.working_dir.clone());
        let fs: Arc<dyn FileSystem> = Arc::new(LocalFileSystem::new(&working_dir));

        let document: ComponentDocument = read_document(&options.process, &fs)
            .with_context(|| format!("Failed to load process {}", options.process.display()))?;
        let data_model = match &options.data {
            Some(path) => read_document::<Value>(path, &fs)
                .with_context(|| format!("Failed to load data model {}", path.display()))?,
            None => json!({}),
        };

        let mut builder = EntityManager::builder(Arc::clone(&fs))
            .data_model(data_model)
            .root(document);

        let snapshot = options
            .snapshot
            .clone()
            .or_else(|| config.controls.snapshot.as_deref().map(|path| config.resolve(path)));
        if let Some(path) = snapshot {
            let provider: SnapshotControlProvider = read_document(&path, &fs)
                .with_context(|| format!("Failed to load control snapshot {}", path.display()))?;
            debug!(
                path = %path.display(),
                applications = provider.applications.len(),
                "loaded control snapshot"
            );
            builder = builder.control_provider(Arc::new(provider));
        }

        let manager = builder.build().context("Failed to build process tree")?;
        info!(
            process = %options.process.display(),
            components = manager.read(|tree| tree.len()),
            working_dir = %working_dir.display(),
            "process loaded"
        );
        Ok(Self {
            manager: Arc::new(manager),
            working_dir,
            process: options.process.clone(),
        })
    }
}

fn read_document<T: DeserializeOwned>(path: &Path, fs: &Arc<dyn FileSystem>) -> Result<T> {
    let serializer = serializer_for(path, Arc::clone(fs))?;
    Ok(serializer.deserialize(path)?)
}

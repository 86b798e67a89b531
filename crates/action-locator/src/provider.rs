//! Platform backends that enumerate controls

use std::collections::BTreeMap;

use async_trait::async_trait;
use autoflow_core_types::ControlHandle;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::LocatorError;
use crate::types::{ControlIdentity, ControlSearchScope};

/// Enumerates candidate controls for one identity node.
#[async_trait]
pub trait ControlProvider: Send + Sync {
    /// Controls matching `identity` below `root`. A missing root means the
    /// root window of `identity.application_id`.
    async fn find_all(
        &self,
        identity: &ControlIdentity,
        root: Option<&ControlHandle>,
    ) -> Result<Vec<ControlHandle>, LocatorError>;
}

/// Recorded control hierarchy node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    #[serde(flatten)]
    pub handle: ControlHandle,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    pub fn new(handle: ControlHandle) -> Self {
        Self {
            handle,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: SnapshotNode) -> Self {
        self.children.push(child);
        self
    }

    fn find(&self, handle_id: &str) -> Option<&SnapshotNode> {
        if self.handle.handle_id == handle_id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(handle_id))
    }

    fn collect_matches(
        &self,
        identity: &ControlIdentity,
        scope: ControlSearchScope,
        out: &mut Vec<ControlHandle>,
    ) {
        for child in &self.children {
            if identity.matches(&child.handle) {
                out.push(child.handle.clone());
            }
            if scope == ControlSearchScope::Descendants {
                child.collect_matches(identity, scope, out);
            }
        }
    }
}

/// Control provider over a recorded snapshot of application windows.
///
/// Used for dry runs and tests where no live desktop backend is attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotControlProvider {
    /// Root window per application id
    #[serde(default)]
    pub applications: BTreeMap<String, SnapshotNode>,
}

impl SnapshotControlProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_application(mut self, application_id: impl Into<String>, root: SnapshotNode) -> Self {
        self.applications.insert(application_id.into(), root);
        self
    }

    fn node(&self, handle_id: &str) -> Option<&SnapshotNode> {
        self.applications
            .values()
            .find_map(|root| root.find(handle_id))
    }
}

#[async_trait]
impl ControlProvider for SnapshotControlProvider {
    async fn find_all(
        &self,
        identity: &ControlIdentity,
        root: Option<&ControlHandle>,
    ) -> Result<Vec<ControlHandle>, LocatorError> {
        let start = match root {
            Some(handle) => self.node(&handle.handle_id).ok_or_else(|| {
                LocatorError::Provider(format!("control {} is no longer available", handle.handle_id))
            })?,
            None => self
                .applications
                .get(&identity.application_id)
                .ok_or_else(|| LocatorError::ApplicationNotFound(identity.application_id.clone()))?,
        };

        let mut found = Vec::new();
        start.collect_matches(identity, identity.search_scope, &mut found);
        debug!(
            control_type = %identity.control_type,
            root = %start.handle.handle_id,
            count = found.len(),
            "snapshot lookup"
        );
        Ok(found)
    }
}

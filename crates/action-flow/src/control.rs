//! Control entities resolved through the locator

use action_locator::{ControlLookupSpec, LocatorError, LookupRequest, LookupType};
use async_recursion::async_recursion;
use autoflow_core_types::{ComponentId, ControlHandle};
use tracing::{debug, warn};

use crate::component::{ComponentInfo, ComponentKind};
use crate::errors::FlowError;
use crate::manager::EntityManager;

struct ControlContext {
    spec: ControlLookupSpec,
    parent: Option<(ComponentId, bool)>,
    info: ComponentInfo,
}

impl EntityManager {
    fn control_context(&self, entity: &ComponentId) -> Result<ControlContext, FlowError> {
        self.read(|tree| -> Result<ControlContext, FlowError> {
            let node = tree.node(entity)?;
            let ComponentKind::Control(spec) = &node.kind else {
                return Err(FlowError::NotAControl(entity.clone()));
            };
            let parent = node.parent().map(|parent| {
                let is_control = tree
                    .get(parent)
                    .is_some_and(|parent| matches!(parent.kind, ComponentKind::Control(_)));
                (parent.clone(), is_control)
            });
            Ok(ControlContext {
                spec: spec.clone(),
                parent,
                info: node.info(),
            })
        })
    }

    /// All controls matched by a control entity, after filtering.
    #[async_recursion]
    pub async fn get_all_controls(
        &self,
        entity: &ComponentId,
    ) -> Result<Vec<ControlHandle>, FlowError> {
        let ControlContext { spec, parent, info } = self.control_context(entity)?;

        if spec.cache_control {
            if let Some(hit) = self.locator.cached(entity) {
                return Ok(hit);
            }
        }

        let root = if spec.search_root.is_configured() {
            Some(
                self.argument_processor()
                    .get_value(&spec.search_root)
                    .await?,
            )
        } else if spec.lookup_type == LookupType::Relative {
            match parent {
                Some((parent, true)) => {
                    debug!(component = %entity, parent = %parent, "relative lookup");
                    Some(self.get_control(&parent).await?)
                }
                _ => {
                    warn!(
                        component = %entity,
                        "relative control has no parent control, searching the application root"
                    );
                    None
                }
            }
        } else {
            None
        };

        let component = serde_json::to_value(&info)
            .map_err(|err| FlowError::Document(err.to_string()))?;
        let controls = self
            .locator
            .locate(
                LookupRequest {
                    owner: entity,
                    spec: &spec,
                    component: &component,
                    root,
                },
                self.argument_processor(),
            )
            .await?;
        Ok(controls)
    }

    /// First control matched by a control entity.
    pub async fn get_control(&self, entity: &ComponentId) -> Result<ControlHandle, FlowError> {
        self.get_all_controls(entity)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                FlowError::Locator(LocatorError::ControlNotFound {
                    control_type: entity.to_string(),
                    attempts: 0,
                })
            })
    }

    /// Forget the cached controls and description of a control entity.
    pub fn reload_control(&self, entity: &ComponentId) -> Result<(), FlowError> {
        self.control_context(entity)?;
        self.locator.reload(entity);
        Ok(())
    }

    /// `component` itself when it is a control entity, else its nearest
    /// control ancestor.
    pub fn control_entity_of(&self, component: &ComponentId) -> Option<ComponentId> {
        self.read(|tree| {
            let node = tree.get(component)?;
            if matches!(node.kind, ComponentKind::Control(_)) {
                return Some(component.clone());
            }
            tree.find_ancestor(component, |node| {
                matches!(node.kind, ComponentKind::Control(_))
            })
        })
    }
}

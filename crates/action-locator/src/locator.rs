//! Control lookup with retry, filtering and caching

use std::sync::Arc;
use std::time::Duration;

use autoflow_arguments::ArgumentProcessor;
use autoflow_core_types::{ComponentId, ControlHandle};
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::LocatorError;
use crate::provider::ControlProvider;
use crate::repository::ControlRepository;
use crate::types::{ControlDescription, ControlIdentity, ControlLookupSpec, FilterMode, LookupMode};

/// One lookup issued on behalf of a control entity.
pub struct LookupRequest<'a> {
    pub owner: &'a ComponentId,
    pub spec: &'a ControlLookupSpec,
    /// Serialized owning component, handed to filter predicates
    pub component: &'a Value,
    /// Search root already chosen by the caller
    pub root: Option<ControlHandle>,
}

/// Resolves control entities to handles.
///
/// Descriptions are loaded lazily per entity and kept until [`reload`];
/// resolved handles are kept only for entities with `cache_control` set.
///
/// [`reload`]: ControlLocator::reload
pub struct ControlLocator {
    provider: Arc<dyn ControlProvider>,
    repository: ControlRepository,
    descriptions: DashMap<ComponentId, Arc<ControlDescription>>,
    cache: DashMap<ComponentId, Vec<ControlHandle>>,
}

impl ControlLocator {
    pub fn new(provider: Arc<dyn ControlProvider>, repository: ControlRepository) -> Self {
        Self {
            provider,
            repository,
            descriptions: DashMap::new(),
            cache: DashMap::new(),
        }
    }

    pub fn repository(&self) -> &ControlRepository {
        &self.repository
    }

    /// Description for `owner`, loaded from `spec.control_file` on first use.
    pub fn description(
        &self,
        owner: &ComponentId,
        spec: &ControlLookupSpec,
    ) -> Result<Arc<ControlDescription>, LocatorError> {
        if let Some(found) = self.descriptions.get(owner) {
            return Ok(Arc::clone(found.value()));
        }
        let loaded = Arc::new(self.repository.load(&spec.control_file)?);
        self.descriptions.insert(owner.clone(), Arc::clone(&loaded));
        Ok(loaded)
    }

    pub fn cached(&self, owner: &ComponentId) -> Option<Vec<ControlHandle>> {
        self.cache.get(owner).map(|entry| entry.value().clone())
    }

    /// Drop cached handles and the loaded description of `owner`.
    pub fn reload(&self, owner: &ComponentId) {
        self.cache.remove(owner);
        self.descriptions.remove(owner);
    }

    /// Drop cached handles of `owner`, keeping its description.
    pub fn reset(&self, owner: &ComponentId) {
        self.cache.remove(owner);
    }

    pub fn clear(&self) {
        self.cache.clear();
        self.descriptions.clear();
    }

    /// Resolve and filter the controls of one entity.
    ///
    /// Cached results are returned without querying the provider when the
    /// spec enables caching.
    pub async fn locate(
        &self,
        request: LookupRequest<'_>,
        processor: &ArgumentProcessor,
    ) -> Result<Vec<ControlHandle>, LocatorError> {
        let LookupRequest {
            owner,
            spec,
            component,
            root,
        } = request;

        if spec.cache_control {
            if let Some(hit) = self.cached(owner) {
                debug!(%owner, "control cache hit");
                return Ok(hit);
            }
        }

        let description = self.description(owner, spec)?;
        let candidates = self.resolve_chain(&description.control_details, root).await?;
        let selected = self.select(spec, candidates, component, processor).await?;
        info!(
            %owner,
            control = %description.control_name,
            count = selected.len(),
            "resolved controls"
        );

        if spec.cache_control {
            self.cache.insert(owner.clone(), selected.clone());
        }
        Ok(selected)
    }

    /// Walk the chain: each intermediate node resolves one control that roots
    /// the next search. Returns the candidates of the last node.
    pub async fn resolve_chain(
        &self,
        identity: &ControlIdentity,
        root: Option<ControlHandle>,
    ) -> Result<Vec<ControlHandle>, LocatorError> {
        let mut root = root;
        let mut node = identity;
        loop {
            let candidates = self.find_with_retry(node, root.as_ref()).await?;
            let Some(next) = node.next.as_deref() else {
                return Ok(candidates);
            };
            root = Some(first_of(candidates, &node.control_type)?);
            node = next;
        }
    }

    async fn find_with_retry(
        &self,
        identity: &ControlIdentity,
        root: Option<&ControlHandle>,
    ) -> Result<Vec<ControlHandle>, LocatorError> {
        let attempts = identity.retry_attempts.max(1);
        let interval = Duration::from_millis(identity.retry_interval_ms);

        for attempt in 1..=attempts {
            match self.provider.find_all(identity, root).await {
                Ok(found) if !found.is_empty() => return Ok(found),
                Ok(_) => {
                    debug!(
                        control_type = %identity.control_type,
                        attempt,
                        attempts,
                        "no candidates"
                    );
                }
                Err(LocatorError::Provider(message)) if attempt == attempts => {
                    return Err(LocatorError::Provider(message));
                }
                Err(err) if err.is_retryable() => {
                    warn!(control_type = %identity.control_type, attempt, "provider error: {}", err);
                }
                Err(err) => return Err(err),
            }
            if attempt < attempts {
                tokio::time::sleep(interval).await;
            }
        }

        // A target application that never appeared counts as a missing control.
        Err(LocatorError::ControlNotFound {
            control_type: identity.control_type.clone(),
            attempts,
        })
    }

    async fn select(
        &self,
        spec: &ControlLookupSpec,
        candidates: Vec<ControlHandle>,
        component: &Value,
        processor: &ArgumentProcessor,
    ) -> Result<Vec<ControlHandle>, LocatorError> {
        match spec.lookup_mode {
            LookupMode::FindSingle => {
                let last = spec.control_file.as_str();
                Ok(vec![first_of(candidates, last)?])
            }
            LookupMode::FindAll => match spec.filter_mode {
                FilterMode::Unfiltered => Ok(candidates),
                FilterMode::Index => {
                    let count = candidates.len();
                    candidates
                        .into_iter()
                        .nth(spec.index)
                        .map(|handle| vec![handle])
                        .ok_or(LocatorError::IndexOutOfRange {
                            index: spec.index,
                            count,
                        })
                }
                FilterMode::Custom => {
                    if !spec.filter.is_configured() {
                        return Err(LocatorError::InvalidConfiguration(
                            "custom filter has no script".into(),
                        ));
                    }
                    let count = candidates.len();
                    let mut matched = Vec::new();
                    for candidate in candidates {
                        if processor.evaluate(&spec.filter, component, &candidate).await? {
                            matched.push(candidate);
                        }
                    }
                    if matched.is_empty() {
                        return Err(LocatorError::NoFilterMatch { count });
                    }
                    Ok(matched)
                }
            },
        }
    }
}

fn first_of(candidates: Vec<ControlHandle>, what: &str) -> Result<ControlHandle, LocatorError> {
    if candidates.len() > 1 {
        warn!(
            control = what,
            count = candidates.len(),
            "ambiguous lookup, taking the first candidate"
        );
    }
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| LocatorError::ControlNotFound {
            control_type: what.to_string(),
            attempts: 0,
        })
}

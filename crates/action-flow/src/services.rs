use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;

type ServiceKey = (TypeId, Option<String>);

/// Services resolved by type and optional key.
#[derive(Default)]
pub struct ServiceRegistry {
    services: DashMap<ServiceKey, Arc<dyn Any + Send + Sync>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service`, replacing any previous one under the same key.
    pub fn register<T: Send + Sync + 'static>(&self, key: Option<&str>, service: Arc<T>) {
        self.services
            .insert((TypeId::of::<T>(), key.map(str::to_string)), service);
    }

    pub fn get<T: Send + Sync + 'static>(&self, key: Option<&str>) -> Option<Arc<T>> {
        let entry = self
            .services
            .get(&(TypeId::of::<T>(), key.map(str::to_string)))?;
        Arc::clone(entry.value()).downcast::<T>().ok()
    }

    pub fn contains<T: Send + Sync + 'static>(&self, key: Option<&str>) -> bool {
        self.services
            .contains_key(&(TypeId::of::<T>(), key.map(str::to_string)))
    }

    pub(crate) fn describe<T: 'static>(key: Option<&str>) -> String {
        match key {
            Some(key) => format!("{} ({key})", type_name::<T>()),
            None => type_name::<T>().to_string(),
        }
    }
}

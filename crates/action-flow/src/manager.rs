//! Entity manager: tree holder and service locator

use std::sync::Arc;

use action_locator::{ControlLocator, ControlProvider, ControlRepository, SnapshotControlProvider};
use autoflow_arguments::{
    path, ArgumentProcessor, Binding, DataModel, PropertyDescriptor, TypeRegistry,
};
use autoflow_core_types::{ComponentId, ValueType};
use autoflow_project_store::FileSystem;
use autoflow_script_engine::{RhaiScriptEngine, ScriptEngine};
use parking_lot::RwLock;
use schemars::JsonSchema;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::component::{ComponentKind, ComponentNode, ForEachLoopSpec, RunState};
use crate::cursor::ProcessCursor;
use crate::document::{self, ComponentDocument};
use crate::errors::FlowError;
use crate::services::ServiceRegistry;
use crate::tree::ProcessTree;

/// Builder for [`EntityManager`]
pub struct EntityManagerBuilder {
    file_system: Arc<dyn FileSystem>,
    script_engine: Option<Arc<dyn ScriptEngine>>,
    control_provider: Option<Arc<dyn ControlProvider>>,
    data_model: Value,
    root: Option<ComponentDocument>,
}

impl EntityManagerBuilder {
    pub fn script_engine(mut self, engine: Arc<dyn ScriptEngine>) -> Self {
        self.script_engine = Some(engine);
        self
    }

    pub fn control_provider(mut self, provider: Arc<dyn ControlProvider>) -> Self {
        self.control_provider = Some(provider);
        self
    }

    pub fn data_model(mut self, data_model: Value) -> Self {
        self.data_model = data_model;
        self
    }

    /// Process to host; defaults to an empty group.
    pub fn root(mut self, document: ComponentDocument) -> Self {
        self.root = Some(document);
        self
    }

    pub fn build(self) -> Result<EntityManager, FlowError> {
        let script_engine: Arc<dyn ScriptEngine> = match self.script_engine {
            Some(engine) => engine,
            None => Arc::new(RhaiScriptEngine::new(Arc::clone(&self.file_system))),
        };
        let provider: Arc<dyn ControlProvider> = match self.control_provider {
            Some(provider) => provider,
            None => Arc::new(SnapshotControlProvider::new()),
        };

        let mut tree = match &self.root {
            Some(document) => document::build_tree(document, false)?,
            None => ProcessTree::new(ComponentNode::group("Root")),
        };
        let root = tree.root().clone();
        tree.resolve_subtree(&root)?;

        Ok(EntityManager {
            tree: RwLock::new(tree),
            processor: ArgumentProcessor::new(DataModel::new(self.data_model), script_engine),
            locator: ControlLocator::new(
                provider,
                ControlRepository::new(Arc::clone(&self.file_system)),
            ),
            file_system: self.file_system,
            services: ServiceRegistry::new(),
            types: TypeRegistry::new(),
        })
    }
}

/// Hosts the process tree and hands out the shared runtime services.
///
/// Tree access goes through short read/write sections; no lock is held while
/// arguments, scripts or control lookups are awaited.
pub struct EntityManager {
    tree: RwLock<ProcessTree>,
    processor: ArgumentProcessor,
    file_system: Arc<dyn FileSystem>,
    pub(crate) locator: ControlLocator,
    services: ServiceRegistry,
    types: TypeRegistry,
}

impl EntityManager {
    pub fn builder(file_system: Arc<dyn FileSystem>) -> EntityManagerBuilder {
        EntityManagerBuilder {
            file_system,
            script_engine: None,
            control_provider: None,
            data_model: json!({}),
            root: None,
        }
    }

    pub fn root(&self) -> ComponentId {
        self.tree.read().root().clone()
    }

    /// Run `f` against the tree under a read lock.
    pub fn read<R>(&self, f: impl FnOnce(&ProcessTree) -> R) -> R {
        f(&self.tree.read())
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut ProcessTree) -> R) -> R {
        f(&mut self.tree.write())
    }

    pub fn node(&self, id: &ComponentId) -> Result<ComponentNode, FlowError> {
        self.read(|tree| tree.node(id).cloned())
    }

    pub fn argument_processor(&self) -> &ArgumentProcessor {
        &self.processor
    }

    pub fn script_engine(&self) -> &Arc<dyn ScriptEngine> {
        self.processor.script_engine()
    }

    pub fn data_model(&self) -> &DataModel {
        self.processor.data_model()
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.file_system
    }

    pub fn control_locator(&self) -> &ControlLocator {
        &self.locator
    }

    pub fn register_service<T: Send + Sync + 'static>(&self, key: Option<&str>, service: Arc<T>) {
        self.services.register(key, service);
    }

    pub fn service<T: Send + Sync + 'static>(&self, key: Option<&str>) -> Result<Arc<T>, FlowError> {
        self.services
            .get::<T>(key)
            .ok_or_else(|| FlowError::ServiceNotFound(ServiceRegistry::describe::<T>(key)))
    }

    /// Add `component` under `parent` and resolve its dependencies.
    pub fn add_component(
        &self,
        parent: &ComponentId,
        component: ComponentNode,
    ) -> Result<ComponentId, FlowError> {
        self.write(|tree| {
            let id = tree.add_component(parent, component)?;
            tree.resolve_subtree(&id)?;
            Ok::<_, FlowError>(id)
        })
    }

    pub fn remove_component(&self, id: &ComponentId) -> Result<(), FlowError> {
        let removed = self.write(|tree| tree.remove_component(id))?;
        for gone in &removed {
            self.locator.reload(gone);
        }
        Ok(())
    }

    pub fn process_order(&self, id: &ComponentId) -> Option<usize> {
        self.read(|tree| tree.process_order(id))
    }

    pub fn move_to(&self, id: &ComponentId, order: usize) -> Result<(), FlowError> {
        self.write(|tree| tree.move_to(id, order))
    }

    /// Attach a deserialized subtree below `parent`, rebuilding parent links.
    pub fn restore_parent_child_relation(
        &self,
        document: &ComponentDocument,
        parent: &ComponentId,
        reset_ids: bool,
    ) -> Result<ComponentId, FlowError> {
        let id = self.write(|tree| {
            let id = document::attach(tree, document, parent, reset_ids)?;
            tree.resolve_subtree(&id)?;
            Ok::<_, FlowError>(id)
        })?;
        debug!(component = %id, count = document.count(), "restored subtree");
        Ok(id)
    }

    pub fn to_document(&self, id: &ComponentId) -> Result<ComponentDocument, FlowError> {
        self.read(|tree| ComponentDocument::from_tree(tree, id))
    }

    /// Cursor over `entity` and everything below it.
    pub fn traverse(&self, entity: &ComponentId) -> Result<ProcessCursor, FlowError> {
        self.read(|tree| tree.node(entity).map(|_| ()))?;
        Ok(ProcessCursor::new(entity.clone()))
    }

    pub fn run_state(&self, id: &ComponentId) -> Result<RunState, FlowError> {
        self.read(|tree| tree.node(id).map(ComponentNode::run_state))
    }

    /// Flag the nearest loop around `component` to exit at its next check.
    ///
    /// Nothing is modified when `component` has no loop ancestor.
    pub fn break_loop(&self, component: &ComponentId) -> Result<ComponentId, FlowError> {
        let target = self.write(|tree| {
            tree.node(component)?;
            let target = tree
                .find_ancestor(component, ComponentNode::is_loop)
                .ok_or_else(|| FlowError::NoLoopAncestor(component.clone()))?;
            tree.node_mut(&target)?.run_state.exit_criteria_satisfied = true;
            Ok::<_, FlowError>(target)
        })?;
        info!(component = %component, target = %target, "loop break requested");
        Ok(target)
    }

    pub(crate) fn mark_exit(&self, id: &ComponentId) -> Result<(), FlowError> {
        self.write(|tree| {
            tree.node_mut(id)?.run_state.exit_criteria_satisfied = true;
            Ok::<_, FlowError>(())
        })
    }

    /// Clear transient state of `id` and its subtree, including control caches.
    pub fn reset_component(&self, id: &ComponentId) -> Result<(), FlowError> {
        self.reset(id, true)
    }

    /// Clear transient state below `id`, leaving `id` itself untouched.
    pub fn reset_descendants(&self, id: &ComponentId) -> Result<(), FlowError> {
        self.reset(id, false)
    }

    /// Reset the whole tree before a run.
    pub fn reset_run(&self) -> Result<(), FlowError> {
        let root = self.root();
        self.reset_component(&root)
    }

    fn reset(&self, id: &ComponentId, include_self: bool) -> Result<(), FlowError> {
        let controls = self.write(|tree| {
            tree.node(id)?;
            let mut targets = tree.descendants(id);
            if include_self {
                targets.insert(0, id.clone());
            }
            let mut controls = Vec::new();
            for target in targets {
                if let Some(node) = tree.get_mut(&target) {
                    node.run_state = RunState::default();
                    if matches!(node.kind, ComponentKind::Control(_)) {
                        controls.push(target);
                    }
                }
            }
            Ok::<_, FlowError>(controls)
        })?;
        for control in &controls {
            self.locator.reset(control);
        }
        Ok(())
    }

    /// Register a data-model type whose members can be offered for binding.
    pub fn register_type<T: JsonSchema>(&self, name: impl Into<String>) {
        self.types.register::<T>(name);
    }

    pub fn register_type_sample(&self, name: impl Into<String>, sample: &Value) {
        self.types.register_sample(name, sample);
    }

    pub fn properties_of_type(&self, name: &str) -> Vec<PropertyDescriptor> {
        self.types.properties_of(name).unwrap_or_default()
    }

    fn for_each_spec(&self, id: &ComponentId) -> Result<ForEachLoopSpec, FlowError> {
        match self.node(id)?.kind {
            ComponentKind::ForEachLoop(spec) => Ok(spec),
            _ => Err(FlowError::InvalidStructure(format!(
                "component {id} is not a for-each loop"
            ))),
        }
    }

    fn sample_item(&self, spec: &ForEachLoopSpec) -> Option<Value> {
        let list = match spec.source.argument().binding() {
            Binding::Default { value: Some(value) } => value.clone(),
            Binding::DataBound {
                property_path: Some(property_path),
            } => self.data_model().get(property_path).ok()?,
            _ => return None,
        };
        list.as_array()?.first().cloned()
    }

    /// Declared element type of a for-each loop, else inferred from its source.
    pub fn element_type(&self, id: &ComponentId) -> Result<ValueType, FlowError> {
        let spec = self.for_each_spec(id)?;
        if let Some(declared) = spec.item_type {
            return Ok(declared);
        }
        Ok(self
            .sample_item(&spec)
            .map(|item| ValueType::of(&item))
            .unwrap_or_default())
    }

    /// Members of the element type a for-each loop publishes.
    pub fn item_properties(&self, id: &ComponentId) -> Result<Vec<PropertyDescriptor>, FlowError> {
        let spec = self.for_each_spec(id)?;
        if let Some(name) = &spec.item_type_name {
            return Ok(self.properties_of_type(name));
        }
        let Some(item) = self.sample_item(&spec) else {
            return Ok(Vec::new());
        };
        Ok(path::member_names(&item)
            .into_iter()
            .map(|member| {
                let value_type = path::get(&item, &member)
                    .map(ValueType::of)
                    .unwrap_or_default();
                PropertyDescriptor::new(member, value_type)
            })
            .collect())
    }
}

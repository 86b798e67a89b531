//! Actor trait and registry

use std::sync::Arc;

use action_flow::{ActorSpec, EntityManager};
use async_trait::async_trait;
use autoflow_arguments::Argument;
use autoflow_core_types::ComponentId;
use dashmap::DashMap;
use serde_json::Value;

use crate::errors::ActionError;
use crate::primitives::{
    BreakLoopActor, FindAllControlsActor, FindControlActor, LogActor, RunScriptActor,
    SetValueActor,
};

/// Everything an actor sees while it runs.
pub struct ActorContext<'a> {
    pub manager: &'a EntityManager,
    pub component: &'a ComponentId,
    pub spec: &'a ActorSpec,
}

impl<'a> ActorContext<'a> {
    pub fn new(manager: &'a EntityManager, component: &'a ComponentId, spec: &'a ActorSpec) -> Self {
        Self {
            manager,
            component,
            spec,
        }
    }

    pub fn argument(&self, name: &str) -> Result<&'a Argument, ActionError> {
        self.spec
            .argument(name)
            .ok_or_else(|| ActionError::MissingArgument {
                actor: self.spec.actor_type.clone(),
                argument: name.to_string(),
            })
    }

    /// Resolve a required input.
    pub async fn input(&self, name: &str) -> Result<Value, ActionError> {
        let argument = self.argument(name)?;
        Ok(self.manager.argument_processor().resolve(argument).await?)
    }

    /// Resolve an input when the component declares it.
    pub async fn optional_input(&self, name: &str) -> Result<Option<Value>, ActionError> {
        match self.spec.argument(name) {
            Some(argument) => Ok(Some(
                self.manager.argument_processor().resolve(argument).await?,
            )),
            None => Ok(None),
        }
    }

    /// Resolve a required input that must be a string.
    pub async fn string_input(&self, name: &str) -> Result<String, ActionError> {
        match self.input(name).await? {
            Value::String(text) => Ok(text),
            other => Err(ActionError::InvalidArgument {
                argument: name.to_string(),
                reason: format!("expected a string, found {other}"),
            }),
        }
    }

    /// Write through an output when the component declares and binds it.
    pub async fn output(&self, name: &str, value: Value) -> Result<bool, ActionError> {
        match self.spec.argument(name) {
            Some(argument) if argument.is_configured() => {
                self.manager.argument_processor().write(argument, value).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// An action performed for a yielded component.
#[async_trait]
pub trait Actor: Send + Sync {
    /// Key matched against `ActorSpec::actor_type`.
    fn actor_type(&self) -> &'static str;

    /// Run the action. The returned value is recorded in the step report.
    async fn execute(&self, ctx: &ActorContext<'_>) -> Result<Option<Value>, ActionError>;
}

/// Actors by type.
#[derive(Default)]
pub struct ActorRegistry {
    actors: DashMap<String, Arc<dyn Actor>>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in actors.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(LogActor));
        registry.register(Arc::new(SetValueActor));
        registry.register(Arc::new(RunScriptActor));
        registry.register(Arc::new(BreakLoopActor));
        registry.register(Arc::new(FindControlActor));
        registry.register(Arc::new(FindAllControlsActor));
        registry
    }

    /// Register `actor`, replacing any actor of the same type.
    pub fn register(&self, actor: Arc<dyn Actor>) {
        self.actors.insert(actor.actor_type().to_string(), actor);
    }

    pub fn get(&self, actor_type: &str) -> Result<Arc<dyn Actor>, ActionError> {
        self.actors
            .get(actor_type)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ActionError::UnknownActor(actor_type.to_string()))
    }

    pub fn contains(&self, actor_type: &str) -> bool {
        self.actors.contains_key(actor_type)
    }

    /// Registered types, sorted.
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.actors.iter().map(|entry| entry.key().clone()).collect();
        types.sort();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let registry = ActorRegistry::with_builtins();
        assert_eq!(
            registry.types(),
            vec![
                "break-loop",
                "find-all-controls",
                "find-control",
                "log",
                "run-script",
                "set-value"
            ]
        );
        assert!(matches!(
            registry.get("click"),
            Err(ActionError::UnknownActor(ref name)) if name == "click"
        ));
    }
}

//! Components and their kinds

use std::collections::BTreeMap;

use action_locator::ControlLookupSpec;
use autoflow_arguments::{Argument, InArgument, OutArgument, PredicateArgument};
use autoflow_core_types::{ComponentId, ValueType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name given to the body placeholder of loop entities.
pub const STATEMENTS: &str = "Statements";

/// An action performed when the component is yielded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSpec {
    /// Key into the actor registry
    pub actor_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub arguments: BTreeMap<String, Argument>,
}

impl ActorSpec {
    pub fn new(actor_type: impl Into<String>) -> Self {
        Self {
            actor_type: actor_type.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, argument: Argument) -> Self {
        self.arguments.insert(name.into(), argument);
        self
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.get(name)
    }
}

/// Plain entity; runs its own action, if any, before its children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActorSpec>,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForLoopSpec {
    pub start: InArgument<i64>,
    pub end: InArgument<i64>,
    #[serde(default = "one")]
    pub step: i64,
    /// Receives the counter before each pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<OutArgument<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,
}

impl ForLoopSpec {
    pub fn range(start: i64, end: i64) -> Self {
        Self {
            start: InArgument::with_default(start).unwrap_or_default(),
            end: InArgument::with_default(end).unwrap_or_default(),
            step: 1,
            index: None,
            max_iterations: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForEachLoopSpec {
    pub source: InArgument<Vec<Value>>,
    /// Receives the item before each pass
    pub current: OutArgument<Value>,
    /// Declared element type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ValueType>,
    /// Registered data-model type of the elements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,
}

impl ForEachLoopSpec {
    pub fn new(source: InArgument<Vec<Value>>, current: OutArgument<Value>) -> Self {
        Self {
            source,
            current,
            item_type: None,
            item_type_name: None,
            max_iterations: None,
        }
    }
}

/// While / do-while condition, invoked with the iteration index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionLoopSpec {
    pub condition: PredicateArgument<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,
}

impl ConditionLoopSpec {
    pub fn scripted(script_file: impl Into<String>) -> Self {
        Self {
            condition: PredicateArgument::scripted(script_file),
            max_iterations: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentKind {
    Actor(ActorSpec),
    Group(GroupSpec),
    /// Fixed container created by its owner
    Placeholder,
    ForLoop(ForLoopSpec),
    ForEachLoop(ForEachLoopSpec),
    WhileLoop(ConditionLoopSpec),
    DoWhileLoop(ConditionLoopSpec),
    Control(ControlLookupSpec),
}

/// Discriminant of [`ComponentKind`], used for lookup by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Actor,
    Group,
    Placeholder,
    ForLoop,
    ForEachLoop,
    WhileLoop,
    DoWhileLoop,
    Control,
}

impl ComponentType {
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            ComponentType::ForLoop
                | ComponentType::ForEachLoop
                | ComponentType::WhileLoop
                | ComponentType::DoWhileLoop
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Actor => "actor",
            ComponentType::Group => "group",
            ComponentType::Placeholder => "placeholder",
            ComponentType::ForLoop => "for_loop",
            ComponentType::ForEachLoop => "for_each_loop",
            ComponentType::WhileLoop => "while_loop",
            ComponentType::DoWhileLoop => "do_while_loop",
            ComponentType::Control => "control",
        }
    }
}

impl ComponentKind {
    pub fn component_type(&self) -> ComponentType {
        match self {
            ComponentKind::Actor(_) => ComponentType::Actor,
            ComponentKind::Group(_) => ComponentType::Group,
            ComponentKind::Placeholder => ComponentType::Placeholder,
            ComponentKind::ForLoop(_) => ComponentType::ForLoop,
            ComponentKind::ForEachLoop(_) => ComponentType::ForEachLoop,
            ComponentKind::WhileLoop(_) => ComponentType::WhileLoop,
            ComponentKind::DoWhileLoop(_) => ComponentType::DoWhileLoop,
            ComponentKind::Control(_) => ComponentType::Control,
        }
    }

    /// Action run when the component is yielded.
    pub fn action(&self) -> Option<&ActorSpec> {
        match self {
            ComponentKind::Actor(spec) => Some(spec),
            ComponentKind::Group(group) => group.action.as_ref(),
            _ => None,
        }
    }

    /// Leaves cannot own children.
    pub fn is_entity(&self) -> bool {
        !matches!(self, ComponentKind::Actor(_))
    }

    pub fn max_iterations(&self) -> Option<u64> {
        match self {
            ComponentKind::ForLoop(spec) => spec.max_iterations,
            ComponentKind::ForEachLoop(spec) => spec.max_iterations,
            ComponentKind::WhileLoop(spec) | ComponentKind::DoWhileLoop(spec) => {
                spec.max_iterations
            }
            _ => None,
        }
    }
}

/// Transient state cleared on every run reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// Set by break or a failed condition
    pub exit_criteria_satisfied: bool,
    /// Completed passes of a loop
    pub iteration: u64,
}

/// Node of the process tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentNode {
    pub id: ComponentId,
    pub name: String,
    pub tag: Option<String>,
    pub enabled: bool,
    pub kind: ComponentKind,
    pub(crate) parent: Option<ComponentId>,
    pub(crate) children: Vec<ComponentId>,
    pub(crate) run_state: RunState,
    pub(crate) dependencies_resolved: bool,
}

impl ComponentNode {
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id: ComponentId::new(),
            name: name.into(),
            tag: None,
            enabled: true,
            kind,
            parent: None,
            children: Vec::new(),
            run_state: RunState::default(),
            dependencies_resolved: false,
        }
    }

    pub fn actor(name: impl Into<String>, spec: ActorSpec) -> Self {
        Self::new(name, ComponentKind::Actor(spec))
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, ComponentKind::Group(GroupSpec::default()))
    }

    pub fn with_id(mut self, id: impl Into<ComponentId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn parent(&self) -> Option<&ComponentId> {
        self.parent.as_ref()
    }

    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn component_type(&self) -> ComponentType {
        self.kind.component_type()
    }

    pub fn is_loop(&self) -> bool {
        self.component_type().is_loop()
    }

    /// Whether the driver executes this component when it is yielded.
    pub fn is_processable(&self) -> bool {
        self.kind.action().is_some()
    }

    pub fn info(&self) -> ComponentInfo {
        ComponentInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            tag: self.tag.clone(),
            component_type: self.component_type(),
        }
    }
}

/// Component summary handed to scripts and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub id: ComponentId,
    pub name: String,
    #[serde(default)]
    pub tag: Option<String>,
    pub component_type: ComponentType,
}

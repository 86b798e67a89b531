//! Static checks run before a process is executed

use std::fmt;

use action_locator::{FilterMode, LookupMode, LookupType};
use autoflow_arguments::ArgumentDirection;
use autoflow_core_types::{ComponentId, ErrorClass};
use serde::Serialize;
use tracing::{info, warn};

use crate::component::{ActorSpec, ComponentKind, ComponentNode};
use crate::errors::FlowError;
use crate::manager::EntityManager;
use crate::tree::ProcessTree;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub component: ComponentId,
    pub name: String,
    pub class: ErrorClass,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' ({}): {}",
            self.class, self.name, self.component, self.message
        )
    }
}

struct Checker<'a> {
    tree: &'a ProcessTree,
    issues: Vec<ValidationIssue>,
}

impl Checker<'_> {
    fn report(&mut self, node: &ComponentNode, class: ErrorClass, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            component: node.id.clone(),
            name: node.name.clone(),
            class,
            message: message.into(),
        });
    }

    fn configuration(&mut self, node: &ComponentNode, message: impl Into<String>) {
        self.report(node, ErrorClass::Configuration, message);
    }

    fn check(&mut self, node: &ComponentNode) {
        self.check_links(node);
        match &node.kind {
            ComponentKind::Actor(spec) => self.check_action(node, spec),
            ComponentKind::Group(group) => {
                if let Some(action) = &group.action {
                    self.check_action(node, action);
                }
            }
            ComponentKind::Placeholder => {}
            ComponentKind::ForLoop(spec) => {
                if spec.step == 0 {
                    self.configuration(node, "for loop step must not be zero");
                }
                if !spec.start.is_configured() || !spec.end.is_configured() {
                    self.configuration(node, "for loop bounds are not configured");
                }
                if spec.index.as_ref().is_some_and(|index| !index.is_configured()) {
                    self.configuration(node, "for loop index is not bound");
                }
            }
            ComponentKind::ForEachLoop(spec) => {
                if !spec.source.is_configured() {
                    self.configuration(node, "for-each source is not configured");
                }
                if !spec.current.is_configured() {
                    self.configuration(node, "for-each current item is not bound");
                }
            }
            ComponentKind::WhileLoop(spec) | ComponentKind::DoWhileLoop(spec) => {
                if !spec.condition.is_configured() {
                    self.configuration(node, "loop condition has no script");
                }
            }
            ComponentKind::Control(spec) => {
                if spec.control_file.trim().is_empty() {
                    self.configuration(node, "control entity has no control file");
                }
                if spec.lookup_type == LookupType::Relative && !spec.search_root.is_configured() {
                    let parent_is_control = node
                        .parent()
                        .and_then(|parent| self.tree.get(parent))
                        .is_some_and(|parent| matches!(parent.kind, ComponentKind::Control(_)));
                    if !parent_is_control {
                        self.configuration(node, "relative lookup requires a parent control entity");
                    }
                }
                if spec.filter_mode == FilterMode::Custom && !spec.filter.is_configured() {
                    self.configuration(node, "custom control filter has no script");
                }
                if spec.lookup_mode == LookupMode::FindSingle
                    && spec.filter_mode != FilterMode::Unfiltered
                {
                    self.configuration(node, "control filter requires find-all lookup");
                }
            }
        }
    }

    fn check_action(&mut self, node: &ComponentNode, action: &ActorSpec) {
        if action.actor_type.trim().is_empty() {
            self.configuration(node, "actor type is empty");
        }
        for (name, argument) in &action.arguments {
            let needs_value = matches!(
                argument.direction(),
                ArgumentDirection::In | ArgumentDirection::Predicate
            );
            if needs_value && !argument.is_configured() {
                self.configuration(node, format!("argument '{name}' is not configured"));
            }
        }
    }

    fn check_links(&mut self, node: &ComponentNode) {
        let Some(parent) = node.parent() else {
            return;
        };
        let listed = self
            .tree
            .get(parent)
            .map(|parent| parent.children().iter().filter(|id| **id == node.id).count())
            .unwrap_or(0);
        if listed != 1 {
            self.report(
                node,
                ErrorClass::Structural,
                format!("listed {listed} times by its parent {parent}"),
            );
        }
    }
}

impl EntityManager {
    /// Collect configuration and structural problems of the whole tree.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let issues = self.read(|tree| {
            let mut checker = Checker {
                tree,
                issues: Vec::new(),
            };
            let root = tree.root().clone();
            let mut order = vec![root.clone()];
            order.extend(tree.descendants(&root));
            for id in order {
                if let Some(node) = tree.get(&id) {
                    checker.check(node);
                }
            }
            checker.issues
        });
        for issue in &issues {
            warn!(component = %issue.component, class = %issue.class, "{}", issue.message);
        }
        info!(issues = issues.len(), "validated process");
        issues
    }

    /// Fail with the first issue found, if any.
    pub fn ensure_valid(&self) -> Result<(), FlowError> {
        match self.validate().into_iter().next() {
            Some(issue) => Err(FlowError::ValidationFailed(issue.to_string())),
            None => Ok(()),
        }
    }
}

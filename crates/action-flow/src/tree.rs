//! Arena of components addressed by id
//!
//! Children are owned by the arena and listed in process order on their
//! parent; every node records its parent's id for upward searches. Process
//! order is the 1-based position in the parent's child list.

use std::collections::HashMap;

use autoflow_core_types::ComponentId;
use tracing::debug;

use crate::component::{ComponentKind, ComponentNode, ComponentType, STATEMENTS};
use crate::errors::FlowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Children,
    Descendants,
}

#[derive(Debug, Clone)]
pub struct ProcessTree {
    root: ComponentId,
    nodes: HashMap<ComponentId, ComponentNode>,
}

impl ProcessTree {
    pub fn new(mut root: ComponentNode) -> Self {
        root.parent = None;
        root.children.clear();
        let id = root.id.clone();
        let mut nodes = HashMap::new();
        nodes.insert(id.clone(), root);
        Self { root: id, nodes }
    }

    pub fn root(&self) -> &ComponentId {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &ComponentId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &ComponentId) -> Option<&ComponentNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &ComponentId) -> Option<&mut ComponentNode> {
        self.nodes.get_mut(id)
    }

    pub fn node(&self, id: &ComponentId) -> Result<&ComponentNode, FlowError> {
        self.nodes
            .get(id)
            .ok_or_else(|| FlowError::ComponentNotFound(id.clone()))
    }

    pub(crate) fn node_mut(&mut self, id: &ComponentId) -> Result<&mut ComponentNode, FlowError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| FlowError::ComponentNotFound(id.clone()))
    }

    pub fn children(&self, id: &ComponentId) -> &[ComponentId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: &ComponentId) -> Option<&ComponentId> {
        self.nodes.get(id).and_then(|node| node.parent.as_ref())
    }

    /// Entity that actually receives children added to `parent`.
    ///
    /// Loops forward additions into their body placeholder, creating it when
    /// missing; actors cannot own children.
    fn insertion_target(&mut self, parent: &ComponentId) -> Result<ComponentId, FlowError> {
        let node = self.node(parent)?;
        if !node.kind.is_entity() {
            return Err(FlowError::InvalidStructure(format!(
                "actor '{}' cannot own child components",
                node.name
            )));
        }
        if node.is_loop() {
            self.resolve_dependencies(parent)?;
            return self
                .first_component_of_kind(parent, ComponentType::Placeholder, SearchScope::Children)
                .ok_or_else(|| {
                    FlowError::InvalidStructure(format!("loop {parent} has no body"))
                });
        }
        Ok(parent.clone())
    }

    /// Append `component` to `parent`, giving it the next process order.
    pub fn add_component(
        &mut self,
        parent: &ComponentId,
        mut component: ComponentNode,
    ) -> Result<ComponentId, FlowError> {
        if self.nodes.contains_key(&component.id) {
            return Err(FlowError::InvalidStructure(format!(
                "component {} is already in the tree",
                component.id
            )));
        }
        let target = self.insertion_target(parent)?;
        let id = component.id.clone();
        component.parent = Some(target.clone());
        component.children.clear();
        self.node_mut(&target)?.children.push(id.clone());
        self.nodes.insert(id.clone(), component);
        debug!(component = %id, parent = %target, "added component");
        Ok(id)
    }

    /// Detach `id` and drop its whole subtree. Returns the removed ids.
    pub fn remove_component(&mut self, id: &ComponentId) -> Result<Vec<ComponentId>, FlowError> {
        if *id == self.root {
            return Err(FlowError::InvalidStructure(
                "the root entity cannot be removed".into(),
            ));
        }
        let parent = self.node(id)?.parent.clone();
        if let Some(parent) = parent {
            self.node_mut(&parent)?.children.retain(|child| child != id);
        }
        let mut removed = vec![id.clone()];
        removed.extend(self.descendants(id));
        for gone in &removed {
            self.nodes.remove(gone);
        }
        Ok(removed)
    }

    /// 1-based position among the parent's children.
    pub fn process_order(&self, id: &ComponentId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent)
            .iter()
            .position(|child| child == id)
            .map(|index| index + 1)
    }

    /// Move `id` to `order` among its siblings, shifting the others.
    pub fn move_to(&mut self, id: &ComponentId, order: usize) -> Result<(), FlowError> {
        let parent = self
            .parent(id)
            .cloned()
            .ok_or_else(|| FlowError::InvalidStructure("the root entity has no order".into()))?;
        let siblings = &mut self.node_mut(&parent)?.children;
        if order == 0 || order > siblings.len() {
            return Err(FlowError::InvalidStructure(format!(
                "process order {order} outside 1..={}",
                siblings.len()
            )));
        }
        if let Some(current) = siblings.iter().position(|child| child == id) {
            let moved = siblings.remove(current);
            siblings.insert(order - 1, moved);
        }
        Ok(())
    }

    /// Nearest first, excluding `id`.
    pub fn ancestors(&self, id: &ComponentId) -> Vec<ComponentId> {
        let mut found = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            found.push(parent.clone());
            current = self.parent(parent);
        }
        found
    }

    /// Pre-order, excluding `id`.
    pub fn descendants(&self, id: &ComponentId) -> Vec<ComponentId> {
        let mut found = Vec::new();
        let mut stack: Vec<&ComponentId> = self.children(id).iter().rev().collect();
        while let Some(next) = stack.pop() {
            found.push(next.clone());
            stack.extend(self.children(next).iter().rev());
        }
        found
    }

    fn scoped(&self, id: &ComponentId, scope: SearchScope) -> Vec<ComponentId> {
        match scope {
            SearchScope::Children => self.children(id).to_vec(),
            SearchScope::Descendants => self.descendants(id),
        }
    }

    pub fn first_component_of_kind(
        &self,
        id: &ComponentId,
        kind: ComponentType,
        scope: SearchScope,
    ) -> Option<ComponentId> {
        self.scoped(id, scope)
            .into_iter()
            .find(|candidate| self.is_kind(candidate, kind))
    }

    pub fn components_of_kind(
        &self,
        id: &ComponentId,
        kind: ComponentType,
        scope: SearchScope,
    ) -> Vec<ComponentId> {
        self.scoped(id, scope)
            .into_iter()
            .filter(|candidate| self.is_kind(candidate, kind))
            .collect()
    }

    fn is_kind(&self, id: &ComponentId, kind: ComponentType) -> bool {
        self.get(id)
            .is_some_and(|node| node.component_type() == kind)
    }

    /// Nearest ancestor of `id` matching `predicate`.
    pub fn find_ancestor(
        &self,
        id: &ComponentId,
        predicate: impl Fn(&ComponentNode) -> bool,
    ) -> Option<ComponentId> {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            let node = self.get(parent)?;
            if predicate(node) {
                return Some(parent.clone());
            }
            current = node.parent.as_ref();
        }
        None
    }

    /// Materialize structurally required children once. Returns whether
    /// anything was created.
    pub fn resolve_dependencies(&mut self, id: &ComponentId) -> Result<bool, FlowError> {
        let node = self.node(id)?;
        if node.dependencies_resolved {
            return Ok(false);
        }
        let needs_body = node.is_loop()
            && self
                .first_component_of_kind(id, ComponentType::Placeholder, SearchScope::Children)
                .is_none();

        if needs_body {
            let mut body = ComponentNode::new(STATEMENTS, ComponentKind::Placeholder);
            body.parent = Some(id.clone());
            body.dependencies_resolved = true;
            let body_id = body.id.clone();
            self.nodes.insert(body_id.clone(), body);
            self.node_mut(id)?.children.insert(0, body_id);
        }
        self.node_mut(id)?.dependencies_resolved = true;
        Ok(needs_body)
    }

    /// Resolve dependencies of `id` and everything below it.
    pub fn resolve_subtree(&mut self, id: &ComponentId) -> Result<(), FlowError> {
        let mut pending = vec![id.clone()];
        pending.extend(self.descendants(id));
        for next in pending {
            self.resolve_dependencies(&next)?;
        }
        Ok(())
    }

    /// Insert a node whose parent link is already set, bypassing forwarding.
    pub(crate) fn insert_linked(&mut self, node: ComponentNode) -> Result<(), FlowError> {
        if self.nodes.contains_key(&node.id) {
            return Err(FlowError::InvalidStructure(format!(
                "component {} is already in the tree",
                node.id
            )));
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    pub(crate) fn push_child(
        &mut self,
        parent: &ComponentId,
        child: ComponentId,
    ) -> Result<(), FlowError> {
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    pub(crate) fn target_for(&mut self, parent: &ComponentId) -> Result<ComponentId, FlowError> {
        self.insertion_target(parent)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentNode> {
        self.nodes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ActorSpec, ConditionLoopSpec};

    fn actor(name: &str) -> ComponentNode {
        ComponentNode::actor(name, ActorSpec::new("log"))
    }

    fn tree_with(children: &[&str]) -> (ProcessTree, Vec<ComponentId>) {
        let mut tree = ProcessTree::new(ComponentNode::group("root"));
        let root = tree.root().clone();
        let ids = children
            .iter()
            .map(|name| tree.add_component(&root, actor(name)).unwrap())
            .collect();
        (tree, ids)
    }

    #[test]
    fn process_order_stays_contiguous_after_move() {
        let (mut tree, ids) = tree_with(&["a", "b", "c", "d"]);
        tree.move_to(&ids[3], 1).unwrap();
        let orders: Vec<usize> = ids
            .iter()
            .map(|id| tree.process_order(id).unwrap())
            .collect();
        assert_eq!(orders, vec![2, 3, 4, 1]);

        tree.move_to(&ids[0], 4).unwrap();
        let mut sorted: Vec<usize> = ids
            .iter()
            .map(|id| tree.process_order(id).unwrap())
            .collect();
        sorted.sort();
        assert_eq!(sorted, vec![1, 2, 3, 4]);
        assert!(tree.move_to(&ids[0], 5).is_err());
        assert!(tree.move_to(&ids[0], 0).is_err());
    }

    #[test]
    fn actors_reject_children() {
        let (mut tree, ids) = tree_with(&["a"]);
        let err = tree.add_component(&ids[0], actor("b")).unwrap_err();
        assert!(matches!(err, FlowError::InvalidStructure(_)));
    }

    #[test]
    fn loops_forward_children_into_statements() {
        let (mut tree, _) = tree_with(&[]);
        let root = tree.root().clone();
        let looped = tree
            .add_component(
                &root,
                ComponentNode::new(
                    "while",
                    ComponentKind::WhileLoop(ConditionLoopSpec::scripted("cond.rhai")),
                ),
            )
            .unwrap();
        let child = tree.add_component(&looped, actor("body")).unwrap();

        let body = tree.parent(&child).unwrap().clone();
        assert_eq!(tree.get(&body).unwrap().name, STATEMENTS);
        assert_eq!(tree.parent(&body), Some(&looped));
        assert_eq!(tree.children(&looped).len(), 1);

        assert!(!tree.resolve_dependencies(&looped).unwrap());
        assert_eq!(tree.children(&looped).len(), 1);
    }

    #[test]
    fn removing_an_entity_drops_its_subtree() {
        let (mut tree, ids) = tree_with(&["a"]);
        let root = tree.root().clone();
        let group = tree.add_component(&root, ComponentNode::group("g")).unwrap();
        let inner = tree.add_component(&group, actor("inner")).unwrap();
        let removed = tree.remove_component(&group).unwrap();
        assert_eq!(removed, vec![group.clone(), inner.clone()]);
        assert!(!tree.contains(&inner));
        assert_eq!(tree.process_order(&ids[0]), Some(1));
        assert!(tree.remove_component(&root).is_err());
    }

    #[test]
    fn lookups_by_kind_and_ancestor() {
        let (mut tree, _) = tree_with(&["a"]);
        let root = tree.root().clone();
        let group = tree.add_component(&root, ComponentNode::group("g")).unwrap();
        let inner = tree.add_component(&group, actor("inner")).unwrap();

        assert_eq!(
            tree.components_of_kind(&root, ComponentType::Actor, SearchScope::Children)
                .len(),
            1
        );
        assert_eq!(
            tree.components_of_kind(&root, ComponentType::Actor, SearchScope::Descendants)
                .len(),
            2
        );
        assert_eq!(
            tree.first_component_of_kind(&root, ComponentType::Group, SearchScope::Descendants),
            Some(group.clone())
        );
        assert_eq!(
            tree.find_ancestor(&inner, |node| node.name == "root"),
            Some(root.clone())
        );
        assert_eq!(tree.ancestors(&inner), vec![group, root]);
    }
}

//! Nested document form of a component subtree

use autoflow_core_types::ComponentId;
use serde::{Deserialize, Serialize};

use crate::component::{ComponentKind, ComponentNode};
use crate::errors::FlowError;
use crate::tree::ProcessTree;

fn enabled() -> bool {
    true
}

/// Serializable subtree. Parent links are implied by nesting and rebuilt
/// when the document is attached to a tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ComponentId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(flatten)]
    pub kind: ComponentKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ComponentDocument>,
}

impl ComponentDocument {
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id: None,
            name: name.into(),
            tag: None,
            enabled: true,
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: ComponentDocument) -> Self {
        self.children.push(child);
        self
    }

    /// Snapshot the subtree rooted at `id`.
    pub fn from_tree(tree: &ProcessTree, id: &ComponentId) -> Result<Self, FlowError> {
        let node = tree.node(id)?;
        let children = node
            .children()
            .iter()
            .map(|child| Self::from_tree(tree, child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: Some(node.id.clone()),
            name: node.name.clone(),
            tag: node.tag.clone(),
            enabled: node.enabled,
            kind: node.kind.clone(),
            children,
        })
    }

    pub(crate) fn to_node(&self, reset_ids: bool) -> ComponentNode {
        let mut node = ComponentNode::new(self.name.clone(), self.kind.clone());
        if let (false, Some(id)) = (reset_ids, &self.id) {
            node.id = id.clone();
        }
        node.tag = self.tag.clone();
        node.enabled = self.enabled;
        node
    }

    /// Number of components in the document.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

/// Attach `document` below `parent`, re-linking every parent pointer. Ids are
/// kept unless `reset_ids` is set or the document carries none.
pub(crate) fn attach(
    tree: &mut ProcessTree,
    document: &ComponentDocument,
    parent: &ComponentId,
    reset_ids: bool,
) -> Result<ComponentId, FlowError> {
    let target = tree.target_for(parent)?;
    attach_linked(tree, document, &target, reset_ids)
}

fn attach_linked(
    tree: &mut ProcessTree,
    document: &ComponentDocument,
    parent: &ComponentId,
    reset_ids: bool,
) -> Result<ComponentId, FlowError> {
    let mut node = document.to_node(reset_ids);
    if !node.kind.is_entity() && !document.children.is_empty() {
        return Err(FlowError::InvalidStructure(format!(
            "actor '{}' cannot own child components",
            node.name
        )));
    }
    node.parent = Some(parent.clone());
    let id = node.id.clone();
    tree.insert_linked(node)?;
    tree.push_child(parent, id.clone())?;
    attach_children(tree, document, &id, reset_ids)?;
    Ok(id)
}

/// Loop bodies written inline are moved under the loop's placeholder.
fn attach_children(
    tree: &mut ProcessTree,
    document: &ComponentDocument,
    id: &ComponentId,
    reset_ids: bool,
) -> Result<(), FlowError> {
    let is_loop = tree.node(id)?.is_loop();
    for child in &document.children {
        let owner = match (&child.kind, is_loop) {
            (ComponentKind::Placeholder, _) | (_, false) => id.clone(),
            (_, true) => tree.target_for(id)?,
        };
        attach_linked(tree, child, &owner, reset_ids)?;
    }
    Ok(())
}

/// Build a tree whose root is the document root.
pub(crate) fn build_tree(
    document: &ComponentDocument,
    reset_ids: bool,
) -> Result<ProcessTree, FlowError> {
    let root = document.to_node(reset_ids);
    let root_id = root.id.clone();
    let mut tree = ProcessTree::new(root);
    attach_children(&mut tree, document, &root_id, reset_ids)?;
    Ok(tree)
}

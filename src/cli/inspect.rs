use action_flow::{ComponentType, EntityManager};
use anyhow::Result;
use autoflow_core_types::ComponentId;
use clap::Args;
use serde::Serialize;

use super::commands::ProcessArgs;
use super::context::CliContext;
use crate::workspace::Workspace;

#[derive(Args, Clone, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub process: ProcessArgs,

    /// Hide loop body placeholders
    #[arg(long)]
    pub compact: bool,
}

/// One line of the component outline.
#[derive(Debug, Clone, Serialize)]
pub struct OutlineEntry {
    pub id: ComponentId,
    pub name: String,
    pub component_type: &'static str,
    pub depth: usize,
    /// 1-based position among siblings
    pub order: usize,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_type: Option<String>,
}

/// Depth-first outline of the tree, children in process order.
pub fn outline(manager: &EntityManager, compact: bool) -> Vec<OutlineEntry> {
    manager.read(|tree| {
        let mut entries = Vec::new();
        let mut stack = vec![(tree.root().clone(), 0usize, 1usize)];
        while let Some((id, depth, order)) = stack.pop() {
            let Some(node) = tree.get(&id) else {
                continue;
            };
            let hidden = compact && node.component_type() == ComponentType::Placeholder;
            let child_depth = if hidden { depth } else { depth + 1 };
            if !hidden {
                entries.push(OutlineEntry {
                    id: id.clone(),
                    name: node.name.clone(),
                    component_type: node.component_type().as_str(),
                    depth,
                    order,
                    enabled: node.enabled,
                    actor_type: node.kind.action().map(|spec| spec.actor_type.clone()),
                });
            }
            for (index, child) in node.children().iter().enumerate().rev() {
                stack.push((child.clone(), child_depth, index + 1));
            }
        }
        entries
    })
}

pub async fn cmd_inspect(args: InspectArgs, ctx: &CliContext) -> Result<()> {
    let workspace = Workspace::load(&args.process.options(), ctx.config())?;
    let entries = outline(&workspace.manager, args.compact);
    if ctx.output().emit(&entries)? {
        return Ok(());
    }

    for entry in &entries {
        let indent = "  ".repeat(entry.depth);
        let actor = entry
            .actor_type
            .as_deref()
            .map(|actor| format!(" -> {actor}"))
            .unwrap_or_default();
        let disabled = if entry.enabled { "" } else { " (disabled)" };
        println!(
            "{indent}{}. {} [{}]{actor}{disabled}",
            entry.order, entry.name, entry.component_type
        );
    }
    Ok(())
}

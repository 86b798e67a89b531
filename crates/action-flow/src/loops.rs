//! Loop entity state machines
//!
//! A loop moves between `Evaluating` (condition check, item publication)
//! and `Running` (body traversal) until its condition fails or a break
//! flags it; both end in the exited state recorded on the node.

use autoflow_core_types::ComponentId;
use serde_json::Value;
use tracing::debug;

use crate::component::{ComponentKind, ComponentNode};
use crate::errors::FlowError;
use crate::manager::EntityManager;

/// Per-entry progress of a loop, created when the cursor enters it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LoopProgress {
    Counter { next: i64, end: i64, step: i64 },
    Items { items: Vec<Value>, next: usize },
    /// `skip_check` lets a do-while body run once before its first check
    Condition { skip_check: bool },
}

impl LoopProgress {
    pub(crate) fn advance(&mut self) {
        match self {
            LoopProgress::Counter { next, step, .. } => *next = next.saturating_add(*step),
            LoopProgress::Items { next, .. } => *next += 1,
            LoopProgress::Condition { .. } => {}
        }
    }
}

impl EntityManager {
    fn loop_node(&self, id: &ComponentId) -> Result<ComponentNode, FlowError> {
        let node = self.node(id)?;
        if !node.is_loop() {
            return Err(FlowError::InvalidStructure(format!(
                "component {id} is not a loop"
            )));
        }
        Ok(node)
    }

    /// Resolve bounds or snapshot the source of a loop being entered.
    pub(crate) async fn begin_loop(&self, id: &ComponentId) -> Result<LoopProgress, FlowError> {
        let node = self.loop_node(id)?;
        let processor = self.argument_processor();
        let progress = match &node.kind {
            ComponentKind::ForLoop(spec) => {
                if spec.step == 0 {
                    return Err(FlowError::InvalidLoop {
                        loop_id: id.clone(),
                        reason: "step must not be zero".into(),
                    });
                }
                let start = processor.get_value(&spec.start).await?;
                let end = processor.get_value(&spec.end).await?;
                LoopProgress::Counter {
                    next: start,
                    end,
                    step: spec.step,
                }
            }
            ComponentKind::ForEachLoop(spec) => LoopProgress::Items {
                items: processor.get_value(&spec.source).await?,
                next: 0,
            },
            ComponentKind::WhileLoop(_) => LoopProgress::Condition { skip_check: false },
            ComponentKind::DoWhileLoop(_) => LoopProgress::Condition { skip_check: true },
            _ => {
                return Err(FlowError::InvalidStructure(format!(
                    "component {id} is not a loop"
                )))
            }
        };
        debug!(component = %id, name = %node.name, ?progress, "entered loop");
        Ok(progress)
    }

    /// Whether another pass should run.
    pub(crate) async fn loop_condition(
        &self,
        id: &ComponentId,
        progress: &mut LoopProgress,
        iteration: u64,
    ) -> Result<bool, FlowError> {
        match progress {
            LoopProgress::Counter { next, end, step } => Ok(if *step > 0 {
                *next < *end
            } else {
                *next > *end
            }),
            LoopProgress::Items { items, next } => Ok(*next < items.len()),
            LoopProgress::Condition { skip_check } => {
                if *skip_check {
                    *skip_check = false;
                    return Ok(true);
                }
                let node = self.loop_node(id)?;
                let (ComponentKind::WhileLoop(spec) | ComponentKind::DoWhileLoop(spec)) =
                    &node.kind
                else {
                    return Err(FlowError::InvalidStructure(format!(
                        "component {id} has no loop condition"
                    )));
                };
                let info = node.info();
                Ok(self
                    .argument_processor()
                    .evaluate(&spec.condition, &info, &iteration)
                    .await?)
            }
        }
    }

    /// Write the loop index or current item before a pass.
    pub(crate) async fn publish_item(
        &self,
        id: &ComponentId,
        progress: &LoopProgress,
    ) -> Result<(), FlowError> {
        let node = self.loop_node(id)?;
        let processor = self.argument_processor();
        match (&node.kind, progress) {
            (ComponentKind::ForLoop(spec), LoopProgress::Counter { next, .. }) => {
                if let Some(index) = &spec.index {
                    processor.set_value(index, next).await?;
                }
            }
            (ComponentKind::ForEachLoop(spec), LoopProgress::Items { items, next }) => {
                if !spec.current.is_configured() {
                    debug!(component = %id, "for-each current item is not bound");
                    return Ok(());
                }
                if let Some(item) = items.get(*next) {
                    processor.set_value(&spec.current, item).await?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Record a finished pass and clear the body's transient state.
    pub(crate) fn complete_pass(&self, id: &ComponentId, iteration: u64) -> Result<(), FlowError> {
        self.write(|tree| {
            tree.node_mut(id)?.run_state.iteration = iteration;
            Ok::<_, FlowError>(())
        })?;
        debug!(component = %id, iteration, "loop pass complete");
        self.reset_descendants(id)
    }
}

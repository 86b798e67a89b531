//! Traversal cursor
//!
//! The cursor is an explicit stack machine. Each call to [`ProcessCursor::next`]
//! advances until it reaches the next component the driver must process, or
//! the stack drains. The driver executes every yielded component before it
//! pulls again, so breaks and data-model writes made by one step are visible
//! to the next condition check.

use autoflow_core_types::ComponentId;
use tracing::{debug, trace};

use crate::errors::FlowError;
use crate::loops::LoopProgress;
use crate::manager::EntityManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopPhase {
    Evaluating,
    Running,
}

#[derive(Debug)]
struct LoopFrame {
    id: ComponentId,
    phase: LoopPhase,
    progress: LoopProgress,
    max_iterations: Option<u64>,
    iteration: u64,
}

#[derive(Debug)]
enum Frame {
    /// Snapshot of an entity's children taken when it was entered
    Sequence { children: Vec<ComponentId>, next: usize },
    Loop(LoopFrame),
}

enum Step {
    Enter(ComponentId),
    Push(Vec<ComponentId>),
    Pop,
    Stay,
}

/// What entering a component amounts to.
enum Entry {
    Skip,
    Yield,
    Loop(Option<u64>),
    Container {
        children: Vec<ComponentId>,
        processable: bool,
    },
}

/// Lazy walk over one entity of a process tree.
#[derive(Debug)]
pub struct ProcessCursor {
    stack: Vec<Frame>,
    yielded: u64,
}

impl ProcessCursor {
    pub(crate) fn new(entity: ComponentId) -> Self {
        Self {
            stack: vec![Frame::Sequence {
                children: vec![entity],
                next: 0,
            }],
            yielded: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.stack.is_empty()
    }

    /// Nesting depth of the current position.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Components yielded so far.
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    /// Next component to process, or `None` once the walk is complete.
    pub async fn next(&mut self, manager: &EntityManager) -> Result<Option<ComponentId>, FlowError> {
        loop {
            let step = match self.stack.last_mut() {
                None => return Ok(None),
                Some(Frame::Sequence { children, next }) => match children.get(*next) {
                    Some(child) => {
                        let child = child.clone();
                        *next += 1;
                        Step::Enter(child)
                    }
                    None => Step::Pop,
                },
                Some(Frame::Loop(frame)) => step_loop(manager, frame).await?,
            };

            match step {
                Step::Enter(child) => {
                    if let Some(id) = self.enter(manager, child).await? {
                        self.yielded += 1;
                        trace!(component = %id, depth = self.stack.len(), "yield");
                        return Ok(Some(id));
                    }
                }
                Step::Push(children) => self.stack.push(Frame::Sequence { children, next: 0 }),
                Step::Pop => {
                    self.stack.pop();
                }
                Step::Stay => {}
            }
        }
    }

    async fn enter(
        &mut self,
        manager: &EntityManager,
        id: ComponentId,
    ) -> Result<Option<ComponentId>, FlowError> {
        let entry = manager.read(|tree| match tree.get(&id) {
            None => Entry::Skip,
            Some(node) if !node.enabled => Entry::Skip,
            Some(node) if !node.kind.is_entity() => Entry::Yield,
            Some(node) if node.is_loop() => Entry::Loop(node.kind.max_iterations()),
            Some(node) => Entry::Container {
                children: node.children().to_vec(),
                processable: node.is_processable(),
            },
        });

        match entry {
            Entry::Skip => {
                debug!(component = %id, "skipping missing or disabled component");
                Ok(None)
            }
            Entry::Yield => Ok(Some(id)),
            Entry::Loop(max_iterations) => {
                manager.reset_component(&id)?;
                let progress = manager.begin_loop(&id).await?;
                self.stack.push(Frame::Loop(LoopFrame {
                    id,
                    phase: LoopPhase::Evaluating,
                    progress,
                    max_iterations,
                    iteration: 0,
                }));
                Ok(None)
            }
            Entry::Container {
                children,
                processable,
            } => {
                self.stack.push(Frame::Sequence { children, next: 0 });
                Ok(processable.then_some(id))
            }
        }
    }
}

async fn step_loop(manager: &EntityManager, frame: &mut LoopFrame) -> Result<Step, FlowError> {
    match frame.phase {
        LoopPhase::Evaluating => {
            if manager.run_state(&frame.id)?.exit_criteria_satisfied {
                debug!(component = %frame.id, iteration = frame.iteration, "loop exited by break");
                return Ok(Step::Pop);
            }
            if !manager
                .loop_condition(&frame.id, &mut frame.progress, frame.iteration)
                .await?
            {
                manager.mark_exit(&frame.id)?;
                debug!(component = %frame.id, iteration = frame.iteration, "loop condition failed");
                return Ok(Step::Pop);
            }
            if let Some(max_iterations) = frame.max_iterations {
                if frame.iteration >= max_iterations {
                    return Err(FlowError::LoopExceeded {
                        loop_id: frame.id.clone(),
                        max_iterations,
                    });
                }
            }
            manager.publish_item(&frame.id, &frame.progress).await?;
            frame.phase = LoopPhase::Running;
            let body = manager.read(|tree| tree.children(&frame.id).to_vec());
            Ok(Step::Push(body))
        }
        LoopPhase::Running => {
            frame.iteration += 1;
            frame.progress.advance();
            manager.complete_pass(&frame.id, frame.iteration)?;
            frame.phase = LoopPhase::Evaluating;
            Ok(Step::Stay)
        }
    }
}

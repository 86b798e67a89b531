//! Reference driver: pulls components from the cursor and runs their actors

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use action_flow::{ActorSpec, EntityManager};
use autoflow_core_types::{ComponentId, RunId};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::actor::{ActorContext, ActorRegistry};
use crate::errors::ActionError;
use crate::strategies::{DefaultFailureHandler, FailureDecision, FailureHandler};
use crate::types::{FailureStrategy, RunReport, RunStatus, StepFailure, StepReport};

/// Drives a process to completion.
///
/// Each yielded component is executed fully, retries included, before the
/// cursor is asked for the next one.
pub struct ProcessRunner {
    manager: Arc<EntityManager>,
    registry: Arc<ActorRegistry>,
    handler: Arc<dyn FailureHandler>,
    default_strategy: FailureStrategy,
    strategies: HashMap<String, FailureStrategy>,
    validate_first: bool,
}

impl ProcessRunner {
    pub fn new(manager: Arc<EntityManager>, registry: Arc<ActorRegistry>) -> Self {
        Self {
            manager,
            registry,
            handler: Arc::new(DefaultFailureHandler::new()),
            default_strategy: FailureStrategy::Abort,
            strategies: HashMap::new(),
            validate_first: true,
        }
    }

    pub fn with_failure_handler(mut self, handler: Arc<dyn FailureHandler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn with_default_strategy(mut self, strategy: FailureStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// Override the strategy for one actor type.
    pub fn with_strategy_for(mut self, actor_type: impl Into<String>, strategy: FailureStrategy) -> Self {
        self.strategies.insert(actor_type.into(), strategy);
        self
    }

    /// Skip the validation pass before each run.
    pub fn without_validation(mut self) -> Self {
        self.validate_first = false;
        self
    }

    pub fn manager(&self) -> &Arc<EntityManager> {
        &self.manager
    }

    /// Run the whole process.
    pub async fn run(&self) -> Result<RunReport, ActionError> {
        let root = self.manager.root();
        self.run_from(&root).await
    }

    /// Run `entity` and everything below it.
    ///
    /// Only a failed validation is returned as an error; failures during the
    /// run end up in the report.
    pub async fn run_from(&self, entity: &ComponentId) -> Result<RunReport, ActionError> {
        if self.validate_first {
            self.manager
                .ensure_valid()
                .map_err(|err| ActionError::NotRunnable(err.to_string()))?;
        }
        self.manager.reset_run()?;

        let run_id = RunId::new();
        let started_at = Utc::now();
        info!(run = %run_id, entity = %entity, "run started");

        let mut steps = Vec::new();
        let mut failure = None;
        match self.manager.traverse(entity) {
            Ok(mut cursor) => loop {
                let id = match cursor.next(&self.manager).await {
                    Ok(Some(id)) => id,
                    Ok(None) => break,
                    Err(err) => {
                        let err = ActionError::from(err);
                        warn!(run = %run_id, "traversal failed: {}", err);
                        failure = Some(step_failure(&err, err.to_string()));
                        break;
                    }
                };
                let (step, abort) = self.execute_step(&id).await;
                steps.push(step);
                if abort.is_some() {
                    failure = abort;
                    break;
                }
            },
            Err(err) => {
                let err = ActionError::from(err);
                failure = Some(step_failure(&err, err.to_string()));
            }
        }

        let status = if failure.is_some() {
            RunStatus::Aborted
        } else {
            RunStatus::Completed
        };
        let report = RunReport {
            run_id,
            status,
            started_at,
            finished_at: Utc::now(),
            steps,
            error: failure,
        };
        info!(
            run = %report.run_id,
            status = ?report.status,
            steps = report.steps.len(),
            failed = report.failed_steps().count(),
            latency_ms = report.latency_ms(),
            "run finished"
        );
        Ok(report)
    }

    async fn execute_step(&self, id: &ComponentId) -> (StepReport, Option<StepFailure>) {
        let started_at = Utc::now();
        let clock = Instant::now();
        let (name, spec) = match self.manager.node(id) {
            Ok(node) => (node.name.clone(), node.kind.action().cloned()),
            Err(_) => (String::new(), None),
        };
        let actor_type = spec
            .as_ref()
            .map(|spec| spec.actor_type.clone())
            .unwrap_or_default();
        let strategy = self
            .strategies
            .get(&actor_type)
            .copied()
            .unwrap_or(self.default_strategy);

        let mut attempt = 1;
        let (result, abort) = loop {
            debug!(component = %id, actor = %actor_type, attempt, "executing");
            match self.execute_once(id, spec.as_ref()).await {
                Ok(output) => break (Ok(output), None),
                Err(err) => {
                    match self
                        .handler
                        .handle_failure(id.as_str(), strategy, &err, attempt)
                        .await
                    {
                        FailureDecision::Retry { attempt: next, .. } => attempt = next,
                        FailureDecision::Continue(_) => break (Err(step_failure(&err, err.to_string())), None),
                        FailureDecision::Abort(reason) => {
                            let abort = step_failure(&err, reason);
                            break (Err(step_failure(&err, err.to_string())), Some(abort));
                        }
                    }
                }
            }
        };

        let (ok, output, error) = match result {
            Ok(output) => (true, output, None),
            Err(failure) => (false, None, Some(failure)),
        };
        let report = StepReport {
            component: id.clone(),
            name,
            actor_type,
            ok,
            attempts: attempt,
            started_at,
            finished_at: Utc::now(),
            latency_ms: clock.elapsed().as_millis() as u64,
            output,
            error,
        };
        (report, abort)
    }

    async fn execute_once(
        &self,
        id: &ComponentId,
        spec: Option<&ActorSpec>,
    ) -> Result<Option<Value>, ActionError> {
        let spec = spec.ok_or_else(|| ActionError::NotExecutable(id.clone()))?;
        let actor = self.registry.get(&spec.actor_type)?;
        let ctx = ActorContext::new(&self.manager, id, spec);
        actor.execute(&ctx).await
    }
}

fn step_failure(err: &ActionError, message: String) -> StepFailure {
    StepFailure {
        class: err.class(),
        message,
    }
}

//! Run reports and failure strategies

use autoflow_core_types::{ComponentId, ErrorClass, RunId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the runner does when an actor fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureStrategy {
    /// Stop the run
    #[default]
    Abort,
    /// Record the failure and move to the next component
    Continue,
    /// Run the actor again with exponential backoff
    Retry { max_attempts: u32, backoff_ms: u64 },
}

/// Outcome of one yielded component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub component: ComponentId,
    pub name: String,
    pub actor_type: String,
    pub ok: bool,
    pub attempts: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    pub class: ErrorClass,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every yielded component ran; some may have failed under `Continue`
    Completed,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub status: RunStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
    /// Reason the run stopped early
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepFailure>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Completed && self.steps.iter().all(|step| step.ok)
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|step| !step.ok)
    }

    pub fn latency_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

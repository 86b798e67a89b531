//! Failure handling strategies

use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::errors::ActionError;
use crate::types::FailureStrategy;

/// Decides what happens after an actor fails.
#[async_trait]
pub trait FailureHandler: Send + Sync {
    /// Handle step failure according to strategy
    async fn handle_failure(
        &self,
        step_id: &str,
        strategy: FailureStrategy,
        error: &ActionError,
        attempt: u32,
    ) -> FailureDecision;

    /// Check if retry should be attempted
    fn should_retry(&self, strategy: FailureStrategy, error: &ActionError, attempt: u32) -> bool;

    /// Calculate backoff duration for retry
    fn calculate_backoff(&self, strategy: FailureStrategy, attempt: u32) -> Duration;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureDecision {
    /// Stop the run
    Abort(String),

    /// Move to the next component
    Continue(String),

    /// Run the actor again
    Retry { attempt: u32, backoff_ms: u64 },
}

/// Exponential backoff capped at one minute.
#[derive(Debug, Default)]
pub struct DefaultFailureHandler;

impl DefaultFailureHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FailureHandler for DefaultFailureHandler {
    async fn handle_failure(
        &self,
        step_id: &str,
        strategy: FailureStrategy,
        error: &ActionError,
        attempt: u32,
    ) -> FailureDecision {
        match strategy {
            FailureStrategy::Abort => {
                warn!(step = step_id, class = %error.class(), "step failed, aborting run: {}", error);
                FailureDecision::Abort(error.to_string())
            }
            FailureStrategy::Continue => {
                warn!(step = step_id, class = %error.class(), "step failed, continuing: {}", error);
                FailureDecision::Continue(error.to_string())
            }
            FailureStrategy::Retry { max_attempts, .. } => {
                if !self.should_retry(strategy, error, attempt) {
                    warn!(
                        step = step_id,
                        attempt,
                        max_attempts,
                        retryable = error.is_retryable(),
                        "step failed, not retrying: {}",
                        error
                    );
                    return FailureDecision::Abort(format!(
                        "gave up after {attempt} attempt(s): {error}"
                    ));
                }
                let backoff = self.calculate_backoff(strategy, attempt);
                info!(
                    step = step_id,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "step failed, retrying"
                );
                sleep(backoff).await;
                FailureDecision::Retry {
                    attempt: attempt + 1,
                    backoff_ms: backoff.as_millis() as u64,
                }
            }
        }
    }

    fn should_retry(&self, strategy: FailureStrategy, error: &ActionError, attempt: u32) -> bool {
        match strategy {
            FailureStrategy::Retry { max_attempts, .. } => {
                attempt < max_attempts && error.is_retryable()
            }
            _ => false,
        }
    }

    fn calculate_backoff(&self, strategy: FailureStrategy, attempt: u32) -> Duration {
        match strategy {
            FailureStrategy::Retry { backoff_ms, .. } => {
                let multiplier = 2u64.saturating_pow(attempt.saturating_sub(1));
                Duration::from_millis(backoff_ms.saturating_mul(multiplier).min(60_000))
            }
            _ => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient_failure() -> ActionError {
        ActionError::Internal("backend hiccup".into())
    }

    #[test]
    fn retries_stop_at_max_attempts() {
        let handler = DefaultFailureHandler::new();
        let retry = FailureStrategy::Retry {
            max_attempts: 3,
            backoff_ms: 100,
        };
        let err = transient_failure();
        assert!(!handler.should_retry(FailureStrategy::Abort, &err, 0));
        assert!(!handler.should_retry(FailureStrategy::Continue, &err, 0));
        assert!(handler.should_retry(retry, &err, 1));
        assert!(handler.should_retry(retry, &err, 2));
        assert!(!handler.should_retry(retry, &err, 3));

        let config = ActionError::UnknownActor("click".into());
        assert!(!handler.should_retry(retry, &config, 1));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let handler = DefaultFailureHandler::new();
        let strategy = FailureStrategy::Retry {
            max_attempts: 5,
            backoff_ms: 1000,
        };
        assert_eq!(handler.calculate_backoff(strategy, 1).as_millis(), 1000);
        assert_eq!(handler.calculate_backoff(strategy, 3).as_millis(), 4000);
        assert_eq!(handler.calculate_backoff(strategy, 10).as_millis(), 60_000);
        assert_eq!(
            handler.calculate_backoff(FailureStrategy::Abort, 2),
            Duration::ZERO
        );
    }

    #[tokio::test]
    async fn continue_keeps_going() {
        let handler = DefaultFailureHandler::new();
        let decision = handler
            .handle_failure("s1", FailureStrategy::Continue, &transient_failure(), 1)
            .await;
        assert!(matches!(decision, FailureDecision::Continue(_)));
    }

    #[tokio::test]
    async fn retry_returns_next_attempt() {
        let handler = DefaultFailureHandler::new();
        let strategy = FailureStrategy::Retry {
            max_attempts: 2,
            backoff_ms: 1,
        };
        let first = handler
            .handle_failure("s1", strategy, &transient_failure(), 1)
            .await;
        assert_eq!(
            first,
            FailureDecision::Retry {
                attempt: 2,
                backoff_ms: 1
            }
        );
        let last = handler
            .handle_failure("s1", strategy, &transient_failure(), 2)
            .await;
        assert!(matches!(last, FailureDecision::Abort(_)));
    }
}

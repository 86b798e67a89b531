//! Error types for actors and the process runner

use action_flow::FlowError;
use action_locator::LocatorError;
use autoflow_arguments::ArgumentError;
use autoflow_core_types::{ComponentId, ErrorClass};
use autoflow_script_engine::ScriptError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// No actor registered under this type
    #[error("Unknown actor type: {0}")]
    UnknownActor(String),

    /// Yielded component carries no action
    #[error("Component {0} has nothing to execute")]
    NotExecutable(ComponentId),

    /// Actor needs an argument the component does not declare
    #[error("Actor '{actor}' requires argument '{argument}'")]
    MissingArgument { actor: String, argument: String },

    /// Argument resolved to a value the actor cannot use
    #[error("Argument '{argument}' is invalid: {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// Process failed validation before the run started
    #[error("Process is not runnable: {0}")]
    NotRunnable(String),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LocatorError> for ActionError {
    fn from(err: LocatorError) -> Self {
        ActionError::Flow(FlowError::Locator(err))
    }
}

impl ActionError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ActionError::UnknownActor(_)
            | ActionError::MissingArgument { .. }
            | ActionError::InvalidArgument { .. }
            | ActionError::NotRunnable(_) => ErrorClass::Configuration,
            ActionError::NotExecutable(_) => ErrorClass::Structural,
            ActionError::Flow(err) => err.class(),
            ActionError::Argument(err) => err.class(),
            ActionError::Script(err) => err.class(),
            ActionError::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Configuration and structure problems do not change between attempts.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self.class(),
            ErrorClass::Configuration | ErrorClass::Structural
        )
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self.class() {
            ErrorClass::Internal => 3,
            ErrorClass::Structural | ErrorClass::Configuration => 2,
            ErrorClass::Script | ErrorClass::Io => 1,
            ErrorClass::Lookup => 0,
        }
    }
}

//! Flow execution error types

use action_locator::LocatorError;
use autoflow_arguments::ArgumentError;
use autoflow_core_types::{ComponentId, ErrorClass};
use autoflow_project_store::StoreError;
use thiserror::Error;

/// Flow execution errors
#[derive(Debug, Error, Clone)]
pub enum FlowError {
    /// No component with this id in the tree
    #[error("Component not found: {0}")]
    ComponentNotFound(ComponentId),

    /// Invalid tree structure for the requested operation
    #[error("Invalid flow structure: {0}")]
    InvalidStructure(String),

    /// Break requested outside of any loop
    #[error("Component {0} is not inside a loop")]
    NoLoopAncestor(ComponentId),

    /// Loop exceeded maximum iterations
    #[error("Loop {loop_id} exceeded maximum iterations: {max_iterations}")]
    LoopExceeded {
        loop_id: ComponentId,
        max_iterations: u64,
    },

    /// Loop parameters are unusable
    #[error("Loop {loop_id} is misconfigured: {reason}")]
    InvalidLoop { loop_id: ComponentId, reason: String },

    /// Control operation on a component that is not a control entity
    #[error("Component {0} is not a control entity")]
    NotAControl(ComponentId),

    /// Flow validation failed
    #[error("Flow validation failed: {0}")]
    ValidationFailed(String),

    /// No service registered for the requested type and key
    #[error("Service not registered: {0}")]
    ServiceNotFound(String),

    /// Process document could not be read or written
    #[error("Invalid process document: {0}")]
    Document(String),

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FlowError {
    pub fn class(&self) -> ErrorClass {
        match self {
            FlowError::ComponentNotFound(_)
            | FlowError::InvalidStructure(_)
            | FlowError::NoLoopAncestor(_) => ErrorClass::Structural,
            FlowError::LoopExceeded { .. }
            | FlowError::InvalidLoop { .. }
            | FlowError::NotAControl(_)
            | FlowError::ValidationFailed(_)
            | FlowError::Document(_) => ErrorClass::Configuration,
            FlowError::ServiceNotFound(_) => ErrorClass::Internal,
            FlowError::Argument(err) => err.class(),
            FlowError::Locator(err) => err.class(),
            FlowError::Store(err) => err.class(),
        }
    }
}

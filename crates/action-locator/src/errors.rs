//! Error types for control lookup

use autoflow_arguments::ArgumentError;
use autoflow_core_types::ErrorClass;
use autoflow_project_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// No candidate within the retry budget
    #[error("Control '{control_type}' not found after {attempts} attempt(s)")]
    ControlNotFound { control_type: String, attempts: u32 },

    /// Index filter beyond the candidate list
    #[error("Control index {index} out of range ({count} candidate(s))")]
    IndexOutOfRange { index: usize, count: usize },

    /// Predicate filter rejected every candidate
    #[error("No control matched the filter among {count} candidate(s)")]
    NoFilterMatch { count: usize },

    /// Application has no root known to the provider
    #[error("Application not found: {0}")]
    ApplicationNotFound(String),

    /// Lookup spec is incomplete or contradictory
    #[error("Invalid control lookup configuration: {0}")]
    InvalidConfiguration(String),

    /// Backend failure while enumerating controls
    #[error("Control provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

impl LocatorError {
    /// Check if error is retryable within the lookup budget
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LocatorError::Provider(_) | LocatorError::ApplicationNotFound(_)
        )
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::Provider(_) => 2,
            LocatorError::ControlNotFound { .. }
            | LocatorError::IndexOutOfRange { .. }
            | LocatorError::NoFilterMatch { .. } => 1,
            _ => 0,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            LocatorError::ControlNotFound { .. }
            | LocatorError::IndexOutOfRange { .. }
            | LocatorError::NoFilterMatch { .. }
            | LocatorError::ApplicationNotFound(_)
            | LocatorError::Provider(_) => ErrorClass::Lookup,
            LocatorError::InvalidConfiguration(_) => ErrorClass::Configuration,
            LocatorError::Store(err) => err.class(),
            LocatorError::Argument(err) => err.class(),
        }
    }
}

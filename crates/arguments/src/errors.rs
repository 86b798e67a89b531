//! Argument resolution error types

use autoflow_core_types::{ErrorClass, ValueType};
use autoflow_script_engine::ScriptError;
use thiserror::Error;

use crate::argument::{ArgumentDirection, ArgumentMode};

#[derive(Debug, Error, Clone)]
pub enum ArgumentError {
    /// Argument resolved while its mode is missing required data
    #[error("Argument is not configured for {mode} mode: {detail}")]
    NotConfigured { mode: ArgumentMode, detail: String },

    /// Mode not legal for the argument direction
    #[error("{mode} mode is not allowed for {direction} arguments")]
    InvalidMode {
        direction: ArgumentDirection,
        mode: ArgumentMode,
    },

    /// Operation requires a different direction
    #[error("Expected an {expected} argument, found {actual}")]
    DirectionMismatch {
        expected: ArgumentDirection,
        actual: ArgumentDirection,
    },

    /// Mode change attempted on an argument whose mode is fixed
    #[error("Argument mode cannot be changed")]
    ModeLocked,

    /// Type change attempted on an argument whose type is fixed
    #[error("Argument type cannot be changed")]
    TypeLocked,

    /// Property path does not resolve on the data model
    #[error("Property path '{path}' not found: {reason}")]
    PropertyNotFound { path: String, reason: String },

    /// Final property segment cannot be assigned
    #[error("Property path '{path}' is not assignable: {reason}")]
    NotAssignable { path: String, reason: String },

    /// Resolved value does not fit the argument type
    #[error("Value does not match {expected}: {detail}")]
    TypeMismatch { expected: ValueType, detail: String },

    /// Script compilation or execution failed
    #[error(transparent)]
    Script(#[from] ScriptError),
}

impl ArgumentError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ArgumentError::Script(err) => err.class(),
            _ => ErrorClass::Configuration,
        }
    }

    pub(crate) fn not_configured(mode: ArgumentMode, detail: impl Into<String>) -> Self {
        ArgumentError::NotConfigured {
            mode,
            detail: detail.into(),
        }
    }
}

//! Script engine error types

use autoflow_core_types::ErrorClass;
use autoflow_project_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ScriptError {
    /// Source failed to parse
    #[error("Script compilation failed for {source_name}: {message}")]
    Compilation {
        source_name: String,
        message: String,
    },

    /// Runtime error raised while evaluating a script
    #[error("Script execution failed for {source_name}: {message}")]
    Execution {
        source_name: String,
        message: String,
    },

    /// Delegate invoked with the wrong number of arguments
    #[error("Delegate {shape} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        shape: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Value crossing the script boundary could not be converted
    #[error("Script value conversion failed: {0}")]
    Conversion(String),

    /// Script file could not be read
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ScriptError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ScriptError::Store(err) => err.class(),
            _ => ErrorClass::Script,
        }
    }
}

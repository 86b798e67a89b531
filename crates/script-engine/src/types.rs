//! Script results and compiled delegates

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ScriptError;

/// Outcome of running a script: its final expression and the globals after
/// the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptResult {
    pub return_value: Value,
    pub current_state: Value,
}

/// Calling convention of a compiled delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DelegateShape {
    /// `() -> T`, used to read input arguments
    Getter,
    /// `(value: T) -> ()`, used to write output arguments
    Setter,
    /// `(component, value: T) -> bool`
    Predicate,
}

impl DelegateShape {
    pub fn name(&self) -> &'static str {
        match self {
            DelegateShape::Getter => "getter",
            DelegateShape::Setter => "setter",
            DelegateShape::Predicate => "predicate",
        }
    }

    /// Names the arguments are bound to inside the script.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            DelegateShape::Getter => &[],
            DelegateShape::Setter => &["value"],
            DelegateShape::Predicate => &["component", "value"],
        }
    }
}

pub type DelegateFn = dyn Fn(Value, Vec<Value>) -> Result<ScriptResult, ScriptError> + Send + Sync;

/// Compiled script bound to a calling convention.
#[derive(Clone)]
pub struct ScriptDelegate {
    shape: DelegateShape,
    source: PathBuf,
    func: Arc<DelegateFn>,
}

impl ScriptDelegate {
    pub fn new(shape: DelegateShape, source: impl Into<PathBuf>, func: Arc<DelegateFn>) -> Self {
        Self {
            shape,
            source: source.into(),
            func,
        }
    }

    pub fn shape(&self) -> DelegateShape {
        self.shape
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Invoke against `globals`; `args` bind positionally to
    /// [`DelegateShape::parameter_names`].
    pub fn invoke(&self, globals: Value, args: Vec<Value>) -> Result<ScriptResult, ScriptError> {
        let expected = self.shape.parameter_names().len();
        if args.len() != expected {
            return Err(ScriptError::ArityMismatch {
                shape: self.shape.name(),
                expected,
                actual: args.len(),
            });
        }
        (self.func)(globals, args)
    }

    /// Invoke a predicate delegate and require a boolean result.
    pub fn invoke_predicate(
        &self,
        globals: Value,
        component: Value,
        value: Value,
    ) -> Result<(bool, Value), ScriptError> {
        let result = self.invoke(globals, vec![component, value])?;
        match result.return_value {
            Value::Bool(flag) => Ok((flag, result.current_state)),
            other => Err(ScriptError::Execution {
                source_name: self.source.display().to_string(),
                message: format!("predicate returned {other} instead of a boolean"),
            }),
        }
    }
}

impl fmt::Debug for ScriptDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptDelegate")
            .field("shape", &self.shape)
            .field("source", &self.source)
            .finish()
    }
}

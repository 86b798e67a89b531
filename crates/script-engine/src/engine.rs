use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ScriptError;
use crate::types::{DelegateShape, ScriptDelegate, ScriptResult};

/// Compiles and executes scripts against a globals object.
///
/// Relative paths are resolved against the scripts directory of the active
/// file system.
#[async_trait]
pub trait ScriptEngine: Send + Sync {
    /// Run a code snippet.
    async fn execute_script(&self, code: &str, globals: Value) -> Result<ScriptResult, ScriptError>;

    /// Run a script file.
    async fn execute_file(&self, path: &Path, globals: Value) -> Result<ScriptResult, ScriptError>;

    /// Compile a script file into a delegate of the requested shape.
    async fn create_delegate(
        &self,
        path: &Path,
        shape: DelegateShape,
    ) -> Result<ScriptDelegate, ScriptError>;

    /// Drop the compiled form of one file.
    fn invalidate(&self, path: &Path);

    /// Drop every compiled file.
    fn clear_cache(&self);
}

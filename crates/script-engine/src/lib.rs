//! Script engine for automation processes
//!
//! The runtime never parses scripts itself. It asks a [`ScriptEngine`] to
//! run code against a globals object (the process data model) or to turn a
//! script file into a [`ScriptDelegate`] of a known shape. The bundled
//! [`RhaiScriptEngine`] caches compiled files and recompiles only when the
//! file content changes.

pub mod engine;
pub mod errors;
mod rhai_engine;
pub mod types;

pub use engine::ScriptEngine;
pub use errors::ScriptError;
pub use rhai_engine::{RhaiScriptEngine, ScriptEngineConfig};
pub use types::{DelegateShape, ScriptDelegate, ScriptResult};

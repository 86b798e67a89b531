use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use autoflow_project_store::{fingerprint, DirectoryKind, FileSystem};
use dashmap::DashMap;
use rhai::{Dynamic, Engine, Scope, AST};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::engine::ScriptEngine;
use crate::errors::ScriptError;
use crate::types::{DelegateShape, ScriptDelegate, ScriptResult};

/// Limits applied to every evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptEngineConfig {
    /// Upper bound on operations per evaluation (0 = unlimited)
    pub max_operations: u64,

    /// Maximum nesting depth of expressions
    pub max_expr_depth: usize,
}

impl Default for ScriptEngineConfig {
    fn default() -> Self {
        Self {
            max_operations: 1_000_000,
            max_expr_depth: 64,
        }
    }
}

struct CompiledScript {
    fingerprint: String,
    ast: Arc<AST>,
}

/// Rhai-backed engine.
///
/// Top-level members of the globals object are exposed to scripts as
/// variables and read back after evaluation, so assignments made by a script
/// show up in [`ScriptResult::current_state`].
pub struct RhaiScriptEngine {
    engine: Arc<Engine>,
    fs: Arc<dyn FileSystem>,
    cache: DashMap<PathBuf, CompiledScript>,
    compilations: AtomicU64,
}

impl RhaiScriptEngine {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self::with_config(fs, ScriptEngineConfig::default())
    }

    pub fn with_config(fs: Arc<dyn FileSystem>, config: ScriptEngineConfig) -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(config.max_operations);
        engine.set_max_expr_depths(config.max_expr_depth, config.max_expr_depth);
        engine.on_print(|text| info!(target: "script", "{}", text));
        engine.on_debug(|text, source, pos| {
            debug!(target: "script", source = source.unwrap_or("<inline>"), %pos, "{}", text)
        });
        Self {
            engine: Arc::new(engine),
            fs,
            cache: DashMap::new(),
            compilations: AtomicU64::new(0),
        }
    }

    /// Number of compilations performed since construction.
    pub fn compiled_count(&self) -> u64 {
        self.compilations.load(Ordering::Relaxed)
    }

    pub fn cached_files(&self) -> usize {
        self.cache.len()
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        self.fs.resolve(DirectoryKind::Scripts, path)
    }

    fn compile_file(&self, path: &Path) -> Result<Arc<AST>, ScriptError> {
        let resolved = self.resolve_path(path);
        let source = self.fs.read_to_string(&resolved)?;
        let print = fingerprint(source.as_bytes());

        if let Some(entry) = self.cache.get(&resolved) {
            if entry.fingerprint == print {
                return Ok(Arc::clone(&entry.ast));
            }
            debug!(path = %resolved.display(), "script changed on disk, recompiling");
        }

        let ast = Arc::new(compile(&self.engine, &source, &resolved.display().to_string())?);
        self.compilations.fetch_add(1, Ordering::Relaxed);
        self.cache.insert(
            resolved.clone(),
            CompiledScript {
                fingerprint: print,
                ast: Arc::clone(&ast),
            },
        );
        debug!(path = %resolved.display(), "compiled script");
        Ok(ast)
    }
}

#[async_trait]
impl ScriptEngine for RhaiScriptEngine {
    async fn execute_script(&self, code: &str, globals: Value) -> Result<ScriptResult, ScriptError> {
        let ast = compile(&self.engine, code, "<inline>")?;
        evaluate(&self.engine, &ast, "<inline>", globals, &[])
    }

    async fn execute_file(&self, path: &Path, globals: Value) -> Result<ScriptResult, ScriptError> {
        let ast = self.compile_file(path)?;
        evaluate(
            &self.engine,
            &ast,
            &path.display().to_string(),
            globals,
            &[],
        )
    }

    async fn create_delegate(
        &self,
        path: &Path,
        shape: DelegateShape,
    ) -> Result<ScriptDelegate, ScriptError> {
        let ast = self.compile_file(path)?;
        let engine = Arc::clone(&self.engine);
        let source_name = path.display().to_string();
        let func = move |globals: Value, args: Vec<Value>| {
            let bindings: Vec<(&str, Value)> = shape
                .parameter_names()
                .iter()
                .copied()
                .zip(args)
                .collect();
            evaluate(&engine, &ast, &source_name, globals, &bindings)
        };
        Ok(ScriptDelegate::new(shape, path, Arc::new(func)))
    }

    fn invalidate(&self, path: &Path) {
        self.cache.remove(&self.resolve_path(path));
    }

    fn clear_cache(&self) {
        self.cache.clear();
    }
}

fn compile(engine: &Engine, source: &str, source_name: &str) -> Result<AST, ScriptError> {
    engine
        .compile(source)
        .map_err(|err| ScriptError::Compilation {
            source_name: source_name.to_string(),
            message: err.to_string(),
        })
}

fn evaluate(
    engine: &Engine,
    ast: &AST,
    source_name: &str,
    globals: Value,
    bindings: &[(&str, Value)],
) -> Result<ScriptResult, ScriptError> {
    let mut scope = Scope::new();
    let global_names = push_globals(&mut scope, &globals)?;
    for (name, value) in bindings {
        scope.push_dynamic(name.to_string(), to_dynamic(value)?);
    }

    let result: Dynamic = engine
        .eval_ast_with_scope(&mut scope, ast)
        .map_err(|err| ScriptError::Execution {
            source_name: source_name.to_string(),
            message: err.to_string(),
        })?;

    // Globals are read back by position: delegate parameters pushed after
    // them may share a name and must not leak into the data model.
    let current_state = match globals {
        Value::Object(mut map) => {
            let updated: Vec<Dynamic> = scope
                .iter_raw()
                .take(global_names.len())
                .map(|(_, _, value)| value.clone())
                .collect();
            for (name, value) in global_names.into_iter().zip(updated) {
                map.insert(name, from_dynamic(&value)?);
            }
            Value::Object(map)
        }
        other => other,
    };

    Ok(ScriptResult {
        return_value: from_dynamic(&result)?,
        current_state,
    })
}

fn push_globals(scope: &mut Scope, globals: &Value) -> Result<Vec<String>, ScriptError> {
    let Value::Object(map) = globals else {
        return Ok(Vec::new());
    };
    let mut names = Vec::with_capacity(map.len());
    for (name, value) in map {
        scope.push_dynamic(name.clone(), to_dynamic(value)?);
        names.push(name.clone());
    }
    Ok(names)
}

fn to_dynamic(value: &Value) -> Result<Dynamic, ScriptError> {
    rhai::serde::to_dynamic(value).map_err(|err| ScriptError::Conversion(err.to_string()))
}

fn from_dynamic(value: &Dynamic) -> Result<Value, ScriptError> {
    if value.is_unit() {
        return Ok(Value::Null);
    }
    rhai::serde::from_dynamic::<Value>(value).map_err(|err| ScriptError::Conversion(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoflow_project_store::InMemoryFileSystem;
    use serde_json::json;

    fn engine_with(files: &[(&str, &str)]) -> (Arc<InMemoryFileSystem>, RhaiScriptEngine) {
        let fs = Arc::new(InMemoryFileSystem::new("/work"));
        for (name, body) in files {
            fs.insert(PathBuf::from("/work/scripts").join(name), *body);
        }
        let engine = RhaiScriptEngine::new(fs.clone());
        (fs, engine)
    }

    #[test]
    fn inline_script_sees_and_updates_globals() {
        let (_, engine) = engine_with(&[]);
        let result = tokio_test::block_on(
            engine.execute_script("counter += 1; counter * 10", json!({"counter": 4})),
        )
        .unwrap();
        assert_eq!(result.return_value, json!(50));
        assert_eq!(result.current_state, json!({"counter": 5}));
    }

    #[test]
    fn compile_errors_are_reported() {
        let (_, engine) = engine_with(&[]);
        let err = tokio_test::block_on(engine.execute_script("let = ;", json!({}))).unwrap_err();
        assert!(matches!(err, ScriptError::Compilation { .. }));
    }

    #[test]
    fn unit_result_maps_to_null() {
        let (_, engine) = engine_with(&[]);
        let result =
            tokio_test::block_on(engine.execute_script("let x = 1;", json!({}))).unwrap();
        assert_eq!(result.return_value, Value::Null);
    }
}

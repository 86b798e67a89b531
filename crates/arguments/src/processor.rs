use std::path::Path;
use std::sync::Arc;

use autoflow_core_types::ValueType;
use autoflow_script_engine::{DelegateShape, ScriptEngine};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::argument::{Argument, ArgumentDirection, ArgumentMode, Binding};
use crate::errors::ArgumentError;
use crate::path;
use crate::typed::{ArgumentValue, InArgument, OutArgument, PredicateArgument};

/// Shared process data model.
///
/// Scripts receive a snapshot as their globals and the model is replaced by
/// the state they leave behind.
#[derive(Clone, Default)]
pub struct DataModel {
    inner: Arc<RwLock<Value>>,
}

impl DataModel {
    pub fn new(value: Value) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    pub fn snapshot(&self) -> Value {
        self.inner.read().clone()
    }

    pub fn replace(&self, value: Value) {
        *self.inner.write() = value;
    }

    pub fn get(&self, property_path: &str) -> Result<Value, ArgumentError> {
        let model = self.inner.read();
        path::get(&model, property_path).cloned()
    }

    pub fn set(&self, property_path: &str, value: Value) -> Result<(), ArgumentError> {
        let mut model = self.inner.write();
        path::set(&mut model, property_path, value)
    }
}

impl std::fmt::Debug for DataModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DataModel").field(&*self.inner.read()).finish()
    }
}

/// Resolves arguments against the data model and script engine.
#[derive(Clone)]
pub struct ArgumentProcessor {
    data_model: DataModel,
    script_engine: Arc<dyn ScriptEngine>,
}

impl ArgumentProcessor {
    pub fn new(data_model: DataModel, script_engine: Arc<dyn ScriptEngine>) -> Self {
        Self {
            data_model,
            script_engine,
        }
    }

    pub fn data_model(&self) -> &DataModel {
        &self.data_model
    }

    pub fn script_engine(&self) -> &Arc<dyn ScriptEngine> {
        &self.script_engine
    }

    pub async fn get_value<T: ArgumentValue>(
        &self,
        argument: &InArgument<T>,
    ) -> Result<T, ArgumentError> {
        let inner = argument.argument();
        if let Binding::Default { value: None } = inner.binding() {
            return T::synthesize().ok_or_else(|| {
                ArgumentError::not_configured(ArgumentMode::Default, "no default value")
            });
        }
        T::from_json(self.resolve(inner).await?)
    }

    pub async fn set_value<T: ArgumentValue>(
        &self,
        argument: &OutArgument<T>,
        value: &T,
    ) -> Result<(), ArgumentError> {
        self.write(argument.argument(), value.to_json()?).await
    }

    /// Evaluate a predicate for `value` in the context of `component`.
    pub async fn evaluate<T: ArgumentValue, C: Serialize + ?Sized>(
        &self,
        argument: &PredicateArgument<T>,
        component: &C,
        value: &T,
    ) -> Result<bool, ArgumentError> {
        let component = serde_json::to_value(component).map_err(|err| {
            ArgumentError::TypeMismatch {
                expected: ValueType::Object,
                detail: err.to_string(),
            }
        })?;
        self.evaluate_predicate(argument.argument(), component, value.to_json()?)
            .await
    }

    /// Untyped read of an input argument.
    pub async fn resolve(&self, argument: &Argument) -> Result<Value, ArgumentError> {
        expect_direction(argument, ArgumentDirection::In)?;
        match argument.binding() {
            Binding::Default { value: Some(value) } => Ok(value.clone()),
            Binding::Default { value: None } => synthesize(argument.value_type()).ok_or_else(|| {
                ArgumentError::not_configured(ArgumentMode::Default, "no default value")
            }),
            Binding::DataBound { property_path } => {
                let property_path = required(property_path, ArgumentMode::DataBound)?;
                trace!(property_path, "reading bound argument");
                self.data_model.get(property_path)
            }
            Binding::Scripted { script_file } => {
                let script_file = required(script_file, ArgumentMode::Scripted)?;
                let delegate = self
                    .script_engine
                    .create_delegate(Path::new(script_file), DelegateShape::Getter)
                    .await?;
                let result = delegate.invoke(self.data_model.snapshot(), Vec::new())?;
                self.data_model.replace(result.current_state);
                debug!(script_file, "resolved scripted argument");
                Ok(result.return_value)
            }
        }
    }

    /// Untyped write of an output argument.
    pub async fn write(&self, argument: &Argument, value: Value) -> Result<(), ArgumentError> {
        expect_direction(argument, ArgumentDirection::Out)?;
        match argument.binding() {
            Binding::Default { .. } => Err(ArgumentError::InvalidMode {
                direction: ArgumentDirection::Out,
                mode: ArgumentMode::Default,
            }),
            Binding::DataBound { property_path } => {
                let property_path = required(property_path, ArgumentMode::DataBound)?;
                trace!(property_path, "writing bound argument");
                self.data_model.set(property_path, value)
            }
            Binding::Scripted { script_file } => {
                let script_file = required(script_file, ArgumentMode::Scripted)?;
                let delegate = self
                    .script_engine
                    .create_delegate(Path::new(script_file), DelegateShape::Setter)
                    .await?;
                let result = delegate.invoke(self.data_model.snapshot(), vec![value])?;
                self.data_model.replace(result.current_state);
                debug!(script_file, "wrote scripted argument");
                Ok(())
            }
        }
    }

    pub async fn evaluate_predicate(
        &self,
        argument: &Argument,
        component: Value,
        value: Value,
    ) -> Result<bool, ArgumentError> {
        expect_direction(argument, ArgumentDirection::Predicate)?;
        let Binding::Scripted { script_file } = argument.binding() else {
            return Err(ArgumentError::InvalidMode {
                direction: ArgumentDirection::Predicate,
                mode: argument.mode(),
            });
        };
        let script_file = required(script_file, ArgumentMode::Scripted)?;
        let delegate = self
            .script_engine
            .create_delegate(Path::new(script_file), DelegateShape::Predicate)
            .await?;
        let (flag, state) =
            delegate.invoke_predicate(self.data_model.snapshot(), component, value)?;
        self.data_model.replace(state);
        Ok(flag)
    }
}

fn expect_direction(argument: &Argument, expected: ArgumentDirection) -> Result<(), ArgumentError> {
    if argument.direction() == expected {
        Ok(())
    } else {
        Err(ArgumentError::DirectionMismatch {
            expected,
            actual: argument.direction(),
        })
    }
}

fn required(slot: &Option<String>, mode: ArgumentMode) -> Result<&str, ArgumentError> {
    match slot.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ArgumentError::not_configured(
            mode,
            match mode {
                ArgumentMode::DataBound => "no property path",
                _ => "no script file",
            },
        )),
    }
}

fn synthesize(value_type: ValueType) -> Option<Value> {
    match value_type {
        ValueType::Boolean => Some(Value::Bool(false)),
        ValueType::Integer => Some(Value::from(0)),
        ValueType::Float => Some(Value::from(0.0)),
        ValueType::String => Some(Value::String(String::new())),
        ValueType::List => Some(Value::Array(Vec::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use autoflow_script_engine::{ScriptDelegate, ScriptError, ScriptResult};
    use serde_json::json;

    /// Engine whose getter returns the `answer` global and bumps `reads`.
    struct CountingEngine;

    #[async_trait]
    impl ScriptEngine for CountingEngine {
        async fn execute_script(&self, _: &str, globals: Value) -> Result<ScriptResult, ScriptError> {
            Ok(ScriptResult {
                return_value: Value::Null,
                current_state: globals,
            })
        }

        async fn execute_file(&self, _: &Path, globals: Value) -> Result<ScriptResult, ScriptError> {
            self.execute_script("", globals).await
        }

        async fn create_delegate(
            &self,
            path: &Path,
            shape: DelegateShape,
        ) -> Result<ScriptDelegate, ScriptError> {
            Ok(ScriptDelegate::new(
                shape,
                path,
                Arc::new(|mut globals: Value, _args: Vec<Value>| -> Result<ScriptResult, ScriptError> {
                    let reads = globals["reads"].as_i64().unwrap_or(0);
                    globals["reads"] = json!(reads + 1);
                    Ok(ScriptResult {
                        return_value: globals["answer"].clone(),
                        current_state: globals,
                    })
                }),
            ))
        }

        fn invalidate(&self, _: &Path) {}

        fn clear_cache(&self) {}
    }

    fn processor(model: Value) -> ArgumentProcessor {
        ArgumentProcessor::new(DataModel::new(model), Arc::new(CountingEngine))
    }

    #[test]
    fn default_mode_synthesizes_value_types() {
        let processor = processor(json!({}));
        let count: i64 = tokio_test::block_on(processor.get_value(&InArgument::new())).unwrap();
        assert_eq!(count, 0);
        let text: String = tokio_test::block_on(processor.get_value(&InArgument::new())).unwrap();
        assert_eq!(text, "");
        let err = tokio_test::block_on(processor.get_value(&InArgument::<Value>::new())).unwrap_err();
        assert!(matches!(err, ArgumentError::NotConfigured { .. }));
    }

    #[test]
    fn unconfigured_bound_argument_fails() {
        let processor = processor(json!({}));
        let mut arg = InArgument::<String>::new();
        arg.argument_mut().set_mode(ArgumentMode::DataBound).unwrap();
        let err = tokio_test::block_on(processor.get_value(&arg)).unwrap_err();
        assert!(matches!(
            err,
            ArgumentError::NotConfigured {
                mode: ArgumentMode::DataBound,
                ..
            }
        ));
    }

    #[test]
    fn bound_arguments_read_and_write_the_model() {
        let processor = processor(json!({"order": {"id": "A7", "total": 0}}));
        let id: String =
            tokio_test::block_on(processor.get_value(&InArgument::bound_to("order.id"))).unwrap();
        assert_eq!(id, "A7");
        tokio_test::block_on(processor.set_value(&OutArgument::bound_to("order.total"), &42i64))
            .unwrap();
        assert_eq!(processor.data_model().snapshot()["order"]["total"], json!(42));
    }

    #[test]
    fn scripted_reads_replace_the_model() {
        let processor = processor(json!({"answer": 5, "reads": 0}));
        let arg = InArgument::<i64>::scripted("answer.rhai");
        let first = tokio_test::block_on(processor.get_value(&arg)).unwrap();
        let second = tokio_test::block_on(processor.get_value(&arg)).unwrap();
        assert_eq!((first, second), (5, 5));
        assert_eq!(processor.data_model().snapshot()["reads"], json!(2));
    }

    #[test]
    fn direction_is_checked_on_untyped_calls() {
        let processor = processor(json!({"x": 1}));
        let out = Argument::output(ValueType::Integer).bound_to("x");
        assert!(matches!(
            tokio_test::block_on(processor.resolve(&out)),
            Err(ArgumentError::DirectionMismatch { .. })
        ));
    }
}

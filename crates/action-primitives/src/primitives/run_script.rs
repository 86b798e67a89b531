use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::actor::{Actor, ActorContext};
use crate::errors::ActionError;

/// Runs `script_file` (or inline `code`) with the data model as globals.
///
/// The script's globals replace the data model; its return value goes to
/// `result` when that output is bound.
pub struct RunScriptActor;

#[async_trait]
impl Actor for RunScriptActor {
    fn actor_type(&self) -> &'static str {
        "run-script"
    }

    async fn execute(&self, ctx: &ActorContext<'_>) -> Result<Option<Value>, ActionError> {
        let engine = ctx.manager.script_engine();
        let data_model = ctx.manager.data_model();
        let result = if ctx.spec.argument("script_file").is_some() {
            let file = ctx.string_input("script_file").await?;
            debug!(component = %ctx.component, file = %file, "running script file");
            engine
                .execute_file(Path::new(&file), data_model.snapshot())
                .await?
        } else if ctx.spec.argument("code").is_some() {
            let code = ctx.string_input("code").await?;
            engine.execute_script(&code, data_model.snapshot()).await?
        } else {
            return Err(ActionError::MissingArgument {
                actor: self.actor_type().to_string(),
                argument: "script_file".into(),
            });
        };

        data_model.replace(result.current_state);
        ctx.output("result", result.return_value.clone()).await?;
        Ok(Some(result.return_value))
    }
}

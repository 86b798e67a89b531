use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::actor::{Actor, ActorContext};
use crate::errors::ActionError;

/// Reads `value` and writes it through `target`.
pub struct SetValueActor;

#[async_trait]
impl Actor for SetValueActor {
    fn actor_type(&self) -> &'static str {
        "set-value"
    }

    async fn execute(&self, ctx: &ActorContext<'_>) -> Result<Option<Value>, ActionError> {
        let value = ctx.input("value").await?;
        let target = ctx.argument("target")?;
        ctx.manager
            .argument_processor()
            .write(target, value.clone())
            .await?;
        debug!(component = %ctx.component, "value assigned");
        Ok(Some(value))
    }
}

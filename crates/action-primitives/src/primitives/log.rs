use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::actor::{Actor, ActorContext};
use crate::errors::ActionError;

/// Logs `message`, or the component name when no message is declared.
pub struct LogActor;

#[async_trait]
impl Actor for LogActor {
    fn actor_type(&self) -> &'static str {
        "log"
    }

    async fn execute(&self, ctx: &ActorContext<'_>) -> Result<Option<Value>, ActionError> {
        let message = match ctx.optional_input("message").await? {
            Some(Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => ctx.manager.node(ctx.component)?.name,
        };
        info!(component = %ctx.component, "{}", message);
        Ok(Some(Value::String(message)))
    }
}

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::actor::{Actor, ActorContext};
use crate::errors::ActionError;

/// Flags the nearest enclosing loop to exit after the current pass.
pub struct BreakLoopActor;

#[async_trait]
impl Actor for BreakLoopActor {
    fn actor_type(&self) -> &'static str {
        "break-loop"
    }

    async fn execute(&self, ctx: &ActorContext<'_>) -> Result<Option<Value>, ActionError> {
        let target = ctx.manager.break_loop(ctx.component)?;
        Ok(Some(json!({ "loop": target })))
    }
}

use action_flow::FlowError;
use async_trait::async_trait;
use autoflow_core_types::ComponentId;
use serde_json::Value;
use tracing::debug;

use crate::actor::{Actor, ActorContext};
use crate::errors::ActionError;

/// Control entity named by the `control` input, else the one enclosing the
/// actor.
async fn control_entity(ctx: &ActorContext<'_>) -> Result<ComponentId, ActionError> {
    match ctx.optional_input("control").await? {
        Some(Value::String(id)) => return Ok(ComponentId::from(id)),
        Some(other) => {
            return Err(ActionError::InvalidArgument {
                argument: "control".into(),
                reason: format!("expected a component id, found {other}"),
            })
        }
        None => {}
    }
    ctx.manager
        .control_entity_of(ctx.component)
        .ok_or_else(|| FlowError::NotAControl(ctx.component.clone()).into())
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ActionError> {
    serde_json::to_value(value).map_err(|err| ActionError::Internal(err.to_string()))
}

/// Resolves one control and writes it to `result`.
pub struct FindControlActor;

#[async_trait]
impl Actor for FindControlActor {
    fn actor_type(&self) -> &'static str {
        "find-control"
    }

    async fn execute(&self, ctx: &ActorContext<'_>) -> Result<Option<Value>, ActionError> {
        let entity = control_entity(ctx).await?;
        let handle = ctx.manager.get_control(&entity).await?;
        debug!(component = %ctx.component, control = %handle.handle_id, "found control");
        let value = to_value(&handle)?;
        ctx.output("result", value.clone()).await?;
        Ok(Some(value))
    }
}

/// Resolves every matching control and writes the list to `result`.
pub struct FindAllControlsActor;

#[async_trait]
impl Actor for FindAllControlsActor {
    fn actor_type(&self) -> &'static str {
        "find-all-controls"
    }

    async fn execute(&self, ctx: &ActorContext<'_>) -> Result<Option<Value>, ActionError> {
        let entity = control_entity(ctx).await?;
        let handles = ctx.manager.get_all_controls(&entity).await?;
        debug!(component = %ctx.component, count = handles.len(), "found controls");
        let value = to_value(&handles)?;
        ctx.output("result", value.clone()).await?;
        Ok(Some(value))
    }
}

use async_trait::async_trait;

use super::{Context, Decision, EventHandler, HandlerError};
use crate::github::{PingEvent, deserialize_payload};

/// Acknowledges the `ping` GitHub sends when the hook is created.
pub struct PingHandler;

#[async_trait]
impl EventHandler for PingHandler {
    async fn handle(&self, _ctx: &Context, payload: &str) -> Result<Decision, HandlerError> {
        let event: PingEvent = deserialize_payload(payload).map_err(HandlerError::Malformed)?;
        tracing::info!(
            "ping from hook {:?}: {}",
            event.hook_id,
            event.zen.as_deref().unwrap_or_default()
        );
        Ok(Decision::ignore("ping"))
    }
}

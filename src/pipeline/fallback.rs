//! Catch-all for private messages no other strategy claimed.

use async_trait::async_trait;
use tracing::info;

use crate::error::HandlerError;
use crate::pipeline::cancel::CancelSignal;
use crate::pipeline::strategy::Strategy;
use crate::pipeline::types::InboundMessageEvent;

/// Characters of raw content included in the log line.
const PREVIEW_CHARS: usize = 200;

/// Logs any P2P message and succeeds. Register it last.
#[derive(Debug, Default)]
pub struct DefaultStrategy;

#[async_trait]
impl Strategy for DefaultStrategy {
    fn name(&self) -> &str {
        "default"
    }

    fn should_handle(&self, event: &InboundMessageEvent) -> bool {
        event.is_p2p()
    }

    async fn handle(
        &self,
        event: &InboundMessageEvent,
        _cancel: &CancelSignal,
    ) -> Result<(), HandlerError> {
        info!(
            message_id = %event.message_id,
            sender_id = %event.sender_id,
            content_kind = %event.content_kind,
            content = %event.content_preview(PREVIEW_CHARS),
            "Received private message"
        );
        Ok(())
    }
}

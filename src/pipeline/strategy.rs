//! Strategy trait and the dispatcher that walks the registered chain.
//!
//! New message kinds are supported by registering another [`Strategy`];
//! the dispatcher itself never inspects message content.

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::error::{DispatchError, HandlerError};
use crate::pipeline::cancel::CancelSignal;
use crate::pipeline::types::InboundMessageEvent;

/// A predicate/handler pair for one recognized kind of event.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Name used in logs and dispatch outcomes.
    fn name(&self) -> &str;

    /// Whether this strategy claims the event. Must not fail or block.
    fn should_handle(&self, event: &InboundMessageEvent) -> bool;

    /// Process a claimed event.
    async fn handle(
        &self,
        event: &InboundMessageEvent,
        cancel: &CancelSignal,
    ) -> Result<(), HandlerError>;
}

/// What the dispatcher did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled { strategy: String },
    /// No strategy matched. Not an error.
    Unhandled,
}

/// Evaluates strategies in registration order and runs the first match.
///
/// Built once at startup; immutable and shareable across tasks afterwards.
pub struct Dispatcher {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder {
            strategies: Vec::new(),
        }
    }

    /// Registered strategy names, in evaluation order.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Dispatch one event. At most one handler runs; its failure is
    /// surfaced as-is, with no retry and no fallthrough.
    pub async fn dispatch(
        &self,
        event: &InboundMessageEvent,
        cancel: &CancelSignal,
    ) -> Result<DispatchOutcome, DispatchError> {
        info!(message_id = %event.message_id, "Processing received message");

        let Some(strategy) = self.strategies.iter().find(|s| s.should_handle(event)) else {
            warn!(
                message_id = %event.message_id,
                "No suitable strategy found for message"
            );
            return Ok(DispatchOutcome::Unhandled);
        };

        debug!(
            message_id = %event.message_id,
            strategy = strategy.name(),
            "Found matching strategy"
        );

        match strategy.handle(event, cancel).await {
            Ok(()) => {
                info!(
                    message_id = %event.message_id,
                    strategy = strategy.name(),
                    "Message handled successfully"
                );
                Ok(DispatchOutcome::Handled {
                    strategy: strategy.name().to_string(),
                })
            }
            Err(e) => {
                error!(
                    message_id = %event.message_id,
                    strategy = strategy.name(),
                    error = %e,
                    "Error handling message with strategy"
                );
                Err(DispatchError {
                    strategy: strategy.name().to_string(),
                    source: e,
                })
            }
        }
    }
}

/// Collects strategies in priority order.
pub struct DispatcherBuilder {
    strategies: Vec<Box<dyn Strategy>>,
}

impl DispatcherBuilder {
    /// Append a strategy; earlier registrations take precedence.
    pub fn register(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            strategies: self.strategies,
        }
    }
}

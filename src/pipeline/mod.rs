//! Inbound message pipeline.
//!
//! Every inbound chat event flows through:
//! 1. `Dispatcher::dispatch()`, which evaluates registered strategies in order
//! 2. the first matching `Strategy::handle()`, e.g. [`SubmissionStrategy`]
//!
//! Events are independent; each runs in its own task with its own
//! [`CancelSignal`].

pub mod cancel;
pub mod fallback;
pub mod strategy;
pub mod submission;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::{CancelHandle, CancelSignal};
pub use fallback::DefaultStrategy;
pub use strategy::{DispatchOutcome, Dispatcher, DispatcherBuilder, Strategy};
pub use submission::{DEFAULT_TRIGGER, SubmissionStrategy};
pub use types::{ChatKind, ContentKind, InboundMessageEvent};

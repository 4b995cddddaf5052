//! Submission strategy: persists a titled rich-text post sent to the bot in a
//! private chat and rebroadcasts it as a card to the configured group chats.
//!
//! Only decode, parse and persistence failures fail the event. Author lookup
//! and delivery problems are logged and worked around.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::cards::CardRenderer;
use crate::channels::gateway::{AuthorDirectory, MessagingGateway};
use crate::document::{ParsedSubmission, decode, parse_submission};
use crate::error::HandlerError;
use crate::pipeline::cancel::CancelSignal;
use crate::pipeline::strategy::Strategy;
use crate::pipeline::types::{ContentKind, InboundMessageEvent};
use crate::store::{NewSubmission, SubmissionRecord, SubmissionStore};

/// Declared post title that marks a message as a submission.
pub const DEFAULT_TRIGGER: &str = "投稿";

pub struct SubmissionStrategy {
    store: Arc<dyn SubmissionStore>,
    gateway: Arc<dyn MessagingGateway>,
    directory: Arc<dyn AuthorDirectory>,
    renderer: CardRenderer,
    trigger: String,
    destinations: Vec<String>,
}

impl SubmissionStrategy {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        gateway: Arc<dyn MessagingGateway>,
        directory: Arc<dyn AuthorDirectory>,
    ) -> Self {
        Self {
            store,
            gateway,
            directory,
            renderer: CardRenderer::random(),
            trigger: DEFAULT_TRIGGER.to_string(),
            destinations: Vec::new(),
        }
    }

    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = trigger.into();
        self
    }

    /// Group chats the card is broadcast to, in order.
    pub fn with_destinations(mut self, destinations: Vec<String>) -> Self {
        self.destinations = destinations;
        self
    }

    pub fn with_renderer(mut self, renderer: CardRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Best-effort text reply. Failures never reach the caller.
    async fn reply(&self, event: &InboundMessageEvent, text: &str, cancel: &CancelSignal) {
        match cancel
            .run(self.gateway.reply_text(&event.message_id, text))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(message_id = %event.message_id, error = %e, "Failed to send reply")
            }
            Err(_) => debug!(message_id = %event.message_id, "Reply abandoned on cancellation"),
        }
    }

    fn parse(&self, event: &InboundMessageEvent) -> Result<ParsedSubmission, HandlerError> {
        let doc = decode(&event.raw_content)?;
        Ok(parse_submission(&doc)?)
    }

    async fn resolve_author(
        &self,
        event: &InboundMessageEvent,
        cancel: &CancelSignal,
    ) -> Result<String, HandlerError> {
        match cancel.run(self.directory.lookup(&event.sender_id)).await? {
            Ok(name) if !name.trim().is_empty() => Ok(name),
            Ok(_) => {
                warn!(sender_id = %event.sender_id, "Author has an empty display name, using sender id");
                Ok(event.sender_id.clone())
            }
            Err(e) => {
                warn!(sender_id = %event.sender_id, error = %e, "Author lookup failed, using sender id");
                Ok(event.sender_id.clone())
            }
        }
    }

    /// Render the card and send it to every destination. Each send is
    /// independent; a failed chat does not stop the rest.
    async fn forward(
        &self,
        event: &InboundMessageEvent,
        record: &SubmissionRecord,
        cancel: &CancelSignal,
    ) {
        if self.destinations.is_empty() {
            warn!(article_id = record.id, "No group chats configured, submission not forwarded");
            return;
        }

        let doc = match decode(&event.raw_content) {
            Ok(doc) => doc,
            Err(e) => {
                error!(article_id = record.id, error = %e, "Failed to re-decode submission for forwarding");
                return;
            }
        };
        let card = self.renderer.render(&doc);

        let mut delivered = 0usize;
        for chat_id in &self.destinations {
            match cancel.run(self.gateway.send_card(chat_id, &card)).await {
                Ok(Ok(())) => {
                    delivered += 1;
                    info!(article_id = record.id, chat_id = %chat_id, "Forwarded submission");
                }
                Ok(Err(e)) => {
                    error!(article_id = record.id, chat_id = %chat_id, error = %e, "Failed to forward submission");
                }
                Err(_) => {
                    warn!(article_id = record.id, "Forwarding cancelled, remaining group chats skipped");
                    return;
                }
            }
        }
        debug!(
            article_id = record.id,
            delivered,
            total = self.destinations.len(),
            "Forwarding finished"
        );
    }
}

#[async_trait]
impl Strategy for SubmissionStrategy {
    fn name(&self) -> &str {
        "submission"
    }

    fn should_handle(&self, event: &InboundMessageEvent) -> bool {
        if !event.is_p2p() || event.content_kind != ContentKind::RichDocument {
            return false;
        }
        match decode(&event.raw_content) {
            Ok(doc) => doc.declared_title == self.trigger,
            Err(e) => {
                debug!(message_id = %event.message_id, error = %e, "Post content did not decode");
                false
            }
        }
    }

    async fn handle(
        &self,
        event: &InboundMessageEvent,
        cancel: &CancelSignal,
    ) -> Result<(), HandlerError> {
        cancel.check()?;

        let parsed = match self.parse(event) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(message_id = %event.message_id, error = %e, "Failed to parse submission");
                let text = format!("Sorry, your submission could not be parsed: {e}");
                self.reply(event, &text, cancel).await;
                return Err(e);
            }
        };
        debug!(message_id = %event.message_id, title = %parsed.title, "Parsed submission");

        cancel.check()?;
        let author_name = self.resolve_author(event, cancel).await?;

        cancel.check()?;
        let new = NewSubmission {
            author_id: event.sender_id.clone(),
            author_name,
            title: parsed.title,
            body: parsed.body_text,
        };
        let record = match cancel.run(self.store.create(new)).await? {
            Ok(record) => record,
            Err(e) => {
                error!(message_id = %event.message_id, error = %e, "Failed to save submission");
                let text = format!("Sorry, your submission could not be saved: {e}");
                self.reply(event, &text, cancel).await;
                return Err(e.into());
            }
        };
        info!(
            article_id = record.id,
            author_id = %record.author_id,
            title = %record.title,
            "Submission saved"
        );

        // Persisted: from here on the event counts as handled.
        if cancel.is_cancelled() {
            warn!(article_id = record.id, "Cancelled after save, forwarding skipped");
            return Ok(());
        }

        let confirmation = format!(
            "Submission '{}' received! Thanks for sharing! (ID: {}) Forwarding to group chats...",
            record.title, record.id
        );
        self.reply(event, &confirmation, cancel).await;

        if cancel.is_cancelled() {
            warn!(article_id = record.id, "Cancelled after save, forwarding skipped");
            return Ok(());
        }
        self.forward(event, &record, cancel).await;
        Ok(())
    }
}

//! Outbound collaborator traits consumed by the submission handler.

use async_trait::async_trait;

use crate::cards::ForwardCard;
use crate::error::{ChannelError, LookupError};

/// Message delivery: replies to a received message and card broadcasts.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Reply to `message_id` with plain text.
    async fn reply_text(&self, message_id: &str, text: &str) -> Result<(), ChannelError>;

    /// Send an interactive card to a chat.
    async fn send_card(&self, chat_id: &str, card: &ForwardCard) -> Result<(), ChannelError>;
}

/// Resolves external user ids to display names.
#[async_trait]
pub trait AuthorDirectory: Send + Sync {
    async fn lookup(&self, user_id: &str) -> Result<String, LookupError>;
}

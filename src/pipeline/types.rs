//! Shared types for the dispatch pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of chat the event was received in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    P2p,
    Group,
    Other(String),
}

impl ChatKind {
    /// Map the gateway's `chat_type` string.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "p2p" => Self::P2p,
            "group" => Self::Group,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Declared content type of the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    PlainText,
    RichDocument,
    Other(String),
}

impl ContentKind {
    /// Map the gateway's `message_type` string.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "text" => Self::PlainText,
            "post" => Self::RichDocument,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainText => write!(f, "text"),
            Self::RichDocument => write!(f, "post"),
            Self::Other(kind) => write!(f, "{kind}"),
        }
    }
}

/// An inbound chat message, as delivered by the gateway.
///
/// Read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessageEvent {
    pub chat_kind: ChatKind,
    pub content_kind: ContentKind,
    /// Undecoded message content.
    pub raw_content: Vec<u8>,
    pub sender_id: String,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

impl InboundMessageEvent {
    /// Lossy UTF-8 prefix of the raw content, for logs.
    pub fn content_preview(&self, max_chars: usize) -> String {
        String::from_utf8_lossy(&self.raw_content)
            .chars()
            .take(max_chars)
            .collect()
    }

    pub fn is_p2p(&self) -> bool {
        self.chat_kind == ChatKind::P2p
    }
}

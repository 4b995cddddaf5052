//! Lark event callback decoding.
//!
//! The webhook receives three shapes of body:
//! - `{"type":"url_verification","challenge":..}` when the endpoint is registered
//! - `{"schema":"2.0","header":{..},"event":{..}}` for subscribed events
//! - `{"encrypt":..}` when an encrypt key is configured on the app (unsupported)

use serde::Deserialize;
use tracing::debug;

use crate::error::ChannelError;
use crate::pipeline::types::{ChatKind, ContentKind, InboundMessageEvent};

/// Event type of an inbound chat message.
pub const MESSAGE_RECEIVE: &str = "im.message.receive_v1";

/// A decoded callback body.
#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
    UrlVerification {
        challenge: String,
        token: Option<String>,
    },
    Event(EventEnvelope),
    Encrypted,
}

impl Callback {
    /// Verification token carried by the callback, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::UrlVerification { token, .. } => token.as_deref(),
            Self::Event(envelope) => Some(envelope.header.token.as_str()),
            Self::Encrypted => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventEnvelope {
    pub header: EventHeader,
    #[serde(default)]
    pub event: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventHeader {
    #[serde(default)]
    pub event_id: String,
    pub event_type: String,
    #[serde(default)]
    pub token: String,
}

// ── im.message.receive_v1 payload ───────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessageReceive {
    sender: Sender,
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Sender {
    sender_id: SenderId,
}

#[derive(Debug, Deserialize)]
struct SenderId {
    #[serde(default)]
    open_id: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: String,
    #[serde(default)]
    chat_id: Option<String>,
    chat_type: String,
    message_type: String,
    /// JSON-encoded content, kept undecoded.
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct UrlVerification {
    challenge: String,
    #[serde(default)]
    token: Option<String>,
}

/// Decode a raw callback body.
pub fn parse_callback(body: &[u8]) -> Result<Callback, ChannelError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| ChannelError::InvalidMessage(format!("callback is not JSON: {e}")))?;

    if value.get("encrypt").is_some() {
        return Ok(Callback::Encrypted);
    }

    if value.get("type").and_then(|t| t.as_str()) == Some("url_verification") {
        let verification: UrlVerification = serde_json::from_value(value)
            .map_err(|e| ChannelError::InvalidMessage(format!("bad url_verification: {e}")))?;
        return Ok(Callback::UrlVerification {
            challenge: verification.challenge,
            token: verification.token,
        });
    }

    match value.get("schema").and_then(|s| s.as_str()) {
        Some("2.0") => {
            let envelope: EventEnvelope = serde_json::from_value(value)
                .map_err(|e| ChannelError::InvalidMessage(format!("bad event envelope: {e}")))?;
            Ok(Callback::Event(envelope))
        }
        Some(other) => Err(ChannelError::InvalidMessage(format!(
            "unsupported event schema {other}"
        ))),
        None => Err(ChannelError::InvalidMessage(
            "unrecognized callback body".into(),
        )),
    }
}

/// Whether `actual` satisfies the configured verification token.
/// Always true when no token is configured.
pub fn token_matches(expected: Option<&str>, actual: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => actual == Some(expected),
    }
}

impl EventEnvelope {
    /// Convert an `im.message.receive_v1` event. `Ok(None)` for other types.
    pub fn message_event(&self) -> Result<Option<InboundMessageEvent>, ChannelError> {
        if self.header.event_type != MESSAGE_RECEIVE {
            return Ok(None);
        }
        let payload: MessageReceive = serde_json::from_value(self.event.clone())
            .map_err(|e| ChannelError::InvalidMessage(format!("bad message event: {e}")))?;

        debug!(
            event_id = %self.header.event_id,
            message_id = %payload.message.message_id,
            chat_type = %payload.message.chat_type,
            message_type = %payload.message.message_type,
            "Decoded message event"
        );

        Ok(Some(InboundMessageEvent {
            chat_kind: ChatKind::from_wire(&payload.message.chat_type),
            content_kind: ContentKind::from_wire(&payload.message.message_type),
            raw_content: payload.message.content.into_bytes(),
            sender_id: payload.sender.sender_id.open_id,
            message_id: payload.message.message_id,
            chat_id: payload.message.chat_id,
        }))
    }
}

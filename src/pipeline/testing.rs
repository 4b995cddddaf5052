//! Test doubles shared by the pipeline unit tests.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tracing_subscriber::fmt::MakeWriter;

use crate::cards::ForwardCard;
use crate::channels::gateway::{AuthorDirectory, MessagingGateway};
use crate::error::{ChannelError, DatabaseError, LookupError};
use crate::pipeline::cancel::CancelHandle;
use crate::pipeline::types::{ChatKind, ContentKind, InboundMessageEvent};
use crate::store::{NewSubmission, SubmissionRecord, SubmissionStore};

/// A P2P rich-document event carrying `content`.
pub fn p2p_post(content: &str) -> InboundMessageEvent {
    InboundMessageEvent {
        chat_kind: ChatKind::P2p,
        content_kind: ContentKind::RichDocument,
        raw_content: content.as_bytes().to_vec(),
        sender_id: "ou_sender".into(),
        message_id: "om_message".into(),
        chat_id: Some("oc_p2p".into()),
    }
}

// ── Log capture ─────────────────────────────────────────────────────

/// In-memory log sink for `tracing_subscriber::fmt`.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Capture events at `level` and above on the current thread until the
    /// guard drops.
    pub fn install(&self, level: tracing::Level) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(level)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Number of log lines containing `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.contents().lines().filter(|l| l.contains(needle)).count()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// ── Store ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockStore {
    pub fail: bool,
    pub created: Mutex<Vec<NewSubmission>>,
    /// Fired once the record is saved.
    pub cancel_on_create: Option<CancelHandle>,
}

impl MockStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn cancelling(handle: CancelHandle) -> Self {
        Self {
            cancel_on_create: Some(handle),
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<NewSubmission> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionStore for MockStore {
    async fn create(&self, submission: NewSubmission) -> Result<SubmissionRecord, DatabaseError> {
        if self.fail {
            return Err(DatabaseError::Query("disk full".into()));
        }
        let mut created = self.created.lock().unwrap();
        created.push(submission.clone());
        if let Some(handle) = &self.cancel_on_create {
            handle.cancel();
        }
        let now = Utc::now();
        Ok(SubmissionRecord {
            id: created.len() as i64,
            author_id: submission.author_id,
            author_name: submission.author_name,
            title: submission.title,
            body: submission.body,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_id(&self, _id: i64) -> Result<Option<SubmissionRecord>, DatabaseError> {
        Ok(None)
    }
}

// ── Gateway ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockGateway {
    /// Chat ids whose sends fail.
    pub failing_chats: Vec<String>,
    pub replies: Mutex<Vec<(String, String)>>,
    pub cards: Mutex<Vec<(String, ForwardCard)>>,
}

impl MockGateway {
    pub fn failing_for(chats: &[&str]) -> Self {
        Self {
            failing_chats: chats.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().unwrap().clone()
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.cards
            .lock()
            .unwrap()
            .iter()
            .map(|(chat, _)| chat.clone())
            .collect()
    }

    pub fn cards(&self) -> Vec<ForwardCard> {
        self.cards
            .lock()
            .unwrap()
            .iter()
            .map(|(_, card)| card.clone())
            .collect()
    }
}

#[async_trait]
impl MessagingGateway for MockGateway {
    async fn reply_text(&self, message_id: &str, text: &str) -> Result<(), ChannelError> {
        self.replies
            .lock()
            .unwrap()
            .push((message_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_card(&self, chat_id: &str, card: &ForwardCard) -> Result<(), ChannelError> {
        if self.failing_chats.iter().any(|c| c == chat_id) {
            return Err(ChannelError::Api {
                name: "mock".into(),
                code: 230002,
                msg: "bot not in chat".into(),
            });
        }
        self.cards
            .lock()
            .unwrap()
            .push((chat_id.to_string(), card.clone()));
        Ok(())
    }
}

// ── Directory ───────────────────────────────────────────────────────

/// Resolves every user to `name`, or fails when `name` is `None`.
pub struct MockDirectory {
    pub name: Option<String>,
}

impl MockDirectory {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
        }
    }

    pub fn unreachable() -> Self {
        Self { name: None }
    }
}

#[async_trait]
impl AuthorDirectory for MockDirectory {
    async fn lookup(&self, user_id: &str) -> Result<String, LookupError> {
        self.name.clone().ok_or_else(|| LookupError::Failed {
            user_id: user_id.to_string(),
            reason: "connection refused".into(),
        })
    }
}

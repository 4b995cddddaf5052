//! End-to-end tests for submission intake.
//!
//! Each test wires the real dispatcher, submission strategy and in-memory
//! libSQL store against recording Lark doubles. The HTTP tests spin up an
//! Axum server on a random port and drive it with reqwest.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::time::timeout;

use miko_news::api::{AppState, REQUEST_ID_HEADER, router};
use miko_news::cards::{CardBlock, CardRenderer, FixedTheme, ForwardCard, ThemePalette};
use miko_news::channels::{AuthorDirectory, MessagingGateway};
use miko_news::error::{ChannelError, LookupError};
use miko_news::pipeline::{
    CancelSignal, ChatKind, ContentKind, DefaultStrategy, DispatchOutcome, Dispatcher,
    InboundMessageEvent, SubmissionStrategy,
};
use miko_news::store::{LibSqlBackend, SubmissionStore};

/// Maximum time any test is allowed to wait for background work.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const SUBMISSION: &str = r#"{
    "title": "投稿",
    "content": [
        [{"tag": "text", "text": "Weekly digest", "style": ["bold"]}],
        [{"tag": "text", "text": "Three things happened."}],
        [{"tag": "img", "image_key": "img_v2_1"}]
    ]
}"#;

/// Records replies and cards; every call succeeds.
#[derive(Default)]
struct RecordingLark {
    replies: Mutex<Vec<(String, String)>>,
    cards: Mutex<Vec<(String, ForwardCard)>>,
}

#[async_trait]
impl MessagingGateway for RecordingLark {
    async fn reply_text(&self, message_id: &str, text: &str) -> Result<(), ChannelError> {
        self.replies
            .lock()
            .unwrap()
            .push((message_id.into(), text.into()));
        Ok(())
    }

    async fn send_card(&self, chat_id: &str, card: &ForwardCard) -> Result<(), ChannelError> {
        self.cards
            .lock()
            .unwrap()
            .push((chat_id.into(), card.clone()));
        Ok(())
    }
}

#[async_trait]
impl AuthorDirectory for RecordingLark {
    async fn lookup(&self, user_id: &str) -> Result<String, LookupError> {
        Ok(format!("name-of-{user_id}"))
    }
}

struct Harness {
    store: Arc<LibSqlBackend>,
    lark: Arc<RecordingLark>,
    dispatcher: Arc<Dispatcher>,
}

async fn harness() -> Harness {
    let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let lark = Arc::new(RecordingLark::default());
    let submissions = SubmissionStrategy::new(store.clone(), lark.clone(), lark.clone())
        .with_destinations(vec!["oc_news".into(), "oc_team".into()])
        .with_renderer(CardRenderer::new(
            ThemePalette::default(),
            Box::new(FixedTheme(6)),
        ));
    let dispatcher = Dispatcher::builder()
        .register(submissions)
        .register(DefaultStrategy)
        .build();
    Harness {
        store,
        lark,
        dispatcher: Arc::new(dispatcher),
    }
}

fn event(chat_kind: ChatKind, content_kind: ContentKind, content: &str) -> InboundMessageEvent {
    InboundMessageEvent {
        chat_kind,
        content_kind,
        raw_content: content.as_bytes().to_vec(),
        sender_id: "ou_writer".into(),
        message_id: "om_42".into(),
        chat_id: Some("oc_dm".into()),
    }
}

#[tokio::test]
async fn submission_is_stored_confirmed_and_forwarded() {
    let h = harness().await;
    let outcome = h
        .dispatcher
        .dispatch(
            &event(ChatKind::P2p, ContentKind::RichDocument, SUBMISSION),
            &CancelSignal::never(),
        )
        .await
        .unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Handled {
            strategy: "submission".into()
        }
    );

    let record = h.store.find_by_id(1).await.unwrap().unwrap();
    assert_eq!(record.title, "Weekly digest");
    assert_eq!(record.body, "Weekly digest\nThree things happened.\n");
    assert_eq!(record.author_id, "ou_writer");
    assert_eq!(record.author_name, "name-of-ou_writer");

    let replies = h.lark.replies.lock().unwrap().clone();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].0, "om_42");
    assert!(replies[0].1.contains("(ID: 1)"));

    let cards = h.lark.cards.lock().unwrap().clone();
    let chats: Vec<&str> = cards.iter().map(|(chat, _)| chat.as_str()).collect();
    assert_eq!(chats, vec!["oc_news", "oc_team"]);
    let card = &cards[0].1;
    assert_eq!(card.theme, "red");
    assert_eq!(card.header_title, "Weekly digest");
    assert_eq!(
        card.blocks,
        vec![
            CardBlock::text("**Weekly digest**\nThree things happened."),
            CardBlock::image("img_v2_1"),
        ]
    );
}

#[tokio::test]
async fn private_text_falls_through_to_default() {
    let h = harness().await;
    let outcome = h
        .dispatcher
        .dispatch(
            &event(ChatKind::P2p, ContentKind::PlainText, r#"{"text":"hello"}"#),
            &CancelSignal::never(),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::Handled {
            strategy: "default".into()
        }
    );
    assert!(h.store.find_by_id(1).await.unwrap().is_none());
    assert!(h.lark.replies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn group_messages_are_unhandled() {
    let h = harness().await;
    let outcome = h
        .dispatcher
        .dispatch(
            &event(ChatKind::Group, ContentKind::RichDocument, SUBMISSION),
            &CancelSignal::never(),
        )
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Unhandled);
    assert!(h.store.find_by_id(1).await.unwrap().is_none());
}

#[tokio::test]
async fn redelivered_submission_is_stored_twice() {
    let h = harness().await;
    let submission = event(ChatKind::P2p, ContentKind::RichDocument, SUBMISSION);
    for _ in 0..2 {
        h.dispatcher
            .dispatch(&submission, &CancelSignal::never())
            .await
            .unwrap();
    }

    assert!(h.store.find_by_id(1).await.unwrap().is_some());
    assert!(h.store.find_by_id(2).await.unwrap().is_some());
    assert_eq!(h.lark.cards.lock().unwrap().len(), 4);
}

// ── HTTP ────────────────────────────────────────────────────────────────

/// Serve the router on an ephemeral port and return its base URL.
async fn serve(h: &Harness, token: Option<&str>) -> String {
    let state = AppState {
        dispatcher: h.dispatcher.clone(),
        store: h.store.clone(),
        verification_token: token.map(str::to_string),
        event_timeout: TEST_TIMEOUT,
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.ok();
    });
    format!("http://{addr}")
}

fn webhook_body(token: &str, content: &str) -> Value {
    serde_json::json!({
        "schema": "2.0",
        "header": {
            "event_id": "ev_9",
            "event_type": "im.message.receive_v1",
            "token": token
        },
        "event": {
            "sender": {"sender_id": {"open_id": "ou_writer"}, "sender_type": "user"},
            "message": {
                "message_id": "om_42",
                "chat_id": "oc_dm",
                "chat_type": "p2p",
                "message_type": "post",
                "content": content
            }
        }
    })
}

#[tokio::test]
async fn webhook_submission_becomes_readable_article() {
    let h = harness().await;
    let base = serve(&h, Some("vtoken")).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/webhook/event"))
        .json(&webhook_body("vtoken", SUBMISSION))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));

    // Dispatch runs in the background; wait for the broadcast to land.
    timeout(TEST_TIMEOUT, async {
        while h.lark.cards.lock().unwrap().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("submission was not forwarded in time");

    let resp = client
        .get(format!("{base}/api/v1/articles/1"))
        .header(REQUEST_ID_HEADER, "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()[REQUEST_ID_HEADER], "trace-me");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["title"], "Weekly digest");
    assert_eq!(body["data"]["author_name"], "name-of-ou_writer");
}

#[tokio::test]
async fn webhook_rejects_forged_token() {
    let h = harness().await;
    let base = serve(&h, Some("vtoken")).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/webhook/event"))
        .json(&webhook_body("forged", SUBMISSION))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.store.find_by_id(1).await.unwrap().is_none());
}

#[tokio::test]
async fn url_verification_round_trip() {
    let h = harness().await;
    let base = serve(&h, None).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/webhook/event"))
        .json(&serde_json::json!({"type": "url_verification", "challenge": "ch-1"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["challenge"], "ch-1");
}

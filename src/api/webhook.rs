//! Lark event callback endpoint.
//!
//! Lark expects an answer within a few seconds, so message events are only
//! decoded here and then dispatched on their own task.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{AppState, failure};
use crate::channels::events::{Callback, parse_callback, token_matches};
use crate::pipeline::{CancelHandle, DispatchOutcome, Dispatcher, InboundMessageEvent};

/// `POST /webhook/event`
pub async fn event_callback(State(state): State<AppState>, body: Bytes) -> Response {
    let callback = match parse_callback(&body) {
        Ok(callback) => callback,
        Err(e) => {
            warn!(error = %e, "Rejected event callback");
            return failure(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    match callback {
        Callback::Encrypted => {
            warn!("Received encrypted callback; disable the encrypt key for this app");
            failure(
                StatusCode::BAD_REQUEST,
                "encrypted callbacks are not supported",
            )
        }
        other if !token_matches(state.verification_token.as_deref(), other.token()) => {
            warn!("Event callback verification token mismatch");
            failure(StatusCode::UNAUTHORIZED, "invalid verification token")
        }
        Callback::UrlVerification { challenge, .. } => {
            info!("Answered URL verification challenge");
            Json(serde_json::json!({ "challenge": challenge })).into_response()
        }
        Callback::Event(envelope) => match envelope.message_event() {
            Ok(Some(event)) => {
                spawn_dispatch(state.dispatcher.clone(), event, state.event_timeout);
                acknowledge()
            }
            Ok(None) => {
                debug!(
                    event_type = %envelope.header.event_type,
                    event_id = %envelope.header.event_id,
                    "Ignoring unsubscribed event type"
                );
                acknowledge()
            }
            Err(e) => {
                warn!(event_id = %envelope.header.event_id, error = %e, "Malformed message event");
                failure(StatusCode::BAD_REQUEST, e.to_string())
            }
        },
    }
}

fn acknowledge() -> Response {
    Json(serde_json::json!({ "success": true })).into_response()
}

/// Dispatch one event on its own task. The event is cancelled once
/// `timeout` elapses; its outcome is logged, never returned.
pub fn spawn_dispatch(
    dispatcher: Arc<Dispatcher>,
    event: InboundMessageEvent,
    timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (handle, signal) = CancelHandle::pair();
        let timer = handle.cancel_after(timeout);

        match dispatcher.dispatch(&event, &signal).await {
            Ok(DispatchOutcome::Handled { strategy }) => {
                debug!(message_id = %event.message_id, strategy = %strategy, "Event dispatched")
            }
            Ok(DispatchOutcome::Unhandled) => {}
            Err(e) => warn!(message_id = %event.message_id, error = %e, "Event processing failed"),
        }
        timer.abort();
    })
}

//! HTTP surface: the Lark event webhook, the article read API and health
//! routes.

pub mod articles;
pub mod middleware;
pub mod webhook;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::pipeline::Dispatcher;
use crate::store::SubmissionStore;

pub use middleware::REQUEST_ID_HEADER;
pub use webhook::spawn_dispatch;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub store: Arc<dyn SubmissionStore>,
    /// Expected callback token; `None` disables the check.
    pub verification_token: Option<String>,
    /// Processing budget for each dispatched event.
    pub event_timeout: Duration,
}

/// Build the Axum router with every route and layer.
pub fn router(state: AppState) -> Router {
    with_layers(
        Router::new()
            .route("/health", get(health))
            .route("/ping", get(ping))
            .route("/webhook/event", post(webhook::event_callback))
            .route("/api/v1/articles/{id}", get(articles::get_article))
            .with_state(state),
    )
}

/// Panic recovery innermost, so a recovered 500 still carries the request id.
fn with_layers(routes: Router) -> Router {
    routes
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(axum::middleware::from_fn(middleware::request_id))
        .layer(CorsLayer::permissive())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "Handler panicked");
    failure(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}

// ── Response envelope ───────────────────────────────────────────────────

/// `{"success": true, "data": ..}`
pub(crate) fn success<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "success": true, "data": data })),
    )
        .into_response()
}

/// `{"success": false, "error": ..}` with the given status.
pub(crate) fn failure(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "success": false, "error": error.into() })),
    )
        .into_response()
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "time": Utc::now().to_rfc3339(),
    }))
}

async fn ping() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "pong" }))
}

//! Article read API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use tracing::{debug, error};

use super::{AppState, failure, success};

/// `GET /api/v1/articles/{id}`
pub async fn get_article(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = id.parse::<i64>() else {
        return failure(StatusCode::BAD_REQUEST, "invalid article id");
    };

    match state.store.find_by_id(id).await {
        Ok(Some(record)) => success(record),
        Ok(None) => {
            debug!(article_id = id, "Article not found");
            failure(StatusCode::NOT_FOUND, "article not found")
        }
        Err(e) => {
            error!(article_id = id, error = %e, "Failed to load article");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "failed to load article")
        }
    }
}

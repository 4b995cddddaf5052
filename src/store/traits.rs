//! Persistence contract for submissions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DatabaseError;

/// Fields supplied by the submission handler; id and timestamps are assigned
/// by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub author_id: String,
    pub author_name: String,
    pub title: String,
    pub body: String,
}

/// A persisted submission (an "article" in the read API).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub author_id: String,
    pub author_name: String,
    pub title: String,
    #[serde(rename = "content")]
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Backend-agnostic submission persistence.
///
/// No idempotency key is enforced: creating the same submission twice
/// yields two records.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist a new submission and return the stored record.
    async fn create(&self, submission: NewSubmission) -> Result<SubmissionRecord, DatabaseError>;

    /// Look up a submission by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<SubmissionRecord>, DatabaseError>;
}

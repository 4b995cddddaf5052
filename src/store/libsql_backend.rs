//! libSQL backend: async `SubmissionStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{NewSubmission, SubmissionRecord, SubmissionStore};

const ARTICLE_COLUMNS: &str =
    "id, title, content, author_id, author_name, created_at, updated_at";

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        info!(path = %path.display(), "Database opened");
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Map a libsql Row (in `ARTICLE_COLUMNS` order) to a record.
fn row_to_record(row: &libsql::Row) -> Result<SubmissionRecord, libsql::Error> {
    let created: String = row.get(5)?;
    let updated: String = row.get(6)?;
    Ok(SubmissionRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        author_id: row.get(3)?,
        author_name: row.get(4)?,
        created_at: parse_datetime(&created),
        updated_at: parse_datetime(&updated),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl SubmissionStore for LibSqlBackend {
    async fn create(&self, submission: NewSubmission) -> Result<SubmissionRecord, DatabaseError> {
        let now = Utc::now();
        let stamp = now.to_rfc3339();
        let mut rows = self
            .conn
            .query(
                "INSERT INTO articles (title, content, author_id, author_name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 RETURNING id",
                params![
                    submission.title.as_str(),
                    submission.body.as_str(),
                    submission.author_id.as_str(),
                    submission.author_name.as_str(),
                    stamp.as_str(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_article: {e}")))?;

        let id: i64 = match rows.next().await {
            Ok(Some(row)) => row
                .get(0)
                .map_err(|e| DatabaseError::Query(format!("row parse: {e}")))?,
            Ok(None) => {
                return Err(DatabaseError::Query(
                    "insert_article: no id returned".into(),
                ));
            }
            Err(e) => return Err(DatabaseError::Query(format!("insert_article: {e}"))),
        };

        debug!(id, author_id = %submission.author_id, "Article inserted into DB");
        Ok(SubmissionRecord {
            id,
            author_id: submission.author_id,
            author_name: submission.author_name,
            title: submission.title,
            body: submission.body,
            created_at: parse_datetime(&stamp),
            updated_at: parse_datetime(&stamp),
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<SubmissionRecord>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("find_article: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let record = row_to_record(&row)
                    .map_err(|e| DatabaseError::Query(format!("row parse: {e}")))?;
                Ok(Some(record))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("find_article: {e}"))),
        }
    }
}

//! Error types for MikoNews.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-related errors (the persistence failure of a submission).
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Delivery errors raised by the messaging gateway.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Authentication failed for channel {name}: {reason}")]
    AuthFailed { name: String, reason: String },

    #[error("API error on channel {name}: code {code}: {msg}")]
    Api { name: String, code: i64, msg: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

/// Author directory failures. Never fatal to a submission.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("User lookup for {user_id} failed: {reason}")]
    Failed { user_id: String, reason: String },

    #[error("User {user_id} has no display name")]
    MissingName { user_id: String },
}

/// The raw payload does not match the rich document schema.
#[derive(Debug, thiserror::Error)]
#[error("malformed rich document: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// The document decoded but carries nothing usable.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("submission contains no text")]
    Empty,
}

/// Failure of a strategy handler. Aborts processing of the current event.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to persist submission: {0}")]
    Persistence(#[from] DatabaseError),

    #[error("event processing cancelled")]
    Cancelled,
}

/// A handler failure surfaced by the dispatcher, tagged with the strategy name.
#[derive(Debug, thiserror::Error)]
#[error("strategy {strategy} failed: {source}")]
pub struct DispatchError {
    pub strategy: String,
    #[source]
    pub source: HandlerError,
}

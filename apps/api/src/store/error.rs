use thiserror::Error;

/// Errors raised by [`DocumentStore`](super::DocumentStore) backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Precondition failed on {path}: expected {field} to match")]
    PreconditionFailed { path: String, field: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid document at {0}: documents must be JSON objects")]
    InvalidDocument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

pub type StoreResult<T> = Result<T, StoreError>;

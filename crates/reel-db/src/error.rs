//! Database error types.

use thiserror::Error;

/// Result type for video store operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors from the video store.
///
/// An unavailable database is transient: the message stays unacked and the
/// queue redelivers. The report has no side effect until the atomic
/// increment commits, so re-attempting from scratch is safe.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Database unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("Failed to configure database: {0}")]
    ConfigError(String),
}

impl DbError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

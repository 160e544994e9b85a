//! Stage error types.

use thiserror::Error;

pub type StageResult<T> = Result<T, StageError>;

/// Failure of one stage execution.
///
/// The executor asks `is_permanent` to decide between leaving the message
/// for redelivery (transient) and acking it into the DLQ (permanent).
/// Handlers never retry internally.
#[derive(Debug, Error)]
pub enum StageError {
    /// Malformed message or missing payload field. Never redelivered.
    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Workspace acquisition failed: {0}")]
    Workspace(std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] reel_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] reel_media::MediaError),

    #[error("Database error: {0}")]
    Db(#[from] reel_db::DbError),

    #[error("Queue error: {0}")]
    Queue(#[from] reel_queue::QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Whether redelivery cannot help.
    ///
    /// Everything else (storage/network failures, engine exits, database
    /// unavailable) is transient and left to the queue's retry policy.
    pub fn is_permanent(&self) -> bool {
        match self {
            StageError::Malformed(_) => true,
            StageError::Media(e) => e.is_permanent(),
            StageError::Queue(reel_queue::QueueError::Malformed(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_taxonomy() {
        assert!(StageError::malformed("bad payload").is_permanent());
        assert!(StageError::Media(reel_media::MediaError::InvalidInput("empty".into()))
            .is_permanent());

        // Engine exits and storage failures stay transient
        assert!(
            !StageError::Media(reel_media::MediaError::ffmpeg_failed("exit 1", None, Some(1)))
                .is_permanent()
        );
        assert!(
            !StageError::Storage(reel_storage::StorageError::download_failed("timeout"))
                .is_permanent()
        );
    }
}

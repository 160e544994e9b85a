//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while driving the external transcoding engine.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Invalid input file: {0}")]
    InvalidInput(String),

    #[error("Malformed engine output: {0}")]
    MalformedOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Whether this failure is permanent: the input itself is missing or
    /// corrupt, so redelivering the message cannot help.
    ///
    /// Engine failures stay transient (encoder hiccups, resource
    /// contention) and are left to the queue's retry policy.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            MediaError::InputNotFound(_) | MediaError::InvalidInput(_)
        )
    }
}

//! Error types for pipeline operations.

use std::time::Duration;

use digest_core::{BackendError, NotifyError, SessionError};
use schedule_store::StoreError;
use thiserror::Error;

/// Errors that can occur while running the digest pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Network or provider failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// A provider asked us to wait before retrying.
    #[error("rate limited, retry after {wait:?}")]
    RateLimited { wait: Duration },

    /// Malformed user input.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Unknown user or chat.
    #[error("not found: {0}")]
    NotFound(String),

    /// Schedule store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The batch was cancelled before it finished.
    #[error("cancelled")]
    Cancelled,

    /// Anything else.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl PipelineError {
    /// Whether a job may try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Transport(_) | PipelineError::Unexpected(_))
    }
}

impl From<SessionError> for PipelineError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Transport(msg) => PipelineError::Transport(msg),
            SessionError::RateLimited { wait } => PipelineError::RateLimited { wait },
            SessionError::NotFound(what) => PipelineError::NotFound(what),
            SessionError::Malformed(msg) => PipelineError::Unexpected(msg),
        }
    }
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Configuration(msg) => PipelineError::Configuration(msg),
            other => PipelineError::Transport(other.to_string()),
        }
    }
}

impl From<NotifyError> for PipelineError {
    fn from(err: NotifyError) -> Self {
        PipelineError::Transport(err.to_string())
    }
}

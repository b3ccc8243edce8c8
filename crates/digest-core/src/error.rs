//! Error types reported by external collaborators.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a messaging provider session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Network or provider failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider asked us to wait before issuing more requests.
    #[error("rate limited, retry after {wait:?}")]
    RateLimited { wait: Duration },

    /// The requested chat or session does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The provider answered with something we could not interpret.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Errors raised by a summarization backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The backend rejected the request.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The backend answered without any generated text.
    #[error("empty response from backend")]
    EmptyResponse,

    /// Invalid backend configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Errors raised while reporting back to a user.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// An edit carried exactly the text the message already had.
    #[error("message not modified")]
    NotModified,

    /// Network or transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The messaging service refused the request.
    #[error("rejected: {0}")]
    Rejected(String),
}

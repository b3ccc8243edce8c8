//! Error types for chat-gateway.

use std::time::Duration;

use digest_core::{NotifyError, SessionError};
use thiserror::Error;

/// JSON-RPC error code the gateway uses for flood control.
pub const RATE_LIMIT_CODE: i32 = 420;

/// JSON-RPC error code the gateway uses for unknown chats and sessions.
pub const NOT_FOUND_CODE: i32 = 404;

/// Errors that can occur when talking to the gateway daemon or the bot API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON-RPC error response from the daemon.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// The provider asked us to back off.
    #[error("rate limited for {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    /// Unknown chat or session.
    #[error("not found: {0}")]
    NotFound(String),

    /// Connection to daemon failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Daemon health check failed.
    #[error("Health check failed")]
    HealthCheckFailed,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The bot API rejected a request.
    #[error("bot API error {code}: {description}")]
    Bot { code: i32, description: String },
}

impl From<GatewayError> for SessionError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::RateLimited { retry_after } => SessionError::RateLimited {
                wait: Duration::from_secs(retry_after),
            },
            GatewayError::NotFound(what) => SessionError::NotFound(what),
            GatewayError::Json(e) => SessionError::Malformed(e.to_string()),
            other => SessionError::Transport(other.to_string()),
        }
    }
}

impl From<GatewayError> for NotifyError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Bot { description, .. } if is_not_modified(&description) => {
                NotifyError::NotModified
            }
            GatewayError::Bot { code, description } => {
                NotifyError::Rejected(format!("{}: {}", code, description))
            }
            other => NotifyError::Transport(other.to_string()),
        }
    }
}

fn is_not_modified(description: &str) -> bool {
    description.to_lowercase().contains("message is not modified")
}

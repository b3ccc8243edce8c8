//! Reporting progress and results to users.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// Handle to a message previously sent through a [`Notifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    /// Chat the message lives in.
    pub chat_id: i64,
    /// Provider message id.
    pub message_id: i64,
}

/// Trait for sending and editing user-facing messages.
///
/// Abstracted to support different transports (bot APIs, tests, etc.)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a new text message to `recipient`.
    async fn send(&self, recipient: i64, text: &str) -> Result<MessageHandle, NotifyError>;

    /// Replace the text of a previously sent message.
    async fn edit(
        &self,
        recipient: i64,
        handle: &MessageHandle,
        text: &str,
    ) -> Result<(), NotifyError>;

    /// Edit a message, treating "content unchanged" as success.
    async fn edit_or_keep(
        &self,
        recipient: i64,
        handle: &MessageHandle,
        text: &str,
    ) -> Result<(), NotifyError> {
        match self.edit(recipient, handle, text).await {
            Err(NotifyError::NotModified) => Ok(()),
            other => other,
        }
    }
}

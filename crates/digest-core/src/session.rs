//! Messaging provider session traits.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::SessionError;
use crate::message::{ChatInfo, Dialog, HistoryMessage};

/// An authenticated session with the messaging provider, acting on behalf
/// of one user.
///
/// A single session is shared by every job of a batch, so implementations
/// must tolerate concurrent calls. Callers bound how many run at once.
#[async_trait]
pub trait MessagingSession: Send + Sync {
    /// Walk a chat's history from the most recent message backwards.
    ///
    /// The stream ends when the history is exhausted. A
    /// [`SessionError::RateLimited`] item does not end the stream.
    fn chat_history(&self, chat_id: i64) -> BoxStream<'_, Result<HistoryMessage, SessionError>>;

    /// Enumerate the user's known chats, most recent first.
    ///
    /// Rate-limit items are yielded in place; polling again resumes where
    /// the enumeration stopped.
    fn dialogs(&self) -> BoxStream<'_, Result<Dialog, SessionError>>;

    /// Look up metadata for a chat.
    async fn chat_info(&self, chat_id: i64) -> Result<ChatInfo, SessionError>;

    /// Release the session.
    ///
    /// Default implementation does nothing.
    async fn close(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Opens sessions keyed by a user's identity string.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open (or resume) the session for `identity`.
    async fn open(&self, identity: &str) -> Result<Arc<dyn MessagingSession>, SessionError>;

    /// Discard any stored credentials for `identity`.
    ///
    /// Default implementation does nothing.
    async fn forget(&self, identity: &str) -> Result<(), SessionError> {
        let _ = identity;
        Ok(())
    }
}

/// Provider session name for an identity phone number.
pub fn session_name(identity: &str) -> String {
    identity.replace('+', "")
}

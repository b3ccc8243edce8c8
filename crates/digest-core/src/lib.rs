//! Core traits and types for the chat digest pipeline.
//!
//! This crate provides the shared interface between the pipeline and the
//! external collaborators it talks to. It defines:
//!
//! - [`MessagingSession`] / [`SessionFactory`] - Access to a user's chats
//! - [`SummaryBackend`] - The text-summarization provider
//! - [`Notifier`] - Reporting progress and results back to the user
//! - [`HistoryMessage`] / [`Dialog`] / [`Transcript`] - Value types
//!
//! # Example
//!
//! ```rust
//! use digest_core::{async_trait, BackendError, PromptPart, SummaryBackend};
//!
//! struct Shout;
//!
//! #[async_trait]
//! impl SummaryBackend for Shout {
//!     async fn complete(&self, _model: &str, parts: Vec<PromptPart>) -> Result<String, BackendError> {
//!         Ok(parts.iter().map(|p| p.content.to_uppercase()).collect::<Vec<_>>().join(" "))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Shout"
//!     }
//! }
//! ```

mod backend;
mod error;
mod message;
mod notifier;
mod session;
mod transcript;

pub use backend::{PromptPart, SummaryBackend};
pub use error::{BackendError, NotifyError, SessionError};
pub use message::{ChatInfo, Dialog, DialogKind, HistoryMessage, MediaKind};
pub use notifier::{MessageHandle, Notifier};
pub use session::{session_name, MessagingSession, SessionFactory};
pub use transcript::{Transcript, TranscriptLine};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

//! Mock collaborators for testing the chat digest pipeline.
//!
//! This crate provides in-memory implementations of the `digest-core` traits:
//! - `FakeSession` / `FakeSessionFactory` - Scripted chats and dialogs with
//!   call counters and a concurrency high-water mark
//! - `CountingBackend` - A summarization backend that counts calls and can
//!   fail on demand
//! - `StallingBackend` - Holds each call open and tracks calls in flight
//! - `RecordingNotifier` - Records every message sent or edited
//!
//! For production use, see the `chat-gateway` and `openai-summarizer` crates.
//!
//! # Example
//!
//! ```rust
//! use mock_provider::{CountingBackend, PromptPart, SummaryBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_provider::BackendError> {
//!     let backend = CountingBackend::replying("short summary");
//!
//!     let text = backend.complete("any-model", vec![PromptPart::user("hi")]).await?;
//!     assert_eq!(text, "short summary");
//!     assert_eq!(backend.calls(), 1);
//!     Ok(())
//! }
//! ```

mod backend;
mod notifier;
mod session;
mod stalling;

// Re-export digest-core types for convenience
pub use digest_core::{
    async_trait, BackendError, MessageHandle, MessagingSession, Notifier, NotifyError, PromptPart,
    SessionError, SessionFactory, SummaryBackend,
};

pub use backend::CountingBackend;
pub use notifier::{Notice, RecordingNotifier};
pub use session::{DialogStep, FakeSession, FakeSessionFactory};
pub use stalling::StallingBackend;

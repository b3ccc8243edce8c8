//! Concurrent chat summarization pipeline.
//!
//! This crate fetches recent chat history on behalf of registered users,
//! condenses it through a summarization backend and reports the result back
//! to them. It is built from:
//!
//! - [`fetch_transcript`] - Walks a chat's history into a [`Transcript`]
//! - [`Summarizer`] - Calls the backend with a single cooled-down retry
//! - [`list_dialogs`] - Paced, rate-limit aware dialog enumeration
//! - [`Dispatcher`] - Runs one job per chat under a global permit pool
//! - [`DigestService`] - The user-facing flows a bot front end calls
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chat_gateway::{BotNotifier, GatewayConfig, GatewaySessionFactory};
//! use digest_pipeline::{DigestConfig, DigestService};
//! use openai_summarizer::OpenAiBackend;
//! use schedule_store::ScheduleStore;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DigestConfig::from_env()?;
//! let store = Arc::new(ScheduleStore::open(&config.store_file).await?);
//! let sessions = Arc::new(GatewaySessionFactory::connect(GatewayConfig::from_env()).await?);
//! let backend = Arc::new(OpenAiBackend::from_env()?);
//! let notifier = Arc::new(BotNotifier::from_env()?);
//!
//! let service = DigestService::new(config, store, sessions, backend, notifier);
//! let report = service.summarize_now(42, "24", CancellationToken::new()).await?;
//! println!("{} chats summarized", report.jobs.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dialogs;
pub mod dispatcher;
pub mod error;
pub mod fetcher;
pub mod messages;
pub mod service;
pub mod summarizer;

pub use config::{DigestConfig, DigestConfigBuilder};
pub use dialogs::{list_dialogs, DialogEntry};
pub use dispatcher::{BatchReport, Dispatcher, JobOutcome, JobReport};
pub use error::PipelineError;
pub use fetcher::{clamp_hours, fetch_transcript, fetch_transcript_at, MAX_WINDOW_HOURS};
pub use service::{parse_hours, validate_phone, DigestService};
pub use summarizer::{Summarizer, NO_MESSAGES};

// Re-export core types for convenience
pub use digest_core::{
    ChatInfo, Dialog, HistoryMessage, MessageHandle, MessagingSession, Notifier, SessionFactory,
    SummaryBackend, Transcript,
};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

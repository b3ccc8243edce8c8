//! OpenAI-compatible summarization backend.
//!
//! This crate provides a [`SummaryBackend`] that sends the pipeline's
//! role-tagged prompt parts to a chat completions endpoint and returns the
//! generated text.
//!
//! # Features
//!
//! - Works against any OpenAI-compatible `/v1/chat/completions` endpoint
//! - Requests are sent with `store: false`
//! - Configurable via environment variables
//!
//! # Usage
//!
//! ```rust,no_run
//! use openai_summarizer::OpenAiBackend;
//! use digest_core::{PromptPart, SummaryBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = OpenAiBackend::from_env()?;
//!     let text = backend
//!         .complete("gpt-4o-mini", vec![PromptPart::user("Say hi")])
//!         .await?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```

mod api_types;
mod backend;
mod config;

pub use backend::OpenAiBackend;
pub use config::{OpenAiConfig, OpenAiConfigBuilder};

// Re-export digest-core types for convenience
pub use digest_core::{BackendError, PromptPart, SummaryBackend};

//! The summarization backend trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// A single role-tagged part of a summarization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPart {
    /// Role: "system", "user" or "assistant"
    pub role: String,
    /// Part content
    pub content: String,
}

impl PromptPart {
    /// Create a user part.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create a system part.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// A text generation service that turns an ordered list of parts into text.
///
/// Implementations perform exactly one call per invocation; retry policy
/// belongs to the caller. This trait is object-safe and can be used with
/// `Arc<dyn SummaryBackend>`.
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    /// Generate text for the given parts using `model`.
    async fn complete(&self, model: &str, parts: Vec<PromptPart>) -> Result<String, BackendError>;

    /// Get a human-readable name for this backend.
    fn name(&self) -> &str;
}

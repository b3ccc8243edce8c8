//! Summarization with a single cooled-down retry.

use std::sync::Arc;
use std::time::Duration;

use digest_core::{BackendError, PromptPart, SummaryBackend, Transcript};
use tracing::{debug, warn};

use crate::config::DEFAULT_SUMMARY_COOLDOWN;

/// Result returned for an empty transcript.
pub const NO_MESSAGES: &str = "No messages";

/// Final prompt part asking the model to produce its answer.
pub const CONTINUATION_CUE: &str = "Processed:";

/// Turns transcripts into summaries through a [`SummaryBackend`].
#[derive(Clone)]
pub struct Summarizer {
    backend: Arc<dyn SummaryBackend>,
    cooldown: Duration,
}

impl Summarizer {
    /// Create a summarizer with the default cooldown.
    pub fn new(backend: Arc<dyn SummaryBackend>) -> Self {
        Self {
            backend,
            cooldown: DEFAULT_SUMMARY_COOLDOWN,
        }
    }

    /// Set the wait before the retry.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Summarize `transcript` with `model`, prefixed by `phrase`.
    ///
    /// An empty transcript yields [`NO_MESSAGES`] without touching the
    /// backend. A failed call is repeated once after the cooldown; the
    /// second failure is returned.
    pub async fn summarize(
        &self,
        transcript: &Transcript,
        model: &str,
        phrase: &str,
    ) -> Result<String, BackendError> {
        let Some(text) = transcript.render() else {
            return Ok(NO_MESSAGES.to_string());
        };
        let parts = build_prompt(phrase, &text);

        match self.backend.complete(model, parts.clone()).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                warn!(
                    backend = self.backend.name(),
                    "Summarization failed, retrying in {:?}: {}", self.cooldown, e
                );
                tokio::time::sleep(self.cooldown).await;
                let summary = self.backend.complete(model, parts).await?;
                debug!(backend = self.backend.name(), "Summarization retry succeeded");
                Ok(summary)
            }
        }
    }
}

/// Build the three-part request: instruction, transcript, continuation cue.
pub fn build_prompt(phrase: &str, transcript: &str) -> Vec<PromptPart> {
    vec![
        PromptPart::user(phrase),
        PromptPart::user(transcript),
        PromptPart::user(CONTINUATION_CUE),
    ]
}

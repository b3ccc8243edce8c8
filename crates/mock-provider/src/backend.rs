//! Counting backend implementation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use digest_core::{async_trait, BackendError, PromptPart, SummaryBackend};

/// A backend that replies with fixed text and records every call.
///
/// The first `failures` calls fail with a network error.
#[derive(Debug, Default)]
pub struct CountingBackend {
    reply: String,
    failures: usize,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, Vec<PromptPart>)>>,
}

impl CountingBackend {
    /// Create a backend that always answers `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            ..Default::default()
        }
    }

    /// Fail the first `failures` calls.
    pub fn failing_first(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<(String, Vec<PromptPart>)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SummaryBackend for CountingBackend {
    async fn complete(&self, model: &str, parts: Vec<PromptPart>) -> Result<String, BackendError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((model.to_string(), parts));
        }

        if call <= self.failures {
            return Err(BackendError::Network(format!("scripted failure {}", call)));
        }
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "CountingBackend"
    }
}

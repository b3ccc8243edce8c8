//! Backend that holds each call open for a fixed time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use digest_core::{async_trait, BackendError, PromptPart, SummaryBackend};

/// Wraps a backend and keeps every call pending for `hold` before forwarding it.
///
/// Tracks how many calls are currently in flight. A call dropped mid-hold,
/// for example by an aborted task, stops counting as in flight.
pub struct StallingBackend<B> {
    inner: B,
    hold: Duration,
    in_flight: AtomicUsize,
    started: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<B: SummaryBackend> StallingBackend<B> {
    /// Hold each call to `inner` for `hold`.
    pub fn new(inner: B, hold: Duration) -> Self {
        Self {
            inner,
            hold,
            in_flight: AtomicUsize::new(0),
            started: AtomicUsize::new(0),
        }
    }

    /// Calls currently being held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Calls received so far, finished or not.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Backend the held calls are forwarded to.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: SummaryBackend> SummaryBackend for StallingBackend<B> {
    async fn complete(&self, model: &str, parts: Vec<PromptPart>) -> Result<String, BackendError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        tokio::time::sleep(self.hold).await;
        self.inner.complete(model, parts).await
    }

    fn name(&self) -> &str {
        "StallingBackend"
    }
}

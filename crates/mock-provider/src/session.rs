//! Scripted messaging sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use digest_core::{
    async_trait, ChatInfo, Dialog, HistoryMessage, MessagingSession, SessionError, SessionFactory,
};
use futures::stream::{self, BoxStream, StreamExt};

/// One item of a scripted dialog enumeration.
#[derive(Debug, Clone)]
pub enum DialogStep {
    /// Yield a dialog.
    Entry(Dialog),
    /// Yield a rate-limit signal carrying `wait`.
    RateLimit(Duration),
    /// Yield a transport error.
    Fail(String),
}

#[derive(Debug, Clone, Default)]
struct ChatScript {
    title: Option<String>,
    /// Newest first, as the provider returns them.
    messages: Vec<HistoryMessage>,
    failures: usize,
}

/// An in-memory session serving scripted chats.
///
/// Every history walk is counted per chat and measured for concurrency:
/// [`FakeSession::max_active`] reports the highest number of walks that
/// were in flight at the same instant.
#[derive(Debug, Default)]
pub struct FakeSession {
    chats: HashMap<i64, ChatScript>,
    dialogs: Vec<DialogStep>,
    delay: Duration,
    history_calls: Mutex<HashMap<i64, usize>>,
    dialog_items: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    closed: AtomicBool,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chat with its title and history, newest message first.
    pub fn with_chat(
        mut self,
        chat_id: i64,
        title: impl Into<String>,
        messages: Vec<HistoryMessage>,
    ) -> Self {
        let script = self.chats.entry(chat_id).or_default();
        script.title = Some(title.into());
        script.messages = messages;
        self
    }

    /// Make the first `failures` history walks of `chat_id` fail.
    pub fn with_history_failures(mut self, chat_id: i64, failures: usize) -> Self {
        self.chats.entry(chat_id).or_default().failures = failures;
        self
    }

    /// Hold every history walk for `delay` before yielding anything.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Script the dialog enumeration.
    pub fn with_dialogs(mut self, steps: Vec<DialogStep>) -> Self {
        self.dialogs = steps;
        self
    }

    /// Number of history walks started for `chat_id`.
    pub fn history_calls(&self, chat_id: i64) -> usize {
        self.history_calls
            .lock()
            .map(|calls| calls.get(&chat_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of history walks currently in flight.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous history walks observed.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Number of dialog items handed out so far, rate limits included.
    pub fn dialog_items(&self) -> usize {
        self.dialog_items.load(Ordering::SeqCst)
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn next_history_attempt(&self, chat_id: i64) -> usize {
        match self.history_calls.lock() {
            Ok(mut calls) => {
                let count = calls.entry(chat_id).or_insert(0);
                *count += 1;
                *count
            }
            Err(_) => 0,
        }
    }
}

/// Counts one in-flight history walk until dropped.
struct ActiveGuard<'a> {
    active: &'a AtomicUsize,
}

impl<'a> ActiveGuard<'a> {
    fn enter(session: &'a FakeSession) -> Self {
        let now = session.active.fetch_add(1, Ordering::SeqCst) + 1;
        session.max_active.fetch_max(now, Ordering::SeqCst);
        Self {
            active: &session.active,
        }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessagingSession for FakeSession {
    fn chat_history(&self, chat_id: i64) -> BoxStream<'_, Result<HistoryMessage, SessionError>> {
        let attempt = self.next_history_attempt(chat_id);
        let script = self.chats.get(&chat_id).cloned().unwrap_or_default();

        stream::once(async move {
            let _guard = ActiveGuard::enter(self);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            if attempt <= script.failures {
                vec![Err(SessionError::Transport(format!(
                    "scripted failure {} for chat {}",
                    attempt, chat_id
                )))]
            } else {
                script.messages.into_iter().map(Ok).collect()
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }

    fn dialogs(&self) -> BoxStream<'_, Result<Dialog, SessionError>> {
        stream::iter(self.dialogs.iter())
            .map(move |step| {
                self.dialog_items.fetch_add(1, Ordering::SeqCst);
                match step {
                    DialogStep::Entry(dialog) => Ok(dialog.clone()),
                    DialogStep::RateLimit(wait) => Err(SessionError::RateLimited { wait: *wait }),
                    DialogStep::Fail(reason) => Err(SessionError::Transport(reason.clone())),
                }
            })
            .boxed()
    }

    async fn chat_info(&self, chat_id: i64) -> Result<ChatInfo, SessionError> {
        self.chats
            .get(&chat_id)
            .map(|script| ChatInfo {
                id: chat_id,
                title: script.title.clone(),
            })
            .ok_or_else(|| SessionError::NotFound(format!("chat {}", chat_id)))
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out one shared [`FakeSession`] for every identity.
#[derive(Debug)]
pub struct FakeSessionFactory {
    session: Arc<FakeSession>,
    fail_open: bool,
    opened: Mutex<Vec<String>>,
    forgotten: Mutex<Vec<String>>,
}

impl FakeSessionFactory {
    pub fn new(session: Arc<FakeSession>) -> Self {
        Self {
            session,
            fail_open: false,
            opened: Mutex::new(Vec::new()),
            forgotten: Mutex::new(Vec::new()),
        }
    }

    /// A factory whose `open` always fails with a transport error.
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new(Arc::new(FakeSession::new()))
        }
    }

    /// The shared session.
    pub fn session(&self) -> &Arc<FakeSession> {
        &self.session
    }

    /// Identities passed to `open`, in call order.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// Identities passed to `forget`, in call order.
    pub fn forgotten(&self) -> Vec<String> {
        self.forgotten.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SessionFactory for FakeSessionFactory {
    async fn open(&self, identity: &str) -> Result<Arc<dyn MessagingSession>, SessionError> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(identity.to_string());
        }
        if self.fail_open {
            return Err(SessionError::Transport(format!(
                "cannot open session for {}",
                identity
            )));
        }
        Ok(self.session.clone())
    }

    async fn forget(&self, identity: &str) -> Result<(), SessionError> {
        if let Ok(mut forgotten) = self.forgotten.lock() {
            forgotten.push(identity.to_string());
        }
        Ok(())
    }
}

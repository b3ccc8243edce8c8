//! User-facing digest flows.
//!
//! [`DigestService`] is what a bot front end calls for each command. Every
//! flow reports its result, or the reason it could not run, to the user
//! through the [`Notifier`] and also returns it to the caller.

use std::sync::Arc;

use digest_core::{MessagingSession, Notifier, SessionFactory, SummaryBackend};
use schedule_store::{ScheduleStore, StoreError, UserRecord};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::DigestConfig;
use crate::dialogs::{list_dialogs, DialogEntry};
use crate::dispatcher::{BatchReport, Dispatcher};
use crate::error::PipelineError;
use crate::messages;
use crate::summarizer::Summarizer;

/// Shortest accepted phone number, in digits.
const MIN_PHONE_DIGITS: usize = 7;
/// Longest accepted phone number, in digits.
const MAX_PHONE_DIGITS: usize = 15;

/// Registration, subscription and summarization flows for bot users.
pub struct DigestService {
    config: DigestConfig,
    store: Arc<ScheduleStore>,
    sessions: Arc<dyn SessionFactory>,
    notifier: Arc<dyn Notifier>,
    dispatcher: Dispatcher,
}

impl DigestService {
    pub fn new(
        config: DigestConfig,
        store: Arc<ScheduleStore>,
        sessions: Arc<dyn SessionFactory>,
        backend: Arc<dyn SummaryBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let summarizer = Summarizer::new(backend).with_cooldown(config.summary_cooldown);
        let dispatcher = Dispatcher::new(
            &config,
            Arc::clone(&store),
            Arc::clone(&sessions),
            summarizer,
            Arc::clone(&notifier),
        );

        Self {
            config,
            store,
            sessions,
            notifier,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn store(&self) -> &Arc<ScheduleStore> {
        &self.store
    }

    pub async fn is_registered(&self, user_id: i64) -> bool {
        self.store.contains(user_id).await
    }

    /// Register `user_id` with the phone number their session belongs to.
    pub async fn register_user(
        &self,
        user_id: i64,
        phone: &str,
    ) -> Result<UserRecord, PipelineError> {
        if self.store.contains(user_id).await {
            info!(user_id, "User already exists");
            return Err(self
                .reject(
                    user_id,
                    messages::USER_EXISTS,
                    PipelineError::Validation(format!("user {} already registered", user_id)),
                )
                .await);
        }

        let phone = phone.trim();
        if let Err(e) = validate_phone(phone) {
            return Err(self.reject(user_id, messages::INVALID_PHONE, e).await);
        }

        let record = UserRecord::new(user_id, phone);
        match self.store.insert_user(record.clone()).await {
            Ok(()) => {}
            Err(e @ StoreError::AlreadyExists { .. }) => {
                return Err(self.reject(user_id, messages::USER_EXISTS, e.into()).await)
            }
            Err(e) => return Err(e.into()),
        }

        self.notify(user_id, messages::REGISTERED).await;
        Ok(record)
    }

    /// Subscribe `user_id` to `chat_id`.
    ///
    /// Returns `false` when the chat was already subscribed.
    pub async fn add_chat_for_user(
        &self,
        user_id: i64,
        chat_id: i64,
    ) -> Result<bool, PipelineError> {
        match self.store.add_chat(user_id, chat_id).await {
            Ok(added) => {
                self.notify(user_id, messages::CHAT_ADDED).await;
                Ok(added)
            }
            Err(StoreError::NotFound { .. }) => {
                Err(self.unknown_user(user_id, messages::USER_NOT_REGISTERED).await)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Unsubscribe `user_id` from `chat_id`.
    ///
    /// Returns `false` when the chat was not subscribed.
    pub async fn remove_chat_for_user(
        &self,
        user_id: i64,
        chat_id: i64,
    ) -> Result<bool, PipelineError> {
        match self.store.remove_chat(user_id, chat_id).await {
            Ok(removed) => {
                self.notify(user_id, messages::CHAT_REMOVED).await;
                Ok(removed)
            }
            Err(StoreError::NotFound { .. }) => {
                Err(self.unknown_user(user_id, messages::USER_NOT_REGISTERED).await)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Show the user the first dialogs of their account.
    pub async fn list_dialogs(&self, user_id: i64) -> Result<Vec<DialogEntry>, PipelineError> {
        let record = self.registered(user_id, messages::USER_INFO_NOT_FOUND).await?;

        let session = match self.sessions.open(&record.identity_phone).await {
            Ok(session) => session,
            Err(e) => {
                error!(user_id, "Failed to open session for chat list: {}", e);
                return Err(self.reject(user_id, messages::LIST_FAILED, e.into()).await);
            }
        };

        let result = self.list_into_placeholder(user_id, session.as_ref()).await;
        close_session(user_id, session.as_ref()).await;
        result
    }

    async fn list_into_placeholder(
        &self,
        user_id: i64,
        session: &dyn MessagingSession,
    ) -> Result<Vec<DialogEntry>, PipelineError> {
        let placeholder = self.notifier.send(user_id, messages::LIST_PENDING).await?;

        match list_dialogs(session, self.config.dialog_limit, self.config.dialog_pacing).await {
            Ok(entries) => {
                let text = if entries.is_empty() {
                    messages::LIST_EMPTY.to_string()
                } else {
                    join_lines(entries.iter().map(ToString::to_string))
                };
                self.notifier.edit_or_keep(user_id, &placeholder, &text).await?;
                Ok(entries)
            }
            Err(e) => {
                error!(user_id, "Failed to list dialogs: {}", e);
                if let Err(notify_err) = self
                    .notifier
                    .edit_or_keep(user_id, &placeholder, messages::LIST_FAILED)
                    .await
                {
                    warn!(user_id, "Failed to report chat list error: {}", notify_err);
                }
                Err(e)
            }
        }
    }

    /// Show the user the chats they are subscribed to.
    pub async fn list_current_chats(&self, user_id: i64) -> Result<Vec<String>, PipelineError> {
        let record = self.registered(user_id, messages::USER_NOT_REGISTERED).await?;
        if record.chat_ids.is_empty() {
            self.notify(user_id, messages::CHATS_NOT_FOUND).await;
            return Ok(Vec::new());
        }

        let session = match self.sessions.open(&record.identity_phone).await {
            Ok(session) => session,
            Err(e) => {
                error!(user_id, "Failed to open session for chat titles: {}", e);
                return Err(self
                    .reject(user_id, messages::LIST_CURRENT_FAILED, e.into())
                    .await);
            }
        };

        let mut lines = Vec::with_capacity(record.chat_ids.len());
        let mut failure = None;
        for &chat_id in &record.chat_ids {
            match session.chat_info(chat_id).await {
                Ok(info) => lines.push(messages::chat_line(&info.display_title(), chat_id)),
                Err(e) => {
                    error!(user_id, chat_id, "Failed to resolve chat: {}", e);
                    failure = Some(PipelineError::from(e));
                    break;
                }
            }
        }
        close_session(user_id, session.as_ref()).await;

        if let Some(e) = failure {
            return Err(self.reject(user_id, messages::LIST_CURRENT_FAILED, e).await);
        }

        self.notifier
            .send(user_id, &join_lines(lines.iter().cloned()))
            .await?;
        Ok(lines)
    }

    /// Forget the user's session and delete their record.
    pub async fn remove_user(&self, user_id: i64) -> Result<(), PipelineError> {
        let record = self.registered(user_id, messages::USER_INFO_NOT_FOUND).await?;

        if let Err(e) = self.sessions.forget(&record.identity_phone).await {
            warn!(user_id, "Failed to discard session: {}", e);
        }
        self.store.remove_user(user_id).await?;

        self.notify(user_id, messages::USER_REMOVED).await;
        Ok(())
    }

    /// Summarize the user's chats over the window given in `hours_text`.
    pub async fn summarize_now(
        &self,
        user_id: i64,
        hours_text: &str,
        cancel: CancellationToken,
    ) -> Result<BatchReport, PipelineError> {
        let record = self.registered(user_id, messages::USER_INFO_NOT_FOUND).await?;
        if record.chat_ids.is_empty() {
            return Err(self
                .reject(
                    user_id,
                    messages::CHATS_NOT_FOUND,
                    PipelineError::NotFound(format!("chats for user {}", user_id)),
                )
                .await);
        }

        let hours = match parse_hours(hours_text) {
            Ok(hours) => hours,
            Err(e) => return Err(self.reject(user_id, messages::INVALID_HOURS, e).await),
        };

        self.dispatcher.run_batch(user_id, hours, cancel).await
    }

    async fn registered(&self, user_id: i64, notice: &str) -> Result<UserRecord, PipelineError> {
        match self.store.get(user_id).await {
            Ok(record) => Ok(record),
            Err(StoreError::NotFound { .. }) => Err(self.unknown_user(user_id, notice).await),
            Err(e) => Err(e.into()),
        }
    }

    async fn unknown_user(&self, user_id: i64, notice: &str) -> PipelineError {
        warn!(user_id, "User not found");
        self.reject(
            user_id,
            notice,
            PipelineError::NotFound(format!("user {}", user_id)),
        )
        .await
    }

    /// Tell the user `notice` and hand back `err`.
    async fn reject(&self, user_id: i64, notice: &str, err: PipelineError) -> PipelineError {
        self.notify(user_id, notice).await;
        err
    }

    async fn notify(&self, user_id: i64, text: &str) {
        if let Err(e) = self.notifier.send(user_id, text).await {
            warn!(user_id, "Failed to notify user: {}", e);
        }
    }
}

async fn close_session(user_id: i64, session: &dyn MessagingSession) {
    if let Err(e) = session.close().await {
        warn!(user_id, "Failed to close session: {}", e);
    }
}

fn join_lines(lines: impl Iterator<Item = String>) -> String {
    lines.collect::<Vec<_>>().join("\n")
}

/// Parse a requested window in hours.
///
/// Accepts positive integers; clamping to the ceiling happens later.
pub fn parse_hours(text: &str) -> Result<i64, PipelineError> {
    match text.trim().parse::<i64>() {
        Ok(hours) if hours > 0 => Ok(hours),
        _ => Err(PipelineError::Validation(format!(
            "{:?} is not a positive number of hours",
            text
        ))),
    }
}

/// Check that `phone` is `+` followed by 7 to 15 digits.
pub fn validate_phone(phone: &str) -> Result<(), PipelineError> {
    let digits = phone.strip_prefix('+').unwrap_or_default();
    let valid = (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit());

    if valid {
        Ok(())
    } else {
        Err(PipelineError::Validation(format!(
            "{:?} is not an international phone number",
            phone
        )))
    }
}

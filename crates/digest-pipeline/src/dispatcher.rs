//! Bounded, fault-isolated summarization batches.
//!
//! A batch fans out one job per subscribed chat. Jobs from every batch
//! draw from a single permit pool, so at most `max_concurrent_jobs` of
//! them fetch and summarize at once no matter how many users trigger
//! batches concurrently. Each job keeps its permit across its retry and
//! releases it when the task finishes or is aborted.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use digest_core::{MessageHandle, MessagingSession, Notifier, SessionFactory};
use schedule_store::ScheduleStore;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::DigestConfig;
use crate::error::PipelineError;
use crate::fetcher::{clamp_hours, fetch_transcript};
use crate::messages;
use crate::summarizer::Summarizer;

/// How far `last_invocation` is backdated before a batch starts.
pub const INVOCATION_BACKDATE_MINUTES: i64 = 3;

/// Extra history fetched beyond the requested window.
pub const WINDOW_SLACK_MINUTES: i64 = 5;

/// Attempts a job makes before giving up.
pub const MAX_ATTEMPTS: u32 = 2;

/// Final state of one job.
#[derive(Debug)]
pub enum JobOutcome {
    /// The chat was summarized.
    Summary(String),
    /// The window held no renderable messages.
    NoMessages,
    /// Every attempt failed; carries the last error.
    Failed(PipelineError),
}

impl JobOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, JobOutcome::Failed(_))
    }
}

/// Outcome of one chat's job.
#[derive(Debug)]
pub struct JobReport {
    pub chat_id: i64,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    pub outcome: JobOutcome,
}

/// Outcomes of every job in a batch.
#[derive(Debug)]
pub struct BatchReport {
    pub user_id: i64,
    /// The window after clamping.
    pub hours: i64,
    pub jobs: Vec<JobReport>,
}

impl BatchReport {
    /// Report for a single chat.
    pub fn job(&self, chat_id: i64) -> Option<&JobReport> {
        self.jobs.iter().find(|job| job.chat_id == chat_id)
    }

    /// Jobs that ended in failure.
    pub fn failed(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(|job| job.outcome.is_failed())
    }
}

#[derive(Debug, Clone, Copy)]
struct Job {
    user_id: i64,
    chat_id: i64,
    since: DateTime<Utc>,
    hours: i64,
}

/// Runs summarization batches under a shared permit pool.
///
/// Cloning is cheap; clones share the same pool.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<ScheduleStore>,
    sessions: Arc<dyn SessionFactory>,
    summarizer: Summarizer,
    notifier: Arc<dyn Notifier>,
    permits: Arc<Semaphore>,
    model: Arc<str>,
    phrase: Arc<str>,
}

impl Dispatcher {
    /// Create a dispatcher with a fresh permit pool sized from `config`.
    pub fn new(
        config: &DigestConfig,
        store: Arc<ScheduleStore>,
        sessions: Arc<dyn SessionFactory>,
        summarizer: Summarizer,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            sessions,
            summarizer,
            notifier,
            permits: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
            model: Arc::from(config.model.as_str()),
            phrase: Arc::from(config.phrase.as_str()),
        }
    }

    /// Permits not currently held by a job.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Summarize every chat `user_id` subscribes to over the last `hours`.
    ///
    /// `hours` is clamped to 48; zero or negative values are rejected with
    /// [`PipelineError::Validation`] before anything is recorded. Failed
    /// jobs are reported to the user and recorded in the returned report;
    /// they never fail the batch. Errors
    /// while preparing the batch are reported to the user with a single
    /// generic notice and returned. Cancelling `cancel` aborts every job
    /// still running and returns [`PipelineError::Cancelled`].
    pub async fn run_batch(
        &self,
        user_id: i64,
        hours: i64,
        cancel: CancellationToken,
    ) -> Result<BatchReport, PipelineError> {
        if hours <= 0 {
            warn!(user_id, hours, "Rejected summarization batch");
            return Err(PipelineError::Validation(format!(
                "hours must be positive, got {}",
                hours
            )));
        }
        let hours = clamp_hours(hours);
        info!(user_id, hours, "Starting summarization batch");

        match self.dispatch(user_id, hours, &cancel).await {
            Ok(report) => {
                info!(
                    user_id,
                    jobs = report.jobs.len(),
                    failed = report.failed().count(),
                    "Summarization batch finished"
                );
                Ok(report)
            }
            Err(PipelineError::Cancelled) => {
                warn!(user_id, "Summarization batch cancelled");
                Err(PipelineError::Cancelled)
            }
            Err(e) => {
                error!(user_id, "Summarization batch failed: {}", e);
                self.notify(user_id, messages::BATCH_FAILED).await;
                Err(e)
            }
        }
    }

    async fn dispatch(
        &self,
        user_id: i64,
        hours: i64,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, PipelineError> {
        let now = Utc::now();
        let record = self
            .store
            .record_invocation(
                user_id,
                now - ChronoDuration::minutes(INVOCATION_BACKDATE_MINUTES),
            )
            .await?;

        let session = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            opened = self.sessions.open(&record.identity_phone) => opened?,
        };

        let since =
            now - ChronoDuration::hours(hours) - ChronoDuration::minutes(WINDOW_SLACK_MINUTES);

        let mut jobs = JoinSet::new();
        for chat_id in record.chat_ids.iter().copied() {
            let dispatcher = self.clone();
            let session = Arc::clone(&session);
            let job = Job {
                user_id,
                chat_id,
                since,
                hours,
            };
            jobs.spawn(async move { dispatcher.run_job(session, job).await });
        }
        debug!(user_id, jobs = jobs.len(), "Spawned summarization jobs");

        let mut reports = Vec::with_capacity(jobs.len());
        let settled = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    jobs.abort_all();
                    while jobs.join_next().await.is_some() {}
                    break Err(PipelineError::Cancelled);
                }
                next = jobs.join_next() => match next {
                    Some(Ok(report)) => reports.push(report),
                    Some(Err(e)) => error!(user_id, "Summarization job did not complete: {}", e),
                    None => break Ok(()),
                },
            }
        };

        if let Err(e) = session.close().await {
            warn!(user_id, "Failed to close session: {}", e);
        }
        settled?;

        for job in reports.iter().filter(|job| job.outcome.is_failed()) {
            if let JobOutcome::Failed(e) = &job.outcome {
                error!(
                    user_id,
                    chat_id = job.chat_id,
                    attempts = job.attempts,
                    "Chat could not be summarized: {}",
                    e
                );
            }
        }

        Ok(BatchReport {
            user_id,
            hours,
            jobs: reports,
        })
    }

    async fn run_job(self, session: Arc<dyn MessagingSession>, job: Job) -> JobReport {
        let Job {
            user_id, chat_id, ..
        } = job;

        let _permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                return JobReport {
                    chat_id,
                    attempts: 0,
                    outcome: JobOutcome::Failed(PipelineError::Unexpected(
                        "permit pool closed".to_string(),
                    )),
                }
            }
        };

        let mut attempt = 1;
        loop {
            debug!(user_id, chat_id, attempt, "Summarizing chat");
            match self.attempt(session.as_ref(), &job).await {
                Ok(outcome) => {
                    info!(user_id, chat_id, attempt, "Summarized chat");
                    return JobReport {
                        chat_id,
                        attempts: attempt,
                        outcome,
                    };
                }
                Err(e) if attempt < MAX_ATTEMPTS && e.is_retryable() => {
                    warn!(user_id, chat_id, attempt, "Summarization attempt failed: {}", e);
                    self.notify(user_id, messages::JOB_RETRYING).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(user_id, chat_id, attempt, "Summarization job failed: {}", e);
                    self.notify(user_id, messages::JOB_FAILED).await;
                    return JobReport {
                        chat_id,
                        attempts: attempt,
                        outcome: JobOutcome::Failed(e),
                    };
                }
            }
        }
    }

    /// One fetch, summarize and report pass over a chat.
    async fn attempt(
        &self,
        session: &dyn MessagingSession,
        job: &Job,
    ) -> Result<JobOutcome, PipelineError> {
        let title = session.chat_info(job.chat_id).await?.display_title();
        let placeholder = self
            .notifier
            .send(job.user_id, &messages::generating(&title))
            .await?;

        let transcript = fetch_transcript(session, job.chat_id, job.since).await?;
        if transcript.is_empty() {
            self.report(job, &placeholder, &messages::no_messages(&title, job.hours))
                .await?;
            return Ok(JobOutcome::NoMessages);
        }

        let summary = match self
            .summarizer
            .summarize(&transcript, &self.model, &self.phrase)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                if let Err(notify_err) = self
                    .notifier
                    .edit_or_keep(job.user_id, &placeholder, messages::SUMMARY_FAILED)
                    .await
                {
                    warn!(
                        user_id = job.user_id,
                        chat_id = job.chat_id,
                        "Failed to report summary error: {}",
                        notify_err
                    );
                }
                return Err(e.into());
            }
        };

        self.report(job, &placeholder, &messages::summary(job.hours, &title, &summary))
            .await?;
        Ok(JobOutcome::Summary(summary))
    }

    async fn report(
        &self,
        job: &Job,
        placeholder: &MessageHandle,
        text: &str,
    ) -> Result<(), PipelineError> {
        self.notifier
            .edit_or_keep(job.user_id, placeholder, text)
            .await?;
        Ok(())
    }

    async fn notify(&self, user_id: i64, text: &str) {
        if let Err(e) = self.notifier.send(user_id, text).await {
            warn!(user_id, "Failed to notify user: {}", e);
        }
    }
}

//! Batch dispatch scenarios against in-memory collaborators.
//!
//! Run with: cargo test -p digest-pipeline --test dispatcher_tests

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use digest_core::HistoryMessage;
use digest_pipeline::{messages, DigestConfig, Dispatcher, JobOutcome, PipelineError, Summarizer};
use mock_provider::{
    CountingBackend, FakeSession, FakeSessionFactory, RecordingNotifier, StallingBackend,
    SummaryBackend,
};
use schedule_store::{ScheduleStore, UserRecord};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const SUMMARY: &str = "generated summary";
const USER: i64 = 1;

struct Harness<B = CountingBackend> {
    _dir: TempDir,
    store: Arc<ScheduleStore>,
    session: Arc<FakeSession>,
    backend: Arc<B>,
    notifier: Arc<RecordingNotifier>,
    dispatcher: Dispatcher,
}

fn minutes_ago(minutes: i64) -> chrono::DateTime<Utc> {
    Utc::now() - ChronoDuration::minutes(minutes)
}

fn title(chat_id: i64) -> String {
    format!("Chat {}", chat_id)
}

/// Add a chat with one recent message.
fn with_active_chat(session: FakeSession, chat_id: i64) -> FakeSession {
    session.with_chat(
        chat_id,
        title(chat_id),
        vec![HistoryMessage::text(1, minutes_ago(30), "alice", "hello")],
    )
}

async fn harness<B: SummaryBackend + 'static>(
    factory: FakeSessionFactory,
    backend: B,
    users: &[(i64, Vec<i64>)],
) -> Harness<B> {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ScheduleStore::open(dir.path().join("users.json")).await.unwrap());
    for (user_id, chats) in users {
        store
            .insert_user(
                UserRecord::new(*user_id, format!("+1555000{:04}", user_id))
                    .with_chats(chats.iter().copied()),
            )
            .await
            .unwrap();
    }

    let config = DigestConfig::builder().model("test-model").build().unwrap();
    let session = Arc::clone(factory.session());
    let backend = Arc::new(backend);
    let notifier = Arc::new(RecordingNotifier::new());
    let summarizer = Summarizer::new(backend.clone()).with_cooldown(config.summary_cooldown);
    let dispatcher = Dispatcher::new(
        &config,
        Arc::clone(&store),
        Arc::new(factory),
        summarizer,
        notifier.clone(),
    );

    Harness {
        _dir: dir,
        store,
        session,
        backend,
        notifier,
        dispatcher,
    }
}

fn factory(session: FakeSession) -> FakeSessionFactory {
    FakeSessionFactory::new(Arc::new(session))
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_summary_and_empty_chat() {
    let session = with_active_chat(FakeSession::new(), 101).with_chat(
        102,
        title(102),
        vec![HistoryMessage::text(1, minutes_ago(30 * 60), "bob", "stale")],
    );
    let h = harness(
        factory(session),
        CountingBackend::replying(SUMMARY),
        &[(USER, vec![101, 102])],
    )
    .await;

    let report = h
        .dispatcher
        .run_batch(USER, 24, CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(
        report.job(101).unwrap().outcome,
        JobOutcome::Summary(ref s) if s == SUMMARY
    ));
    assert!(matches!(report.job(102).unwrap().outcome, JobOutcome::NoMessages));
    assert_eq!(h.backend.calls(), 1);

    let texts = h.notifier.messages_for(USER);
    assert_eq!(texts.len(), 2);
    assert!(texts.contains(&messages::summary(24, "Chat 101", SUMMARY)));
    assert!(texts.contains(&messages::no_messages("Chat 102", 24)));
}

#[tokio::test(start_paused = true)]
async fn test_invocation_is_backdated_before_dispatch() {
    let h = harness(
        factory(with_active_chat(FakeSession::new(), 7)),
        CountingBackend::replying(SUMMARY),
        &[(USER, vec![7])],
    )
    .await;
    let before = Utc::now();

    h.dispatcher
        .run_batch(USER, 1, CancellationToken::new())
        .await
        .unwrap();

    let recorded = h.store.get(USER).await.unwrap().last_invocation.unwrap();
    assert!(recorded <= before - ChronoDuration::minutes(3) + ChronoDuration::seconds(5));
    assert!(recorded >= before - ChronoDuration::minutes(4));

    let reloaded = ScheduleStore::open(h.store.path()).await.unwrap();
    assert!(reloaded.get(USER).await.unwrap().last_invocation.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_hours_are_clamped() {
    let h = harness(
        factory(with_active_chat(FakeSession::new(), 7)),
        CountingBackend::replying(SUMMARY),
        &[(USER, vec![7])],
    )
    .await;

    let report = h
        .dispatcher
        .run_batch(USER, 100, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.hours, 48);
    assert!(h
        .notifier
        .messages_for(USER)
        .contains(&messages::summary(48, "Chat 7", SUMMARY)));
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_is_bounded() {
    let chats: Vec<i64> = (1..=12).collect();
    let session = chats
        .iter()
        .fold(FakeSession::new(), |s, &id| with_active_chat(s, id))
        .with_delay(Duration::from_millis(100));
    let h = harness(
        factory(session),
        CountingBackend::replying(SUMMARY),
        &[(USER, chats.clone())],
    )
    .await;

    let report = h
        .dispatcher
        .run_batch(USER, 24, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.jobs.len(), 12);
    assert_eq!(report.failed().count(), 0);
    assert_eq!(h.session.max_active(), 5);
    assert_eq!(h.dispatcher.available_permits(), 5);
    assert!(h.session.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_permits_are_shared_across_batches() {
    let session = (1..=12)
        .fold(FakeSession::new(), with_active_chat)
        .with_delay(Duration::from_millis(100));
    let h = harness(
        factory(session),
        CountingBackend::replying(SUMMARY),
        &[(1, (1..=6).collect()), (2, (7..=12).collect())],
    )
    .await;

    let other = h.dispatcher.clone();
    let (first, second) = tokio::join!(
        h.dispatcher.run_batch(1, 24, CancellationToken::new()),
        other.run_batch(2, 24, CancellationToken::new())
    );

    assert_eq!(first.unwrap().jobs.len(), 6);
    assert_eq!(second.unwrap().jobs.len(), 6);
    assert_eq!(h.session.max_active(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_retry_then_succeed() {
    let session = with_active_chat(FakeSession::new(), 5).with_history_failures(5, 1);
    let h = harness(
        factory(session),
        CountingBackend::replying(SUMMARY),
        &[(USER, vec![5])],
    )
    .await;

    let report = h
        .dispatcher
        .run_batch(USER, 24, CancellationToken::new())
        .await
        .unwrap();

    let job = report.job(5).unwrap();
    assert_eq!(job.attempts, 2);
    assert!(matches!(job.outcome, JobOutcome::Summary(_)));
    assert_eq!(h.session.history_calls(5), 2);
    assert_eq!(h.notifier.count_text(messages::JOB_RETRYING), 1);
    assert_eq!(
        h.notifier.count_text(&messages::summary(24, "Chat 5", SUMMARY)),
        1
    );
    assert_eq!(h.notifier.count_text(messages::JOB_FAILED), 0);
}

#[tokio::test(start_paused = true)]
async fn test_retry_then_fail_leaves_siblings_alone() {
    let session = [1, 2, 3]
        .into_iter()
        .fold(FakeSession::new(), with_active_chat)
        .with_history_failures(2, 2);
    let h = harness(
        factory(session),
        CountingBackend::replying(SUMMARY),
        &[(USER, vec![1, 2, 3])],
    )
    .await;

    let report = h
        .dispatcher
        .run_batch(USER, 24, CancellationToken::new())
        .await
        .unwrap();

    let failed = report.job(2).unwrap();
    assert_eq!(failed.attempts, 2);
    assert!(matches!(
        failed.outcome,
        JobOutcome::Failed(PipelineError::Transport(_))
    ));
    assert_eq!(h.session.history_calls(2), 2);

    for chat_id in [1, 3] {
        let job = report.job(chat_id).unwrap();
        assert_eq!(job.attempts, 1);
        assert!(matches!(job.outcome, JobOutcome::Summary(_)));
    }

    assert_eq!(h.notifier.count_text(messages::JOB_RETRYING), 1);
    assert_eq!(h.notifier.count_text(messages::JOB_FAILED), 1);
    assert_eq!(h.notifier.count_text(messages::BATCH_FAILED), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_chat_is_not_retried() {
    let h = harness(
        factory(FakeSession::new()),
        CountingBackend::replying(SUMMARY),
        &[(USER, vec![404])],
    )
    .await;

    let report = h
        .dispatcher
        .run_batch(USER, 24, CancellationToken::new())
        .await
        .unwrap();

    let job = report.job(404).unwrap();
    assert_eq!(job.attempts, 1);
    assert!(matches!(
        job.outcome,
        JobOutcome::Failed(PipelineError::NotFound(_))
    ));
    assert_eq!(h.notifier.count_text(messages::JOB_RETRYING), 0);
    assert_eq!(h.notifier.count_text(messages::JOB_FAILED), 1);
}

#[tokio::test(start_paused = true)]
async fn test_summarizer_exhaustion_is_reported() {
    let h = harness(
        factory(with_active_chat(FakeSession::new(), 9)),
        CountingBackend::replying(SUMMARY).failing_first(10),
        &[(USER, vec![9])],
    )
    .await;

    let report = h
        .dispatcher
        .run_batch(USER, 24, CancellationToken::new())
        .await
        .unwrap();

    assert!(report.job(9).unwrap().outcome.is_failed());
    // Two summarizer calls per attempt.
    assert_eq!(h.backend.calls(), 4);

    let texts = h.notifier.messages_for(USER);
    assert_eq!(
        texts
            .iter()
            .filter(|t| t.as_str() == messages::SUMMARY_FAILED)
            .count(),
        2
    );
    assert_eq!(h.notifier.count_text(messages::JOB_FAILED), 1);
}

#[tokio::test(start_paused = true)]
async fn test_session_failure_sends_one_generic_notice() {
    let h = harness(
        FakeSessionFactory::failing(),
        CountingBackend::replying(SUMMARY),
        &[(USER, vec![1, 2])],
    )
    .await;

    let result = h
        .dispatcher
        .run_batch(USER, 24, CancellationToken::new())
        .await;

    assert!(matches!(result, Err(PipelineError::Transport(_))));
    assert_eq!(h.notifier.notices().len(), 1);
    assert_eq!(h.notifier.count_text(messages::BATCH_FAILED), 1);
    assert_eq!(h.backend.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_user_fails_batch() {
    let h = harness(
        factory(FakeSession::new()),
        CountingBackend::replying(SUMMARY),
        &[],
    )
    .await;

    let result = h
        .dispatcher
        .run_batch(USER, 24, CancellationToken::new())
        .await;

    assert!(matches!(result, Err(PipelineError::Store(_))));
    assert_eq!(h.notifier.count_text(messages::BATCH_FAILED), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_releases_every_permit() {
    let session = (1..=8)
        .fold(FakeSession::new(), with_active_chat)
        .with_delay(Duration::from_secs(3600));
    let h = harness(
        factory(session),
        CountingBackend::replying(SUMMARY),
        &[(USER, (1..=8).collect())],
    )
    .await;

    let cancel = CancellationToken::new();
    let dispatcher = h.dispatcher.clone();
    let batch = tokio::spawn({
        let cancel = cancel.clone();
        async move { dispatcher.run_batch(USER, 24, cancel).await }
    });

    while h.session.active() < 5 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.dispatcher.available_permits(), 0);
    assert_eq!(h.session.active(), 5);

    cancel.cancel();
    let result = batch.await.unwrap();

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert_eq!(h.dispatcher.available_permits(), 5);
    assert_eq!(h.session.active(), 0);
    assert_eq!(h.backend.calls(), 0);
    assert_eq!(h.notifier.count_text(messages::JOB_FAILED), 0);
    assert_eq!(h.notifier.count_text(messages::BATCH_FAILED), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_summary_releases_permits() {
    let h = harness(
        factory((1..=8).fold(FakeSession::new(), with_active_chat)),
        StallingBackend::new(CountingBackend::replying(SUMMARY), Duration::from_secs(3600)),
        &[(USER, (1..=8).collect())],
    )
    .await;

    let cancel = CancellationToken::new();
    let dispatcher = h.dispatcher.clone();
    let batch = tokio::spawn({
        let cancel = cancel.clone();
        async move { dispatcher.run_batch(USER, 24, cancel).await }
    });

    while h.backend.in_flight() < 5 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.dispatcher.available_permits(), 0);
    assert_eq!(h.backend.started(), 5);

    cancel.cancel();
    let result = batch.await.unwrap();

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert_eq!(h.dispatcher.available_permits(), 5);
    assert_eq!(h.backend.in_flight(), 0);
    assert_eq!(h.backend.inner().calls(), 0);
    assert_eq!(h.notifier.count_text(messages::JOB_FAILED), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_cooldown_releases_permits() {
    let h = harness(
        factory((1..=8).fold(FakeSession::new(), with_active_chat)),
        CountingBackend::replying(SUMMARY).failing_first(100),
        &[(USER, (1..=8).collect())],
    )
    .await;

    let cancel = CancellationToken::new();
    let dispatcher = h.dispatcher.clone();
    let batch = tokio::spawn({
        let cancel = cancel.clone();
        async move { dispatcher.run_batch(USER, 24, cancel).await }
    });

    // Every permit holder has failed once and is waiting out the cooldown.
    while h.backend.calls() < 5 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.dispatcher.available_permits(), 0);

    cancel.cancel();
    let result = batch.await.unwrap();

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert_eq!(h.dispatcher.available_permits(), 5);
    assert_eq!(h.backend.calls(), 5);
    assert_eq!(h.notifier.count_text(messages::JOB_FAILED), 0);
}

#[tokio::test(start_paused = true)]
async fn test_non_positive_hours_are_rejected_before_store_write() {
    let h = harness(
        factory(with_active_chat(FakeSession::new(), 7)),
        CountingBackend::replying(SUMMARY),
        &[(USER, vec![7])],
    )
    .await;

    for hours in [0, -3, i64::MIN] {
        let result = h
            .dispatcher
            .run_batch(USER, hours, CancellationToken::new())
            .await;
        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }

    assert!(h.store.get(USER).await.unwrap().last_invocation.is_none());
    assert!(!h.session.is_closed());
    assert_eq!(h.backend.calls(), 0);
    assert!(h.notifier.notices().is_empty());
}

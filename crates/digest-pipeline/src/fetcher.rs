//! Chat history fetching.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use digest_core::{MessagingSession, SessionError, Transcript, TranscriptLine};
use futures::StreamExt;
use tracing::{debug, warn};

use crate::error::PipelineError;

/// Hard ceiling on how far back any fetch may reach.
pub const MAX_WINDOW_HOURS: i64 = 48;

/// Sender name used when a message has none.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// Clamp a requested window to [`MAX_WINDOW_HOURS`].
pub fn clamp_hours(hours: i64) -> i64 {
    hours.min(MAX_WINDOW_HOURS)
}

/// Fetch a chat's transcript back to `since`, measured against the current time.
pub async fn fetch_transcript(
    session: &dyn MessagingSession,
    chat_id: i64,
    since: DateTime<Utc>,
) -> Result<Transcript, PipelineError> {
    fetch_transcript_at(session, chat_id, since, Utc::now()).await
}

/// Fetch a chat's transcript as seen at `now`.
///
/// The walk stops at the first message older than `since` or older than
/// [`MAX_WINDOW_HOURS`] before `now`. Undated messages and messages
/// without renderable content are skipped. Rate-limit signals are waited
/// out; any other provider error aborts the fetch.
pub async fn fetch_transcript_at(
    session: &dyn MessagingSession,
    chat_id: i64,
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Transcript, PipelineError> {
    let ceiling = now - ChronoDuration::hours(MAX_WINDOW_HOURS);
    let lower_bound = since.max(ceiling);

    let mut history = session.chat_history(chat_id);
    let mut lines = Vec::new();

    while let Some(item) = history.next().await {
        let message = match item {
            Ok(message) => message,
            Err(SessionError::RateLimited { wait }) => {
                warn!(chat_id, "History walk rate limited, waiting {:?}", wait);
                tokio::time::sleep(wait).await;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let Some(timestamp) = message.date else {
            debug!(chat_id, message_id = message.id, "Skipping undated message");
            continue;
        };
        if timestamp < lower_bound {
            break;
        }

        let Some(text) = message.render_body() else {
            continue;
        };
        let sender = message
            .sender
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

        lines.push(TranscriptLine {
            timestamp,
            sender,
            text,
        });
    }

    lines.reverse();
    debug!(chat_id, lines = lines.len(), "Fetched transcript");
    Ok(Transcript::from_lines(lines))
}

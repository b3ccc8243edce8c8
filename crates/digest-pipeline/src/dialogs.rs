//! Dialog listing.

use std::fmt;
use std::time::Duration;

use digest_core::{MessagingSession, SessionError};
use futures::StreamExt;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::messages;

/// A named chat from the user's dialog list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogEntry {
    pub name: String,
    pub chat_id: i64,
}

impl fmt::Display for DialogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&messages::chat_line(&self.name, self.chat_id))
    }
}

/// Enumerate up to `limit` named dialogs.
///
/// Entries without a usable name are skipped and do not count toward the
/// limit. After every accepted entry the lister pauses for `pacing`. A
/// rate-limit signal is waited out and the walk resumes where it stopped;
/// any other error aborts the listing.
pub async fn list_dialogs(
    session: &dyn MessagingSession,
    limit: usize,
    pacing: Duration,
) -> Result<Vec<DialogEntry>, PipelineError> {
    let mut dialogs = session.dialogs();
    let mut accepted = Vec::new();

    while accepted.len() < limit {
        let dialog = match dialogs.next().await {
            None => break,
            Some(Ok(dialog)) => dialog,
            Some(Err(SessionError::RateLimited { wait })) => {
                warn!("Dialog listing rate limited, waiting {:?}", wait);
                tokio::time::sleep(wait).await;
                continue;
            }
            Some(Err(e)) => return Err(e.into()),
        };

        let Some(name) = dialog.display_name() else {
            debug!(chat_id = dialog.chat_id, "Skipping unclassified dialog");
            continue;
        };
        accepted.push(DialogEntry {
            name,
            chat_id: dialog.chat_id,
        });
        tokio::time::sleep(pacing).await;
    }

    debug!(count = accepted.len(), "Listed dialogs");
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use digest_core::{Dialog, DialogKind};
    use mock_provider::{DialogStep, FakeSession};
    use tokio::time::Instant;

    fn group(chat_id: i64, title: &str) -> DialogStep {
        DialogStep::Entry(Dialog {
            chat_id,
            kind: DialogKind::Group {
                title: Some(title.to_string()),
            },
        })
    }

    fn unknown(chat_id: i64) -> DialogStep {
        DialogStep::Entry(Dialog {
            chat_id,
            kind: DialogKind::Unknown,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_counts_accepted_entries_only() {
        let session = FakeSession::new().with_dialogs(vec![
            unknown(1),
            group(2, "A"),
            unknown(3),
            group(4, "B"),
            group(5, "C"),
        ]);

        let entries = list_dialogs(&session, 2, Duration::from_secs(1)).await.unwrap();

        let ids: Vec<i64> = entries.iter().map(|e| e.chat_id).collect();
        assert_eq!(ids, vec![2, 4]);
        assert_eq!(session.dialog_items(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_resumes_in_place() {
        let session = FakeSession::new().with_dialogs(vec![
            group(1, "A"),
            DialogStep::RateLimit(Duration::from_secs(5)),
            group(2, "B"),
            group(3, "C"),
        ]);

        let start = Instant::now();
        let entries = list_dialogs(&session, 10, Duration::from_secs(1)).await.unwrap();
        let elapsed = start.elapsed();

        let ids: Vec<i64> = entries.iter().map(|e| e.chat_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        // Three pacing pauses plus the five-second wait.
        assert!(elapsed >= Duration::from_secs(8));
        assert!(elapsed < Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_aborts() {
        let session = FakeSession::new().with_dialogs(vec![
            group(1, "A"),
            DialogStep::Fail("connection reset".to_string()),
            group(2, "B"),
        ]);

        let result = list_dialogs(&session, 10, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(PipelineError::Transport(_))));
    }

    #[test]
    fn test_display_line() {
        let entry = DialogEntry {
            name: "Deleted Account".to_string(),
            chat_id: 42,
        };
        assert_eq!(entry.to_string(), "Deleted Account: `42`");
    }
}

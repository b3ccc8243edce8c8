//! Recording notifier implementation.

use std::sync::Mutex;

use digest_core::{async_trait, MessageHandle, Notifier, NotifyError};

/// One message operation observed by a [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Sent {
        recipient: i64,
        message_id: i64,
        text: String,
    },
    Edited {
        recipient: i64,
        message_id: i64,
        text: String,
    },
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Sent { text, .. } | Notice::Edited { text, .. } => text,
        }
    }
}

#[derive(Debug, Default)]
struct Inbox {
    next_id: i64,
    notices: Vec<Notice>,
    /// Current text of every sent message, in send order.
    messages: Vec<(MessageHandle, String)>,
}

/// A notifier that keeps every message in memory.
///
/// Edits that would not change a message's text fail with
/// [`NotifyError::NotModified`], like real bot APIs do.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    inbox: Mutex<Inbox>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send and edit, in call order.
    pub fn notices(&self) -> Vec<Notice> {
        self.inbox
            .lock()
            .map(|inbox| inbox.notices.clone())
            .unwrap_or_default()
    }

    /// Current text of each message sent to `recipient`, in send order.
    pub fn messages_for(&self, recipient: i64) -> Vec<String> {
        self.inbox
            .lock()
            .map(|inbox| {
                inbox
                    .messages
                    .iter()
                    .filter(|(handle, _)| handle.chat_id == recipient)
                    .map(|(_, text)| text.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of notices whose text equals `text`.
    pub fn count_text(&self, text: &str) -> usize {
        self.notices().iter().filter(|n| n.text() == text).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: i64, text: &str) -> Result<MessageHandle, NotifyError> {
        let mut inbox = self
            .inbox
            .lock()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        inbox.next_id += 1;
        let handle = MessageHandle {
            chat_id: recipient,
            message_id: inbox.next_id,
        };
        inbox.notices.push(Notice::Sent {
            recipient,
            message_id: handle.message_id,
            text: text.to_string(),
        });
        inbox.messages.push((handle, text.to_string()));
        Ok(handle)
    }

    async fn edit(
        &self,
        recipient: i64,
        handle: &MessageHandle,
        text: &str,
    ) -> Result<(), NotifyError> {
        let mut inbox = self
            .inbox
            .lock()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let current = inbox
            .messages
            .iter_mut()
            .find(|(h, _)| h == handle)
            .ok_or_else(|| NotifyError::Rejected(format!("message {} not found", handle.message_id)))?;
        if current.1 == text {
            return Err(NotifyError::NotModified);
        }
        current.1 = text.to_string();

        inbox.notices.push(Notice::Edited {
            recipient,
            message_id: handle.message_id,
            text: text.to_string(),
        });
        Ok(())
    }
}

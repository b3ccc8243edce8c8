//! Store models.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

/// Value written into the legacy `hours` slot of new records.
pub const HOURS_SENTINEL: i64 = 666;

/// A registered user and their chat subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Bot-side user id, primary key of the store.
    pub user_id: i64,
    /// Legacy field, kept for file compatibility.
    pub hours: i64,
    /// Set (backdated) right before each summarization batch.
    pub last_invocation: Option<DateTime<Utc>>,
    /// Phone number the messaging session is derived from.
    pub identity_phone: String,
    /// Chats subscribed for summarization.
    pub chat_ids: BTreeSet<i64>,
}

impl UserRecord {
    /// Create a fresh record with no subscriptions.
    pub fn new(user_id: i64, identity_phone: impl Into<String>) -> Self {
        Self {
            user_id,
            hours: HOURS_SENTINEL,
            last_invocation: None,
            identity_phone: identity_phone.into(),
            chat_ids: BTreeSet::new(),
        }
    }

    /// Add chats to the record.
    pub fn with_chats(mut self, chats: impl IntoIterator<Item = i64>) -> Self {
        self.chat_ids.extend(chats);
        self
    }
}

//! Per-user subscription operations.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::Result;
use crate::models::UserRecord;
use crate::ScheduleStore;

impl ScheduleStore {
    /// Register a new user.
    ///
    /// Fails with `AlreadyExists` when the id is taken.
    pub async fn insert_user(&self, record: UserRecord) -> Result<()> {
        let user_id = record.user_id;
        self.insert(record).await?;
        info!(user_id, "Registered user");
        Ok(())
    }

    /// Delete a user and return the removed record.
    pub async fn remove_user(&self, user_id: i64) -> Result<UserRecord> {
        let removed = self.remove(user_id).await?;
        info!(user_id, "Removed user");
        Ok(removed)
    }

    /// Subscribe a user to a chat.
    ///
    /// Returns `false` when the chat was already subscribed.
    pub async fn add_chat(&self, user_id: i64, chat_id: i64) -> Result<bool> {
        let added = self
            .update(user_id, |record| record.chat_ids.insert(chat_id))
            .await?;
        info!(user_id, chat_id, added, "Added chat for user");
        Ok(added)
    }

    /// Unsubscribe a user from a chat.
    ///
    /// Returns `false` when the chat was not subscribed.
    pub async fn remove_chat(&self, user_id: i64, chat_id: i64) -> Result<bool> {
        let removed = self
            .update(user_id, |record| record.chat_ids.remove(&chat_id))
            .await?;
        info!(user_id, chat_id, removed, "Removed chat for user");
        Ok(removed)
    }

    /// Record when a summarization batch started for a user.
    pub async fn record_invocation(&self, user_id: i64, at: DateTime<Utc>) -> Result<UserRecord> {
        self.update(user_id, |record| {
            record.last_invocation = Some(at);
            record.clone()
        })
        .await
    }
}

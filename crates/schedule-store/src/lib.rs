//! JSON file persistence for chat digest subscriptions.
//!
//! The store maps bot user ids to [`UserRecord`]s and keeps them in a single
//! JSON file. Every mutation is applied and flushed under one lock, so two
//! concurrent commands for the same user can never interleave a change with
//! another command's write.
//!
//! # Example
//!
//! ```no_run
//! use schedule_store::{ScheduleStore, UserRecord};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ScheduleStore::open("users_config.json").await?;
//!
//!     store.insert_user(UserRecord::new(42, "+15551234567")).await?;
//!     store.add_chat(42, -1001234567890).await?;
//!
//!     let record = store.get(42).await?;
//!     assert!(record.chat_ids.contains(&-1001234567890));
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod models;
pub mod user;

pub use error::{Result, StoreError};
pub use models::{UserRecord, HOURS_SENTINEL};

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// File-backed mapping from user id to subscription record.
#[derive(Debug)]
pub struct ScheduleStore {
    path: PathBuf,
    records: Mutex<BTreeMap<i64, UserRecord>>,
}

impl ScheduleStore {
    /// Load the store from `path`.
    ///
    /// A missing file is not an error: the store starts empty and the file
    /// is created immediately.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let records = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                let value: serde_json::Value = serde_json::from_str(&raw)?;
                let records = codec::decode_store(&value)?;
                info!("Loaded {} user records from {}", records.len(), path.display());
                records.into_iter().map(|r| (r.user_id, r)).collect()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("No previous store at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        let store = Self {
            path,
            records: Mutex::new(records),
        };

        {
            let records = store.records.lock().await;
            if records.is_empty() {
                store.write_file(&records).await?;
            }
        }

        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a user's record.
    pub async fn get(&self, user_id: i64) -> Result<UserRecord> {
        self.records
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .ok_or_else(|| not_found(user_id))
    }

    /// Check whether a user is registered.
    pub async fn contains(&self, user_id: i64) -> bool {
        self.records.lock().await.contains_key(&user_id)
    }

    /// List all records ordered by user id.
    pub async fn list(&self) -> Vec<UserRecord> {
        self.records.lock().await.values().cloned().collect()
    }

    /// Atomically read, modify and persist one user's record.
    ///
    /// The closure runs on a copy; the in-memory state only changes once the
    /// file has been written, so a failed flush leaves both untouched.
    pub async fn update<F, T>(&self, user_id: i64, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut UserRecord) -> T,
    {
        let mut records = self.records.lock().await;
        let mut record = records
            .get(&user_id)
            .cloned()
            .ok_or_else(|| not_found(user_id))?;

        let output = mutate(&mut record);

        let mut next = records.clone();
        next.insert(user_id, record);
        self.write_file(&next).await?;
        *records = next;

        Ok(output)
    }

    /// Insert a record for a new user and persist it.
    pub(crate) async fn insert(&self, record: UserRecord) -> Result<()> {
        let mut records = self.records.lock().await;
        if records.contains_key(&record.user_id) {
            return Err(StoreError::AlreadyExists {
                entity: "User",
                id: record.user_id.to_string(),
            });
        }

        let mut next = records.clone();
        next.insert(record.user_id, record);
        self.write_file(&next).await?;
        *records = next;
        Ok(())
    }

    /// Remove a user's record and persist the change.
    pub(crate) async fn remove(&self, user_id: i64) -> Result<UserRecord> {
        let mut records = self.records.lock().await;
        let mut next = records.clone();
        let removed = next.remove(&user_id).ok_or_else(|| not_found(user_id))?;
        self.write_file(&next).await?;
        *records = next;
        Ok(removed)
    }

    /// Overwrite the backing file with `records`.
    ///
    /// Writes to a sibling temp file first and renames it into place.
    async fn write_file(&self, records: &BTreeMap<i64, UserRecord>) -> Result<()> {
        let value = codec::encode_store(records.values());
        let body = serde_json::to_string_pretty(&value)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!("Flushed {} user records to {}", records.len(), self.path.display());
        Ok(())
    }
}

fn not_found(user_id: i64) -> StoreError {
    StoreError::NotFound {
        entity: "User",
        id: user_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_creates_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let store = ScheduleStore::open(&path).await.unwrap();
        assert!(store.list().await.is_empty());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.trim(), "{}");
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let store = ScheduleStore::open(&path).await.unwrap();
        store
            .insert_user(UserRecord::new(1, "+15550000001").with_chats([10, -20, 30]))
            .await
            .unwrap();
        store.insert_user(UserRecord::new(2, "+15550000002")).await.unwrap();
        store
            .record_invocation(1, chrono::Utc::now())
            .await
            .unwrap();
        let before = store.list().await;

        let reloaded = ScheduleStore::open(&path).await.unwrap();
        let after = reloaded.list().await;

        assert_eq!(before.len(), 2);
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(after.iter()) {
            assert_eq!(a.user_id, b.user_id);
            assert_eq!(a.hours, b.hours);
            assert_eq!(a.identity_phone, b.identity_phone);
            assert_eq!(a.chat_ids, b.chat_ids);
            // Timestamps are persisted with microsecond precision.
            assert_eq!(
                a.last_invocation.map(|t| t.timestamp_micros()),
                b.last_invocation.map(|t| t.timestamp_micros())
            );
        }
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScheduleStore::open(dir.path().join("users.json")).await.unwrap();

        let result = store.update(99, |r| r.hours = 1).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_loads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(
            &path,
            r#"{"5": [5, 666, null, "+15550000005", [1, 2, 2]]}"#,
        )
        .unwrap();

        let store = ScheduleStore::open(&path).await.unwrap();
        let record = store.get(5).await.unwrap();
        assert_eq!(record.identity_phone, "+15550000005");
        assert_eq!(record.chat_ids.len(), 2);
    }
}

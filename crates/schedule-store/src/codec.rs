//! On-disk record layout.
//!
//! Records are stored as positional JSON arrays:
//! `[user_id, hours, last_invocation_or_null, identity_phone, [chat_id, ...]]`.
//! The in-memory [`UserRecord`] is decoupled from that order; only the
//! functions in this module know the slot positions.

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};
use crate::models::{UserRecord, HOURS_SENTINEL};

/// Known record layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// Five-slot positional array.
    V1,
}

/// Layout used for every record written by this crate.
pub const CURRENT_LAYOUT: RecordLayout = RecordLayout::V1;

const V1_SLOTS: usize = 5;

impl RecordLayout {
    /// Detect the layout of a stored value.
    pub fn detect(value: &Value) -> Option<Self> {
        match value {
            Value::Array(slots) if slots.len() == V1_SLOTS => Some(RecordLayout::V1),
            _ => None,
        }
    }
}

/// Encode a record using [`CURRENT_LAYOUT`].
pub fn encode_record(record: &UserRecord) -> Value {
    let last_invocation = record
        .last_invocation
        .map(|at| Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, false)))
        .unwrap_or(Value::Null);

    Value::Array(vec![
        Value::from(record.user_id),
        Value::from(record.hours),
        last_invocation,
        Value::String(record.identity_phone.clone()),
        Value::Array(record.chat_ids.iter().map(|id| Value::from(*id)).collect()),
    ])
}

/// Decode the record stored under `key`.
pub fn decode_record(key: &str, value: &Value) -> Result<UserRecord> {
    let invalid = |reason: String| StoreError::InvalidRecord {
        key: key.to_string(),
        reason,
    };

    let slots = match (RecordLayout::detect(value), value) {
        (Some(RecordLayout::V1), Value::Array(slots)) => slots,
        _ => return Err(invalid("expected a 5-element array".to_string())),
    };

    let user_id = slots[0]
        .as_i64()
        .ok_or_else(|| invalid("user id is not an integer".to_string()))?;
    if key.parse::<i64>().ok() != Some(user_id) {
        return Err(invalid("key does not match user id".to_string()));
    }

    // Older writers stored null here.
    let hours = slots[1].as_i64().unwrap_or(HOURS_SENTINEL);

    let last_invocation = match &slots[2] {
        Value::Null => None,
        Value::String(raw) => Some(
            DateTime::parse_from_rfc3339(raw)
                .map_err(|e| invalid(format!("bad timestamp {raw:?}: {e}")))?
                .with_timezone(&Utc),
        ),
        _ => return Err(invalid("last invocation is neither null nor a string".to_string())),
    };

    let identity_phone = slots[3]
        .as_str()
        .ok_or_else(|| invalid("identity phone is not a string".to_string()))?
        .to_string();

    let chat_ids = slots[4]
        .as_array()
        .ok_or_else(|| invalid("chat ids are not an array".to_string()))?
        .iter()
        .map(|id| {
            id.as_i64()
                .ok_or_else(|| invalid(format!("chat id {id} is not an integer")))
        })
        .collect::<Result<BTreeSet<i64>>>()?;

    Ok(UserRecord {
        user_id,
        hours,
        last_invocation,
        identity_phone,
        chat_ids,
    })
}

/// Encode a set of records as the top-level store object.
pub fn encode_store<'a>(records: impl IntoIterator<Item = &'a UserRecord>) -> Value {
    let map: Map<String, Value> = records
        .into_iter()
        .map(|record| (record.user_id.to_string(), encode_record(record)))
        .collect();
    Value::Object(map)
}

/// Decode the top-level store object.
pub fn decode_store(value: &Value) -> Result<Vec<UserRecord>> {
    let map = value.as_object().ok_or_else(|| StoreError::InvalidRecord {
        key: String::new(),
        reason: "store is not a JSON object".to_string(),
    })?;
    map.iter()
        .map(|(key, value)| decode_record(key, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_encode_positional_order() {
        let record = UserRecord {
            user_id: 42,
            hours: 666,
            last_invocation: Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()),
            identity_phone: "+15551234567".to_string(),
            chat_ids: [-100, 7].into_iter().collect(),
        };
        assert_eq!(
            encode_record(&record),
            json!([42, 666, "2024-05-01T08:00:00.000000+00:00", "+15551234567", [-100, 7]])
        );
    }

    #[test]
    fn test_decode_legacy_values() {
        let value = json!([7, null, "2024-05-01T08:00:00.123456+00:00", "+4912345678", [3, 3, 1]]);
        let record = decode_record("7", &value).unwrap();
        assert_eq!(record.hours, HOURS_SENTINEL);
        assert_eq!(record.chat_ids.len(), 2);
        assert!(record.last_invocation.is_some());
    }

    #[test]
    fn test_decode_rejects_key_mismatch() {
        let value = json!([7, 666, null, "+4912345678", []]);
        let result = decode_record("8", &value);
        assert!(matches!(result, Err(StoreError::InvalidRecord { .. })));
    }

    #[test]
    fn test_decode_rejects_unknown_layout() {
        let value = json!({"user_id": 7});
        assert!(RecordLayout::detect(&value).is_none());
        assert!(decode_record("7", &value).is_err());
    }
}

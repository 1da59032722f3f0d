use crate::domain::{FieldValue, LogEntry, MESSAGE_KEY, TIME_KEY};
use serde::Serialize;
use std::collections::BTreeMap;

/// Logstash JSON event schema version.
pub const LOGSTASH_VERSION: u8 = 1;

pub const TIMESTAMP_FIELD: &str = "@timestamp";
pub const VERSION_FIELD: &str = "@version";
pub const MESSAGE_FIELD: &str = "message";

/// A log entry reshaped into the Logstash event schema.
///
/// The reserved keys are emitted first, followed by the remaining fields in
/// lexical order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireEntry {
    #[serde(rename = "@timestamp")]
    pub timestamp: FieldValue,
    #[serde(rename = "@version")]
    pub version: u8,
    pub message: FieldValue,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl WireEntry {
    /// Moves `time` to `@timestamp` and `msg` to `message`, copying every
    /// other field as is. Fields that would shadow a reserved key are dropped.
    pub fn from_entry(entry: LogEntry) -> Self {
        let mut fields: BTreeMap<String, FieldValue> = entry.into_fields().into_iter().collect();

        let timestamp = fields.remove(TIME_KEY).unwrap_or(FieldValue::Null);
        let message = fields.remove(MESSAGE_KEY).unwrap_or(FieldValue::Null);
        // User fields never override the reserved keys.
        fields.retain(|key, _| !is_reserved(key));

        Self {
            timestamp,
            version: LOGSTASH_VERSION,
            message,
            fields,
        }
    }
}

fn is_reserved(key: &str) -> bool {
    matches!(key, TIMESTAMP_FIELD | VERSION_FIELD | MESSAGE_FIELD)
}

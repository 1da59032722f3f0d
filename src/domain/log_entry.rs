use super::error::EntryParseError;
use super::field_value::FieldValue;
use std::collections::HashMap;

/// Key holding the entry's timestamp.
pub const TIME_KEY: &str = "time";
/// Key holding the entry's human-readable message.
pub const MESSAGE_KEY: &str = "msg";

/// A structured service-log entry as produced by the host pipeline.
///
/// Well-formed entries always carry [`TIME_KEY`] and [`MESSAGE_KEY`]; every
/// other field is opaque to the appender.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogEntry {
    fields: HashMap<String, FieldValue>,
}

impl LogEntry {
    pub fn new(time: impl Into<FieldValue>, msg: impl Into<FieldValue>) -> Self {
        Self::default()
            .with_field(TIME_KEY, time)
            .with_field(MESSAGE_KEY, msg)
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> HashMap<String, FieldValue> {
        self.fields
    }

    /// Parses a single JSON object, e.g. one line of a service's stdout.
    pub fn from_json(line: &str) -> Result<Self, EntryParseError> {
        match serde_json::from_str::<serde_json::Value>(line)? {
            serde_json::Value::Object(fields) => Ok(fields
                .into_iter()
                .map(|(key, value)| (key, FieldValue::from(value)))
                .collect()),
            _ => Err(EntryParseError::NotAnObject),
        }
    }
}

impl From<HashMap<String, FieldValue>> for LogEntry {
    fn from(fields: HashMap<String, FieldValue>) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, FieldValue)> for LogEntry {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

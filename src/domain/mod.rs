//! Domain layer for servicelog-logstash.
//!
//! Contains the types shared across all modules:
//! - `LogEntry`: a structured service-log entry
//! - `FieldValue`: an opaque field value
//! - `AppenderError`: per-entry delivery failure

pub mod error;
pub mod field_value;
pub mod log_entry;

pub use error::{AppenderError, EntryParseError};
pub use field_value::FieldValue;
pub use log_entry::{LogEntry, MESSAGE_KEY, TIME_KEY};

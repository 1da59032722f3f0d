use crate::format::SerializationError;
use std::io;
use thiserror::Error;

/// Failure to deliver a single entry. Never escapes the appender loop.
#[derive(Error, Debug)]
pub enum AppenderError {
    #[error("unable to marshal log entry: {0}")]
    Serialization(#[from] SerializationError),

    #[error("unable to write to Logstash server: {0}")]
    Transport(#[source] io::Error),
}

#[derive(Error, Debug)]
pub enum EntryParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("log entry must be a JSON object")]
    NotAnObject,
}

use super::wire_entry::WireEntry;
use thiserror::Error;

// Typical encoded event size; only used to pre-size the buffer.
const ESTIMATED_ENTRY_SIZE: usize = 256;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Encodes events as line-delimited JSON. Logstash reads its input line by
/// line, so every event is followed by exactly one `\n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineSerializer;

impl LineSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, entry: &WireEntry) -> Result<Vec<u8>, SerializationError> {
        let mut buffer = Vec::with_capacity(ESTIMATED_ENTRY_SIZE);
        serde_json::to_writer(&mut buffer, entry)?;
        buffer.push(b'\n');
        Ok(buffer)
    }
}

pub mod serialization;
pub mod wire_entry;

pub use serialization::{LineSerializer, SerializationError};
pub use wire_entry::{LOGSTASH_VERSION, WireEntry};

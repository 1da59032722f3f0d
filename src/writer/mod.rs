//! Drop-aware writer pipeline.
//!
//! Every stage implements [`LogWriter`]: accept one encoded entry and either
//! deliver it, reject it as an [`OverflowKind`], or report a transport
//! failure. Limiting layers wrap an inner writer and never block or queue.

pub mod rate_limit;
pub mod size_limit;
pub mod transport;

pub use rate_limit::RateLimitWriter;
pub use size_limit::SizeLimitWriter;
pub use transport::{Connection, Protocol, TransportWriter, UnknownProtocol};

use std::fmt;
use std::io;
use thiserror::Error;

pub trait LogWriter: Send {
    /// Writes one complete entry. Partial delivery is reported as an error.
    fn write_entry(&mut self, buf: &[u8]) -> Result<(), WriteError>;
}

impl<T: LogWriter + ?Sized> LogWriter for Box<T> {
    fn write_entry(&mut self, buf: &[u8]) -> Result<(), WriteError> {
        (**self).write_entry(buf)
    }
}

/// Why a limiter rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverflowKind {
    RateExceeded,
    SizeExceeded,
}

impl OverflowKind {
    pub const ALL: [OverflowKind; 2] = [OverflowKind::RateExceeded, OverflowKind::SizeExceeded];

    pub fn as_str(self) -> &'static str {
        match self {
            OverflowKind::RateExceeded => "RateExceeded",
            OverflowKind::SizeExceeded => "SizeExceeded",
        }
    }
}

impl fmt::Display for OverflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("write rejected: {0}")]
    Overflow(OverflowKind),

    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

impl WriteError {
    /// Returns the overflow kind when the write was deliberately dropped.
    pub fn overflow(&self) -> Option<OverflowKind> {
        match self {
            WriteError::Overflow(kind) => Some(*kind),
            WriteError::Transport(_) => None,
        }
    }
}

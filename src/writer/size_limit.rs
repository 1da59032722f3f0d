use super::{LogWriter, OverflowKind, WriteError};
use std::num::NonZeroUsize;

/// Drops entries larger than `limit` bytes.
pub struct SizeLimitWriter<W> {
    inner: W,
    limit: NonZeroUsize,
}

impl<W: LogWriter> SizeLimitWriter<W> {
    pub fn new(inner: W, limit: NonZeroUsize) -> Self {
        Self { inner, limit }
    }
}

impl<W: LogWriter> LogWriter for SizeLimitWriter<W> {
    fn write_entry(&mut self, buf: &[u8]) -> Result<(), WriteError> {
        if buf.len() > self.limit.get() {
            return Err(WriteError::Overflow(OverflowKind::SizeExceeded));
        }
        self.inner.write_entry(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::TransportWriter;

    #[test]
    fn test_limit_is_inclusive() {
        let mut writer = SizeLimitWriter::new(
            TransportWriter::new(Vec::new()),
            NonZeroUsize::new(4).unwrap(),
        );

        writer.write_entry(b"abc\n").unwrap();
        let err = writer.write_entry(b"abcd\n").unwrap_err();

        assert_eq!(err.overflow(), Some(OverflowKind::SizeExceeded));
        assert_eq!(writer.inner.get_ref().as_slice(), b"abc\n");
    }
}

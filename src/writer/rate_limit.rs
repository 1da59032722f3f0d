use super::{LogWriter, OverflowKind, WriteError};
use std::num::NonZeroU32;
use std::time::Instant;

/// Drops entries written faster than `limit` per second.
///
/// Backed by a token bucket holding at most `limit` tokens and refilled at
/// `limit` tokens per second, so short bursts up to `limit` are accepted.
pub struct RateLimitWriter<W> {
    inner: W,
    bucket: TokenBucket,
}

impl<W: LogWriter> RateLimitWriter<W> {
    pub fn new(inner: W, limit: NonZeroU32) -> Self {
        Self {
            inner,
            bucket: TokenBucket::new(limit, Instant::now()),
        }
    }
}

impl<W: LogWriter> LogWriter for RateLimitWriter<W> {
    fn write_entry(&mut self, buf: &[u8]) -> Result<(), WriteError> {
        if !self.bucket.try_acquire(Instant::now()) {
            return Err(WriteError::Overflow(OverflowKind::RateExceeded));
        }
        self.inner.write_entry(buf)
    }
}

#[derive(Debug)]
struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(limit: NonZeroU32, now: Instant) -> Self {
        let capacity = f64::from(limit.get());
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec: capacity,
            last_refill: now,
        }
    }

    fn try_acquire(&mut self, now: Instant) -> bool {
        if now > self.last_refill {
            let elapsed = now.duration_since(self.last_refill).as_secs_f64();
            self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
            self.last_refill = now;
        }

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

use super::logstash::LogstashAppender;
use crate::app::ConfigError;
use crate::metrics::CounterRegistry;
use crate::writer::{LogWriter, RateLimitWriter, SizeLimitWriter, TransportWriter};
use std::io::Write;
use std::num::{NonZeroU32, NonZeroUsize};

/// A construction option. Each option wraps the writer built so far, so the
/// first option ends up innermost, next to the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppenderOption {
    /// Discard lines sent faster than this many per second.
    RateLimit(u32),
    /// Discard lines longer than this many bytes.
    SizeLimit(usize),
}

pub fn rate_limit(limit: u32) -> AppenderOption {
    AppenderOption::RateLimit(limit)
}

pub fn size_limit(size: usize) -> AppenderOption {
    AppenderOption::SizeLimit(size)
}

impl AppenderOption {
    pub fn apply(self, writer: Box<dyn LogWriter>) -> Result<Box<dyn LogWriter>, ConfigError> {
        match self {
            AppenderOption::RateLimit(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    ConfigError::InvalidConfig(format!(
                        "invalid config option: rate limit must be positive, got {limit}"
                    ))
                })?;
                Ok(Box::new(RateLimitWriter::new(writer, limit)))
            }
            AppenderOption::SizeLimit(size) => {
                let size = NonZeroUsize::new(size).ok_or_else(|| {
                    ConfigError::InvalidConfig(format!(
                        "invalid config option: size limit must be positive, got {size}"
                    ))
                })?;
                Ok(Box::new(SizeLimitWriter::new(writer, size)))
            }
        }
    }
}

pub struct AppenderBuilder {
    writer: Box<dyn LogWriter>,
    options: Vec<AppenderOption>,
    registry: CounterRegistry,
}

impl AppenderBuilder {
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self::from_log_writer(Box::new(TransportWriter::new(writer)))
    }

    fn from_log_writer(writer: Box<dyn LogWriter>) -> Self {
        Self {
            writer,
            options: Vec::new(),
            registry: CounterRegistry::global().clone(),
        }
    }

    pub fn rate_limit(self, limit: u32) -> Self {
        self.option(AppenderOption::RateLimit(limit))
    }

    pub fn size_limit(self, size: usize) -> Self {
        self.option(AppenderOption::SizeLimit(size))
    }

    pub fn option(mut self, option: AppenderOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = AppenderOption>,
    {
        self.options.extend(options);
        self
    }

    /// Registers the drop counters in `registry` instead of the global one.
    pub fn registry(mut self, registry: CounterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> Result<LogstashAppender, ConfigError> {
        let mut writer = self.writer;
        for option in self.options {
            writer = option.apply(writer)?;
        }
        LogstashAppender::from_parts(writer, &self.registry)
    }
}

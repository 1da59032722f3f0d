use super::Appender;
use super::options::{AppenderBuilder, AppenderOption};
use crate::app::ConfigError;
use crate::domain::{AppenderError, LogEntry};
use crate::format::{LineSerializer, WireEntry};
use crate::metrics::{CounterRegistry, MetricsError};
use crate::writer::{LogWriter, OverflowKind, WriteError};
use prometheus::IntCounter;
use std::io::Write;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Span, debug, error, warn};

pub const DROPPED_METRIC_PREFIX: &str = "servicelog.logstash.dropped";

/// Stable registry name of the counter tracking drops of `kind`.
pub fn dropped_metric_name(kind: OverflowKind) -> String {
    format!("{DROPPED_METRIC_PREFIX}.{kind}")
}

/// Outcome of a single entry that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Dropped(OverflowKind),
}

struct DroppedCounters {
    by_rate: IntCounter,
    by_size: IntCounter,
}

impl DroppedCounters {
    fn register(registry: &CounterRegistry) -> Result<Self, MetricsError> {
        Ok(Self {
            by_rate: registry
                .get_or_register_counter(&dropped_metric_name(OverflowKind::RateExceeded))?,
            by_size: registry
                .get_or_register_counter(&dropped_metric_name(OverflowKind::SizeExceeded))?,
        })
    }

    fn counter(&self, kind: OverflowKind) -> &IntCounter {
        match kind {
            OverflowKind::RateExceeded => &self.by_rate,
            OverflowKind::SizeExceeded => &self.by_size,
        }
    }
}

/// Sends service log entries to Logstash as line-delimited JSON events.
///
/// Entries rejected by a rate or size limit are counted and otherwise
/// ignored; every other failure is logged and the entry is dropped. Nothing
/// is retried.
pub struct LogstashAppender {
    writer: Box<dyn LogWriter>,
    serializer: LineSerializer,
    dropped: DroppedCounters,
}

impl LogstashAppender {
    /// Creates an appender writing to `writer`, wrapped by `options` in order.
    pub fn new<W, I>(writer: W, options: I) -> Result<Self, ConfigError>
    where
        W: Write + Send + 'static,
        I: IntoIterator<Item = AppenderOption>,
    {
        AppenderBuilder::new(writer).options(options).build()
    }

    pub fn builder<W>(writer: W) -> AppenderBuilder
    where
        W: Write + Send + 'static,
    {
        AppenderBuilder::new(writer)
    }

    pub(super) fn from_parts(
        writer: Box<dyn LogWriter>,
        registry: &CounterRegistry,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            writer,
            serializer: LineSerializer::new(),
            dropped: DroppedCounters::register(registry)?,
        })
    }

    pub fn dropped_by_rate(&self) -> u64 {
        self.dropped.by_rate.get()
    }

    pub fn dropped_by_size(&self) -> u64 {
        self.dropped.by_size.get()
    }

    /// Formats, encodes and writes one entry.
    pub fn send_entry(&mut self, entry: LogEntry) -> Result<Delivery, AppenderError> {
        let line = self.serializer.encode(&WireEntry::from_entry(entry))?;

        match self.writer.write_entry(&line) {
            Ok(()) => {
                debug!(
                    entry = %String::from_utf8_lossy(&line).trim_end(),
                    "Sent log entry to Logstash"
                );
                Ok(Delivery::Sent)
            }
            // Overflow is counted, never logged.
            Err(WriteError::Overflow(kind)) => {
                self.dropped.counter(kind).inc();
                Ok(Delivery::Dropped(kind))
            }
            Err(WriteError::Transport(e)) => Err(AppenderError::Transport(e)),
        }
    }

    fn handle(&mut self, entry: LogEntry) {
        if let Err(e) = self.send_entry(entry) {
            warn!(error = %e, "Error appending logs.");
        }
    }

    /// Runs the loop on the blocking pool, since every write is synchronous.
    pub fn spawn(mut self, mut entries: mpsc::Receiver<LogEntry>) -> JoinHandle<()> {
        let span = Span::current();
        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            while let Some(entry) = entries.blocking_recv() {
                self.handle(entry);
            }
            debug!("Log entry channel closed, Logstash appender finished");
        })
    }
}

impl Appender for LogstashAppender {
    /// Writes happen on the blocking pool; the returned future only waits
    /// for the loop to finish.
    fn append(self, entries: mpsc::Receiver<LogEntry>) -> impl Future<Output = ()> + Send {
        async move {
            if let Err(e) = self.spawn(entries).await {
                error!(error = %e, "Logstash appender task failed");
            }
        }
    }
}

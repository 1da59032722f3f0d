pub mod logstash;
pub mod options;

pub use logstash::{DROPPED_METRIC_PREFIX, Delivery, LogstashAppender, dropped_metric_name};
pub use options::{AppenderBuilder, AppenderOption, rate_limit, size_limit};

use crate::domain::LogEntry;
use tokio::sync::mpsc;

/// A destination for service log entries.
pub trait Appender: Send {
    /// Consumes entries until the channel is closed and drained. Failures of
    /// individual entries are handled inside and never end the loop.
    fn append(self, entries: mpsc::Receiver<LogEntry>) -> impl Future<Output = ()> + Send;
}

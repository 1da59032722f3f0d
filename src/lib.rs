#![deny(rust_2024_compatibility)]
#![allow(tail_expr_drop_order)] // edition is already 2024; this migration lint misfires inside tracing macros
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::missing_errors_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. AppenderError in appender module
    clippy::must_use_candidate,
    clippy::doc_markdown
)]

pub mod app;
pub mod appender;
pub mod domain;
pub mod format;
pub mod metrics;
pub mod writer;

// Re-export main types for easy access
pub use app::{ConfigError, LogstashConfig, logstash_writer_from_env};
pub use appender::{Appender, AppenderOption, LogstashAppender, rate_limit, size_limit};
pub use domain::{FieldValue, LogEntry};
pub use metrics::CounterRegistry;
pub use writer::{LogWriter, OverflowKind, WriteError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod logging;

pub use config::{
    Cli, ConfigError, LOGSTASH_CONFIG_PREFIX, LogFormat, LogLevel, LogstashConfig,
    logstash_writer_from_env,
};
pub use logging::{LoggingError, setup_logging};

use crate::appender::LogstashAppender;
use crate::domain::LogEntry;
use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Reads JSON log lines from stdin and forwards them to Logstash until
/// stdin is closed.
pub async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.validate()?;
    setup_logging(cli.log_level, cli.log_format)?;

    info!("Starting servicelog-logstash v{}", env!("CARGO_PKG_VERSION"));

    let config = LogstashConfig::from_env().context("unable to get address from env")?;
    let connection = config.connect()?;
    info!(protocol = %config.protocol, address = %config.address, "Connected to Logstash");

    let appender = LogstashAppender::new(connection, cli.appender_options())
        .context("invalid config option")?;

    let (tx, rx) = mpsc::channel(cli.channel_capacity);
    let handle = appender.spawn(rx);

    let forwarded = forward_lines(tokio::io::stdin(), tx)
        .await
        .context("failed to read log lines from stdin")?;
    handle.await.context("appender task failed")?;

    info!(forwarded, "Input closed, servicelog-logstash stopped");
    Ok(())
}

/// Parses each non-empty line as a log entry and queues it. Returns the
/// number of entries queued. Lines that are not JSON objects are skipped.
pub async fn forward_lines<R>(reader: R, entries: mpsc::Sender<LogEntry>) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut forwarded = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match LogEntry::from_json(&line) {
            Ok(entry) => {
                if entries.send(entry).await.is_err() {
                    warn!("Appender stopped, discarding remaining input");
                    break;
                }
                forwarded += 1;
            }
            Err(e) => warn!(error = %e, "Skipping malformed log line"),
        }
    }

    Ok(forwarded)
}

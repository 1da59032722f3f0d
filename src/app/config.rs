use crate::metrics::MetricsError;
use crate::writer::{Connection, Protocol};
use clap::{Parser, ValueEnum};
use std::io;
use thiserror::Error;

/// Prefix of the named configuration source holding the connection settings.
pub const LOGSTASH_CONFIG_PREFIX: &str = "allegro_executor_servicelog_logstash";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Environment error: {0}")]
    EnvError(String),
    #[error("Unable to connect to {protocol}://{address}: {source}")]
    Connection {
        protocol: Protocol,
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("Metrics registration failed: {0}")]
    Metrics(#[from] MetricsError),
}

/// Where to reach the Logstash server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogstashConfig {
    pub protocol: Protocol,
    pub address: String,
}

impl LogstashConfig {
    pub fn new(protocol: Protocol, address: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            protocol,
            address: address.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads `ALLEGRO_EXECUTOR_SERVICELOG_LOGSTASH_{PROTOCOL,ADDRESS}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Resolves the settings from any key/value source. Keys are the
    /// upper-cased prefix joined with the field name.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let protocol = required(&lookup, "PROTOCOL")?;
        let address = required(&lookup, "ADDRESS")?;

        let protocol = protocol.parse::<Protocol>().map_err(|e| {
            ConfigError::EnvError(format!("Invalid {}: {e}", source_key("PROTOCOL")))
        })?;

        let config = Self { protocol, address };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Logstash address must not be empty".to_string(),
            ));
        }

        if self.protocol != Protocol::Unix && !self.address.contains(':') {
            return Err(ConfigError::InvalidConfig(format!(
                "Logstash address '{}' must be in host:port form",
                self.address
            )));
        }

        Ok(())
    }

    /// Opens the connection eagerly.
    pub fn connect(&self) -> Result<Connection, ConfigError> {
        Connection::open(self.protocol, &self.address).map_err(|source| ConfigError::Connection {
            protocol: self.protocol,
            address: self.address.clone(),
            source,
        })
    }
}

/// Creates the Logstash connection from the environment.
pub fn logstash_writer_from_env() -> Result<Connection, ConfigError> {
    LogstashConfig::from_env()?.connect()
}

fn source_key(field: &str) -> String {
    format!("{}_{field}", LOGSTASH_CONFIG_PREFIX.to_uppercase())
}

fn required<F>(lookup: &F, field: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let key = source_key(field);
    match lookup(&key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::EnvError(format!(
            "required key {key} missing value"
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Command line of the forwarding binary. Connection settings always come
/// from the `allegro_executor_servicelog_logstash` environment source.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Maximum log lines per second sent to Logstash; faster lines are dropped
    #[arg(long, env = "LOGSTASH_RATE_LIMIT")]
    pub rate_limit: Option<u32>,

    /// Maximum size in bytes of a single encoded line; larger lines are dropped
    #[arg(long, env = "LOGSTASH_SIZE_LIMIT")]
    pub size_limit: Option<usize>,

    /// Capacity of the channel between stdin and the appender
    #[arg(long, env = "CHANNEL_CAPACITY", default_value = "1024")]
    pub channel_capacity: usize,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        cli.validate()?;
        Ok(cli)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "Channel capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Limits in the order they wrap the connection.
    pub fn appender_options(&self) -> Vec<crate::appender::AppenderOption> {
        use crate::appender::AppenderOption;

        let mut options = Vec::new();
        if let Some(limit) = self.rate_limit {
            options.push(AppenderOption::RateLimit(limit));
        }
        if let Some(size) = self.size_limit {
            options.push(AppenderOption::SizeLimit(size));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_from_source() {
        let config = LogstashConfig::from_source(source(&[
            ("ALLEGRO_EXECUTOR_SERVICELOG_LOGSTASH_PROTOCOL", "tcp"),
            ("ALLEGRO_EXECUTOR_SERVICELOG_LOGSTASH_ADDRESS", "logstash:5000"),
        ]))
        .unwrap();

        assert_eq!(config.protocol, Protocol::Tcp);
        assert_eq!(config.address, "logstash:5000");
    }

    #[test]
    fn test_missing_values_are_rejected() {
        let err = LogstashConfig::from_source(source(&[(
            "ALLEGRO_EXECUTOR_SERVICELOG_LOGSTASH_PROTOCOL",
            "udp",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("ALLEGRO_EXECUTOR_SERVICELOG_LOGSTASH_ADDRESS"));

        let err = LogstashConfig::from_source(source(&[
            ("ALLEGRO_EXECUTOR_SERVICELOG_LOGSTASH_PROTOCOL", " "),
            ("ALLEGRO_EXECUTOR_SERVICELOG_LOGSTASH_ADDRESS", "logstash:5000"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("ALLEGRO_EXECUTOR_SERVICELOG_LOGSTASH_PROTOCOL"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(LogstashConfig::from_source(source(&[
            ("ALLEGRO_EXECUTOR_SERVICELOG_LOGSTASH_PROTOCOL", "http"),
            ("ALLEGRO_EXECUTOR_SERVICELOG_LOGSTASH_ADDRESS", "logstash:5000"),
        ]))
        .is_err());

        assert!(matches!(
            LogstashConfig::new(Protocol::Tcp, "logstash"),
            Err(ConfigError::InvalidConfig(_))
        ));
        assert!(LogstashConfig::new(Protocol::Unix, "/var/run/logstash.sock").is_ok());
    }

    #[test]
    fn test_cli_orders_rate_before_size() {
        use crate::appender::AppenderOption;

        let cli = Cli::from_args([
            "servicelog-logstash",
            "--size-limit",
            "1024",
            "--rate-limit",
            "50",
        ])
        .unwrap();

        assert_eq!(
            cli.appender_options(),
            vec![AppenderOption::RateLimit(50), AppenderOption::SizeLimit(1024)]
        );
    }

    #[test]
    fn test_cli_rejects_zero_channel_capacity() {
        assert!(Cli::from_args(["servicelog-logstash", "--channel-capacity", "0"]).is_err());
    }
}

//! Logging setup and the data logger used by `read_all_and_log`.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{SessionError, SessionResult};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Target of events emitted by [`TracingLogger`].
pub const DATA_TARGET: &str = "serial_session::data";

/// Severity accepted by `read_all_and_log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Debug,
    Warn,
}

impl FromStr for LogLevel {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            "WARN" => Ok(LogLevel::Warn),
            _ => Err(SessionError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Warn => "WARN",
        })
    }
}

/// Receives data a session was asked to log.
pub trait DataLogger: Send {
    fn emit(&self, level: LogLevel, message: &str);
}

/// Forwards logged data to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl DataLogger for TracingLogger {
    fn emit(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!(target: DATA_TARGET, "{message}"),
            LogLevel::Debug => tracing::debug!(target: DATA_TARGET, "{message}"),
            LogLevel::Warn => tracing::warn!(target: DATA_TARGET, "{message}"),
        }
    }
}

/// Install the global `tracing` subscriber described by `config`.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this when
/// a subscriber is already installed leaves the existing one in place.
pub fn init_logging(config: &LoggingConfig) -> SessionResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| SessionError::invalid_value("logging.level", e))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // try_init fails only when a global subscriber exists already.
    let _ = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    Ok(())
}

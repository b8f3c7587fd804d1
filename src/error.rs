//! Session-level error type.
//!
//! Every operation on a [`SerialSession`](crate::SerialSession) either fully
//! succeeds or returns one of these. Messages are stable so test harnesses
//! can assert on them.

use crate::port::PortError;
use thiserror::Error;

/// Convenient Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors reported by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid port locator: '{0}'")]
    InvalidLocator(String),

    #[error("Port already exists: {0}")]
    DuplicatePort(String),

    #[error("No such port: {0}")]
    PortNotFound(String),

    #[error("No current port")]
    NoCurrentPort,

    #[error("Port is closed.")]
    PortClosed,

    #[error("Port is open.")]
    PortOpen,

    #[error("Wrong parameter name: {0}")]
    UnknownParameter(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidParameterValue { name: String, value: String },

    #[error("Invalid loglevel: {0}")]
    InvalidLogLevel(String),

    /// Read bytes differ from the expected bytes. Both sides are rendered
    /// as hex pairs.
    #[error("'{actual}'(read) != '{expected}'(data)")]
    DataMismatch { actual: String, expected: String },

    #[error("Matching port does not exist: {0}")]
    NoMatchingDevice(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Text cannot be represented in the selected encoding.
    #[error("Cannot encode data with {encoding}: {reason}")]
    InvalidData { encoding: String, reason: String },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Port does not match: expected '{expected}', current '{actual}'")]
    CurrentPortMismatch { expected: String, actual: String },

    #[error("{line} should be {} but {}.", on_off(.expected), on_off(.actual))]
    LineMismatch {
        line: &'static str,
        expected: bool,
        actual: bool,
    },

    #[error("{0}")]
    BufferMismatch(&'static str),

    #[error("Write timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Transport error: {0}")]
    Transport(PortError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn on_off(level: &bool) -> &'static str {
    if *level {
        "On"
    } else {
        "Off"
    }
}

impl SessionError {
    /// Create an InvalidParameterValue error.
    pub fn invalid_value(name: impl Into<String>, value: impl std::fmt::Display) -> Self {
        Self::InvalidParameterValue {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

impl From<PortError> for SessionError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotOpen => Self::PortClosed,
            PortError::Unsupported(feature) => Self::UnsupportedFeature(feature),
            PortError::Timeout(duration) => Self::Timeout(duration),
            other => Self::Transport(other),
        }
    }
}

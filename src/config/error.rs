//! Errors raised while loading, validating or saving configuration.

use crate::error::SessionError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write configuration file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A session setting the session itself would refuse at startup.
    #[error("Invalid session setting '{key}': {source}")]
    InvalidSetting {
        key: String,
        #[source]
        source: SessionError,
    },

    #[error("Invalid value in environment variable '{var}': {message}")]
    Env { var: String, message: String },

    /// `save` on a loader that was not loaded from, or saved to, a file.
    #[error("No configuration file path is known; use save_to")]
    NoPath,
}

impl ConfigError {
    pub fn invalid_setting(key: impl Into<String>, source: SessionError) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            source,
        }
    }

    pub fn env(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::encoding::Encoding;
use crate::parameter::Parameter;
use crate::state::validate_locator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Session initialisation
    pub session: SessionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check every value that would otherwise only fail when a session is built.
    pub fn validate(&self) -> ConfigResult<()> {
        Encoding::from_name(&self.session.encoding)
            .map_err(|e| ConfigError::invalid_setting("session.encoding", e))?;

        for (key, raw) in &self.session.defaults {
            if let Ok(parameter) = Parameter::from_name(key) {
                parameter.coerce(raw).map_err(|e| {
                    ConfigError::invalid_setting(format!("session.defaults.{key}"), e)
                })?;
            }
        }

        if let Some(port) = &self.session.port {
            validate_locator(port).map_err(|e| ConfigError::invalid_setting("session.port", e))?;
        }
        Ok(())
    }
}

/// Session section: what a freshly built session starts with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Default encoding name
    pub encoding: String,
    /// Port added (and made current) when the session is built
    pub port: Option<String>,
    /// Overrides for the default connection parameters. Unknown keys are ignored.
    pub defaults: Map<String, Value>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::default().name().to_string(),
            port: None,
            defaults: Map::new(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive: "trace", "debug", "info", "warn", "error" or a full `EnvFilter` string
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

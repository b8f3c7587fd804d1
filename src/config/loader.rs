//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, LogFormat};
use crate::parameter::Parameter;
use directories::ProjectDirs;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_SESSION";

/// Config file name
const CONFIG_FILE_NAME: &str = "serial-session.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_SESSION_CONFIG";

/// Application name used for the platform config directory.
const APP_NAME: &str = "serial-session";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SERIAL_SESSION_CONFIG` environment variable (explicit path)
    /// 2. `./serial-session.toml` (current directory)
    /// 3. `serial-session.toml` in the platform config directory
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if apply_env_overrides(&mut config).is_err() || config.validate().is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to file.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self.config_path.as_ref().ok_or(ConfigError::NoPath)?;

        save_to_file(&self.config, path)
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }

    /// Reload configuration from file (if path is set).
    pub fn reload(&mut self) -> ConfigResult<()> {
        if let Some(ref path) = self.config_path {
            let mut config = load_from_file(path)?;
            apply_env_overrides(&mut config)?;
            config.validate()?;
            self.config = config;
        }
        Ok(())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        debug!(path = %path.display(), "{CONFIG_PATH_ENV} points at a missing file");
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    if let Some(app_config) = get_default_config_path() {
        if app_config.exists() {
            return Some(app_config);
        }
    }

    // 4. No config file found - will use defaults
    None
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(path = %path.display(), "loading configuration");
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `SERIAL_SESSION_<KEY>`
/// For example:
/// - `SERIAL_SESSION_ENCODING=ascii`
/// - `SERIAL_SESSION_LOG_FORMAT=json`
/// - `SERIAL_SESSION_DEFAULT_BAUDRATE=115200`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Session overrides
    if let Ok(val) = std::env::var(format!("{}_ENCODING", ENV_PREFIX)) {
        config.session.encoding = val;
    }
    if let Ok(val) = std::env::var(format!("{}_PORT", ENV_PREFIX)) {
        config.session.port = Some(val);
    }

    // Default parameter overrides, validated together with the file values
    for parameter in Parameter::ALL {
        let var = format!("{}_DEFAULT_{}", ENV_PREFIX, parameter.name().to_uppercase());
        if let Ok(val) = std::env::var(&var) {
            parameter
                .coerce(&Value::String(val.clone()))
                .map_err(|e| ConfigError::env(&var, e.to_string()))?;
            config
                .session
                .defaults
                .insert(parameter.name().to_string(), Value::String(val));
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var(format!("{}_LOG_LEVEL", ENV_PREFIX)) {
        config.logging.level = val;
    }
    if let Ok(val) = std::env::var(format!("{}_LOG_FORMAT", ENV_PREFIX)) {
        config.logging.format = val.parse::<LogFormat>().map_err(|message| {
            ConfigError::env(format!("{}_LOG_FORMAT", ENV_PREFIX), message)
        })?;
    }

    Ok(())
}

/// Get the default config directory for creating new config files.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

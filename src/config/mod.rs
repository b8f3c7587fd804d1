//! Configuration module for serial sessions.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_SESSION_CONFIG` environment variable (explicit path)
//! 2. `./serial-session.toml` (current directory)
//! 3. The platform configuration directory (`~/.config/serial-session/` on
//!    Linux, `%APPDATA%\serial-session\config\` on Windows)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! - `SERIAL_SESSION_ENCODING=ascii`
//! - `SERIAL_SESSION_PORT=loop://`
//! - `SERIAL_SESSION_LOG_LEVEL=debug`, `SERIAL_SESSION_LOG_FORMAT=json`
//! - `SERIAL_SESSION_DEFAULT_<PARAMETER>`, e.g. `SERIAL_SESSION_DEFAULT_BAUDRATE=115200`
//!
//! # Example
//!
//! ```toml
//! [session]
//! encoding = "hexlify"
//! port = "loop://"
//!
//! [session.defaults]
//! baudrate = 115200
//! timeout = 0.5
//!
//! [logging]
//! level = "debug"
//! format = "compact"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, SessionConfig};

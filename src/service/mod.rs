//! Service layer for serial sessions.
//!
//! A [`SerialSession`] owns everything one caller works with: the ordered
//! port registry and its current-port pointer, the default connection
//! settings, and the default encoding. Every operation resolves its target
//! port (explicit locator, or the current port for `None`/`"_"`) and either
//! fully succeeds or returns a [`SessionError`].
//!
//! # Architecture
//!
//! ```text
//! caller ──> SerialSession ──> PortRegistry ──> Box<dyn SerialPortAdapter>
//!                 │
//!                 ├──> DefaultSettings (used when a port is added)
//!                 ├──> PortOpener / DeviceEnumerator / DataLogger
//!                 └──> read / lines (operations on the resolved port)
//! ```
//!
//! # Example
//! ```
//! use serial_session::service::{AddPortOptions, SerialSession};
//!
//! let mut session = SerialSession::new();
//! session.add_port("loop://", AddPortOptions::default())?;
//! session.write_data("01 02 0A", None, None)?;
//! assert_eq!(session.read_until(None, None, None, None)?, "01 02 0A");
//! # Ok::<(), serial_session::error::SessionError>(())
//! ```

mod lines;
mod read;

pub use lines::Line;

use crate::config::SessionConfig;
use crate::defaults::DefaultSettings;
use crate::encoding::Encoding;
use crate::error::{SessionError, SessionResult};
use crate::logging::{DataLogger, TracingLogger};
use crate::parameter::{Parameter, ParameterValue};
use crate::port::{
    grep_devices, DeviceEnumerator, DeviceInfo, PortOpener, PortSettings, SerialPortAdapter,
    SystemEnumerator, SystemOpener,
};
use crate::state::{validate_locator, PortEntry, PortRegistry, SharedSession, CURRENT_PORT};
use parking_lot::Mutex;
use regex::RegexBuilder;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a port is added to the session.
#[derive(Debug, Clone)]
pub struct AddPortOptions {
    /// Leave the handle open after construction.
    pub open: bool,
    /// Make the new port current even when others exist.
    pub make_current: bool,
    /// Per-port parameter overrides on top of the session defaults.
    pub overrides: Map<String, Value>,
}

impl Default for AddPortOptions {
    fn default() -> Self {
        Self {
            open: true,
            make_current: false,
            overrides: Map::new(),
        }
    }
}

impl AddPortOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct the handle closed.
    pub fn closed(mut self) -> Self {
        self.open = false;
        self
    }

    pub fn make_current(mut self) -> Self {
        self.make_current = true;
        self
    }

    /// Override one parameter for this port only.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(name.into(), value.into());
        self
    }

    pub fn with_overrides(mut self, overrides: Map<String, Value>) -> Self {
        self.overrides.extend(overrides);
        self
    }
}

/// A multi-port serial session.
pub struct SerialSession {
    registry: PortRegistry,
    defaults: DefaultSettings,
    encoding: Encoding,
    opener: Box<dyn PortOpener>,
    enumerator: Box<dyn DeviceEnumerator>,
    logger: Box<dyn DataLogger>,
}

impl std::fmt::Debug for SerialSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSession")
            .field("registry", &self.registry)
            .field("defaults", &self.defaults)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl Default for SerialSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialSession {
    /// Empty session with system transports and baseline defaults.
    pub fn new() -> Self {
        Self {
            registry: PortRegistry::new(),
            defaults: DefaultSettings::new(),
            encoding: Encoding::default(),
            opener: Box::new(SystemOpener),
            enumerator: Box::new(SystemEnumerator),
            logger: Box::new(TracingLogger),
        }
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Build a session from the `[session]` configuration section.
    pub fn from_config(config: &SessionConfig) -> SessionResult<Self> {
        Self::builder()
            .encoding(&config.encoding)
            .defaults(config.defaults.clone())
            .port(config.port.clone())
            .build()
    }

    /// Wrap the session for use from several threads.
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    // ========== Port Registry ==========

    /// Construct a handle for `locator` and register it.
    ///
    /// # Errors
    ///
    /// - `InvalidLocator` for an empty locator or the `"_"` placeholder
    /// - `DuplicatePort` if `locator` is already registered
    /// - `InvalidParameterValue` if an override cannot be coerced
    pub fn add_port(
        &mut self,
        locator: &str,
        options: AddPortOptions,
    ) -> SessionResult<&PortEntry> {
        validate_locator(locator)?;
        if self.registry.contains(locator) {
            return Err(SessionError::DuplicatePort(locator.to_string()));
        }

        let settings = self.defaults.merged(&options.overrides)?;
        let port = self.opener.create(locator, &settings, options.open)?;
        info!(
            locator,
            open = options.open,
            baud_rate = settings.baud_rate,
            "port added"
        );
        self.registry
            .insert(PortEntry::new(locator, settings, port), options.make_current)
    }

    /// Close and unregister a port.
    ///
    /// Deleting the current port makes the most recently added remaining
    /// port current.
    pub fn delete_port(&mut self, locator: Option<&str>) -> SessionResult<()> {
        let entry = self.registry.remove(locator)?;
        close_entry(entry);
        debug!(current = ?self.registry.current(), "current port after delete");
        Ok(())
    }

    /// Close and unregister every port. Does nothing on an empty session.
    pub fn delete_all_ports(&mut self) {
        for entry in self.registry.clear() {
            close_entry(entry);
        }
    }

    pub fn switch_port(&mut self, locator: &str) -> SessionResult<()> {
        self.registry.switch(locator)?;
        info!(locator, "switched current port");
        Ok(())
    }

    /// Locator of the current port, if any.
    pub fn current_port_locator(&self) -> Option<&str> {
        self.registry.current()
    }

    /// Check the current port. `"_"` matches whatever is current.
    pub fn current_port_should_be(&self, locator: &str) -> SessionResult<()> {
        let current = self.registry.current();
        if locator == CURRENT_PORT || current == Some(locator) {
            return Ok(());
        }
        Err(SessionError::CurrentPortMismatch {
            expected: locator.to_string(),
            actual: current.unwrap_or_default().to_string(),
        })
    }

    /// Check the current port against a case-insensitive pattern anchored at
    /// the start. Without a current port the pattern is matched against "".
    pub fn current_port_should_be_regexp(&self, pattern: &str) -> SessionResult<()> {
        let regex = RegexBuilder::new(&format!("^(?:{pattern})"))
            .case_insensitive(true)
            .build()?;
        let current = self.registry.current().unwrap_or_default();
        if regex.is_match(current) {
            Ok(())
        } else {
            Err(SessionError::CurrentPortMismatch {
                expected: pattern.to_string(),
                actual: current.to_string(),
            })
        }
    }

    // ========== Parameters ==========

    /// Read a parameter from the live handle of a port.
    pub fn get_port_parameter(
        &self,
        name: &str,
        locator: Option<&str>,
    ) -> SessionResult<ParameterValue> {
        let parameter = Parameter::from_name(name)?;
        let entry = self.registry.resolve(locator)?;
        Ok(entry.port().settings().get(parameter))
    }

    /// Change a parameter on the live handle of a port and return the
    /// previous value. An open port is reconfigured immediately.
    pub fn set_port_parameter(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        locator: Option<&str>,
    ) -> SessionResult<ParameterValue> {
        let parameter = Parameter::from_name(name)?;
        let value = parameter.coerce(&value.into())?;
        let entry = self.registry.resolve_mut(locator)?;

        let mut settings = entry.port().settings().clone();
        let previous = settings.get(parameter);
        settings.set(parameter, value)?;
        entry.port_mut().apply_settings(settings)?;
        debug!(
            locator = entry.locator(),
            %parameter,
            %previous,
            %value,
            "port parameter changed"
        );
        Ok(previous)
    }

    pub fn get_default_parameters(&self) -> PortSettings {
        self.defaults.snapshot().clone()
    }

    /// Update the defaults used for ports added from now on and return the
    /// previous defaults. Unknown keys are ignored.
    pub fn set_default_parameters(
        &mut self,
        params: &Map<String, Value>,
    ) -> SessionResult<PortSettings> {
        self.defaults.set(params)
    }

    pub fn reset_default_parameters(&mut self) {
        self.defaults.reset();
    }

    // ========== Encoding ==========

    pub fn get_encoding(&self) -> &'static str {
        self.encoding.name()
    }

    /// Select the default encoding and return the previous one's name.
    /// `None` only reports the current encoding.
    pub fn set_encoding(&mut self, name: Option<&str>) -> SessionResult<&'static str> {
        let previous = self.encoding.name();
        if let Some(name) = name {
            self.encoding = Encoding::from_name(name)?;
            debug!(previous, current = self.encoding.name(), "encoding changed");
        }
        Ok(previous)
    }

    // ========== Device Enumeration ==========

    pub fn list_com_ports(&self) -> SessionResult<Vec<DeviceInfo>> {
        Ok(self.enumerator.list_devices()?)
    }

    /// Device paths of every system port, sorted.
    pub fn list_com_port_names(&self) -> SessionResult<Vec<String>> {
        let mut names: Vec<String> = self
            .list_com_ports()?
            .into_iter()
            .map(|device| device.device)
            .collect();
        names.sort();
        Ok(names)
    }

    /// System ports matching `pattern` on path, description or hardware id.
    pub fn com_port_should_exist_regexp(&self, pattern: &str) -> SessionResult<Vec<DeviceInfo>> {
        let found = grep_devices(self.list_com_ports()?, pattern)?;
        if found.is_empty() {
            return Err(SessionError::NoMatchingDevice(pattern.to_string()));
        }
        Ok(found)
    }

    // ========== Helpers ==========

    /// Explicit per-call encoding, else the session default.
    fn encoding_for(&self, name: Option<&str>) -> SessionResult<Encoding> {
        name.map_or(Ok(self.encoding), Encoding::from_name)
    }

    fn port_mut(&mut self, locator: Option<&str>) -> SessionResult<&mut dyn SerialPortAdapter> {
        Ok(self.registry.resolve_mut(locator)?.port_mut())
    }

    /// Resolved port, which must be open.
    fn open_port_mut(
        &mut self,
        locator: Option<&str>,
    ) -> SessionResult<&mut dyn SerialPortAdapter> {
        let port = self.port_mut(locator)?;
        if !port.is_open() {
            return Err(SessionError::PortClosed);
        }
        Ok(port)
    }
}

/// Close a removed entry. The entry is gone either way, so a failing close
/// is only logged.
fn close_entry(mut entry: PortEntry) {
    if let Err(e) = entry.port_mut().close() {
        warn!(locator = entry.locator(), error = %e, "failed to close deleted port");
    }
    info!(locator = entry.locator(), "port deleted");
}

/// Builder for a [`SerialSession`] with non-default collaborators or initial
/// state.
#[derive(Default)]
pub struct SessionBuilder {
    encoding: Option<String>,
    defaults: Map<String, Value>,
    port: Option<String>,
    opener: Option<Box<dyn PortOpener>>,
    enumerator: Option<Box<dyn DeviceEnumerator>>,
    logger: Option<Box<dyn DataLogger>>,
}

impl SessionBuilder {
    pub fn encoding(mut self, name: impl Into<String>) -> Self {
        self.encoding = Some(name.into());
        self
    }

    /// Overrides applied to the default settings before any port is added.
    pub fn defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Port added (open, current) when the session is built.
    pub fn port(mut self, locator: Option<String>) -> Self {
        self.port = locator;
        self
    }

    pub fn opener(mut self, opener: impl PortOpener + 'static) -> Self {
        self.opener = Some(Box::new(opener));
        self
    }

    pub fn enumerator(mut self, enumerator: impl DeviceEnumerator + 'static) -> Self {
        self.enumerator = Some(Box::new(enumerator));
        self
    }

    pub fn logger(mut self, logger: impl DataLogger + 'static) -> Self {
        self.logger = Some(Box::new(logger));
        self
    }

    /// Apply defaults, then the encoding, then add the initial port.
    pub fn build(self) -> SessionResult<SerialSession> {
        let mut session = SerialSession::new();
        if let Some(opener) = self.opener {
            session.opener = opener;
        }
        if let Some(enumerator) = self.enumerator {
            session.enumerator = enumerator;
        }
        if let Some(logger) = self.logger {
            session.logger = logger;
        }

        session.set_default_parameters(&self.defaults)?;
        session.set_encoding(self.encoding.as_deref())?;
        if let Some(locator) = self.port {
            session.add_port(&locator, AddPortOptions::default().make_current())?;
        }
        Ok(session)
    }
}

use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::{SessionError, SessionResult};
use crate::port::{PortSettings, SerialPortAdapter};
use crate::service::SerialSession;

/// A session shared between threads. Holding the lock across "resolve the
/// port, then act on it" keeps the registry invariants intact.
pub type SharedSession = Arc<Mutex<SerialSession>>;

/// Type alias for the transport handle owned by an entry.
pub type PortAdapter = Box<dyn SerialPortAdapter>;

/// Locator that always means "the current port".
pub const CURRENT_PORT: &str = "_";

/// Reject locators that can never be registered: blank ones and the
/// current-port alias.
pub fn validate_locator(locator: &str) -> SessionResult<()> {
    if locator.trim().is_empty() || locator == CURRENT_PORT {
        return Err(SessionError::InvalidLocator(locator.to_string()));
    }
    Ok(())
}

/// A registered port: its locator, the settings it was created with, and
/// the live handle.
#[derive(Debug)]
pub struct PortEntry {
    locator: String,
    created_with: PortSettings,
    port: PortAdapter,
}

impl PortEntry {
    pub fn new(locator: impl Into<String>, created_with: PortSettings, port: PortAdapter) -> Self {
        Self {
            locator: locator.into(),
            created_with,
            port,
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Settings the handle was created from. Later `set_port_parameter`
    /// calls change the live handle, not this record.
    pub fn created_with(&self) -> &PortSettings {
        &self.created_with
    }

    pub fn port(&self) -> &dyn SerialPortAdapter {
        self.port.as_ref()
    }

    pub fn port_mut(&mut self) -> &mut dyn SerialPortAdapter {
        self.port.as_mut()
    }

    pub fn is_open(&self) -> bool {
        self.port.is_open()
    }
}

/// Ordered registry of ports plus the current-port pointer.
///
/// Invariant: `current` is `None` exactly when the registry is empty, and
/// otherwise names a registered locator.
#[derive(Debug, Default)]
pub struct PortRegistry {
    /// Entries in insertion order.
    entries: Vec<PortEntry>,
    current: Option<String>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.position(locator).is_some()
    }

    /// Locators in insertion order.
    pub fn locators(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(PortEntry::locator)
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Register `entry` at the end of the insertion order.
    ///
    /// The first entry of an empty registry always becomes current.
    pub fn insert(&mut self, entry: PortEntry, make_current: bool) -> SessionResult<&PortEntry> {
        if self.contains(entry.locator()) {
            return Err(SessionError::DuplicatePort(entry.locator().to_string()));
        }
        if self.current.is_none() || make_current {
            self.current = Some(entry.locator().to_string());
        }
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Remove the addressed entry and hand it back.
    ///
    /// Removing the current entry makes the most recently added remaining
    /// entry current.
    pub fn remove(&mut self, locator: Option<&str>) -> SessionResult<PortEntry> {
        let index = self.index_of(locator)?;
        let entry = self.entries.remove(index);
        if self.current.as_deref() == Some(entry.locator()) {
            self.current = self.entries.last().map(|e| e.locator().to_string());
        }
        Ok(entry)
    }

    /// Remove every entry, most recent first.
    pub fn clear(&mut self) -> Vec<PortEntry> {
        self.current = None;
        let mut drained: Vec<PortEntry> = self.entries.drain(..).collect();
        drained.reverse();
        drained
    }

    pub fn switch(&mut self, locator: &str) -> SessionResult<()> {
        if !self.contains(locator) {
            return Err(SessionError::PortNotFound(locator.to_string()));
        }
        self.current = Some(locator.to_string());
        Ok(())
    }

    /// Entry for `locator`, or for the current port when it is `None`/`"_"`.
    pub fn resolve(&self, locator: Option<&str>) -> SessionResult<&PortEntry> {
        let index = self.index_of(locator)?;
        Ok(&self.entries[index])
    }

    pub fn resolve_mut(&mut self, locator: Option<&str>) -> SessionResult<&mut PortEntry> {
        let index = self.index_of(locator)?;
        Ok(&mut self.entries[index])
    }

    fn index_of(&self, locator: Option<&str>) -> SessionResult<usize> {
        let target = match locator {
            None | Some(CURRENT_PORT) => {
                self.current.as_deref().ok_or(SessionError::NoCurrentPort)?
            }
            Some(locator) => locator,
        };
        self.position(target)
            .ok_or_else(|| SessionError::PortNotFound(target.to_string()))
    }

    fn position(&self, locator: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.locator() == locator)
    }
}

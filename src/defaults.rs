//! Session-wide default connection settings.
//!
//! New ports are created from a snapshot of these defaults merged with the
//! per-port overrides. Changing the defaults never touches ports that are
//! already registered.

use crate::error::SessionResult;
use crate::port::PortSettings;
use serde_json::{Map, Value};
use tracing::debug;

/// The Default Configuration Store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultSettings {
    settings: PortSettings,
}

impl DefaultSettings {
    /// Store holding the canonical baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current defaults.
    pub fn snapshot(&self) -> &PortSettings {
        &self.settings
    }

    /// Update the defaults from a partial map.
    ///
    /// Unrecognised keys are ignored. A recognised key whose value cannot be
    /// coerced fails the whole update. Returns the defaults as they were
    /// before the call.
    pub fn set(&mut self, params: &Map<String, Value>) -> SessionResult<PortSettings> {
        let previous = self.settings.clone();
        self.settings.apply_overrides(params)?;
        debug!(keys = params.len(), "default parameters updated");
        Ok(previous)
    }

    /// Restore the canonical baseline.
    pub fn reset(&mut self) {
        self.settings = PortSettings::default();
        debug!("default parameters reset");
    }

    /// Effective settings for a new port: defaults with `overrides` on top.
    pub fn merged(&self, overrides: &Map<String, Value>) -> SessionResult<PortSettings> {
        let mut settings = self.settings.clone();
        settings.apply_overrides(overrides)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_set_returns_previous_record() {
        let mut defaults = DefaultSettings::new();
        let previous = defaults
            .set(&map(json!({"baudrate": 128000, "timeout": 0.1})))
            .unwrap();

        assert_eq!(previous, PortSettings::default());
        assert_eq!(defaults.snapshot().baud_rate, 128000);
        assert_eq!(
            defaults.snapshot().timeout,
            Some(Duration::from_millis(100))
        );
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut defaults = DefaultSettings::new();
        defaults.set(&map(json!({"speed": 1}))).unwrap();
        assert_eq!(defaults, DefaultSettings::new());
    }

    #[test]
    fn test_reset() {
        let mut defaults = DefaultSettings::new();
        defaults.set(&map(json!({"baudrate": "57600"}))).unwrap();
        defaults.reset();
        assert_eq!(defaults.snapshot().baud_rate, 9600);
        assert_eq!(defaults.snapshot().timeout, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_merged_leaves_store_alone() {
        let defaults = DefaultSettings::new();
        let merged = defaults.merged(&map(json!({"stopbits": 2}))).unwrap();
        assert_eq!(merged.stop_bits, crate::port::StopBits::Two);
        assert_eq!(defaults.snapshot().stop_bits, crate::port::StopBits::One);
    }
}

//! Shared test utilities for serial session tests.
//!
//! This module provides common test infrastructure including:
//! - Sessions with fast-timing loopback ports
//! - Parameter map builders
//! - A data logger that records what it was given

#![allow(dead_code)]

use parking_lot::Mutex;
use serde_json::{Map, Value};
use serial_session::logging::{DataLogger, LogLevel};
use serial_session::service::{AddPortOptions, SerialSession};
use std::sync::Arc;

/// Read timeout used by test ports, in seconds. Short so timed-out reads
/// keep the suite fast.
pub const TEST_TIMEOUT: f64 = 0.1;

/// Options for a loopback port with the short test timeout.
pub fn fast_port() -> AddPortOptions {
    AddPortOptions::new().with("timeout", TEST_TIMEOUT)
}

/// Session with one open `loop://` port, current.
pub fn loopback_session() -> SerialSession {
    let mut session = SerialSession::new();
    session
        .add_port("loop://", fast_port())
        .expect("add loopback port");
    session
}

/// Session with loopback ports added in the given order.
pub fn session_with_ports(locators: &[&str]) -> SerialSession {
    let mut session = SerialSession::new();
    for locator in locators {
        session
            .add_port(locator, fast_port())
            .expect("add loopback port");
    }
    session
}

/// Build a parameter map from a JSON object literal.
pub fn params(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("JSON object")
}

/// Data logger that keeps every record.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    records: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl RecordingLogger {
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.lock().clone()
    }
}

impl DataLogger for RecordingLogger {
    fn emit(&self, level: LogLevel, message: &str) {
        self.records.lock().push((level, message.to_string()));
    }
}

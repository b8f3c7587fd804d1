//! Core traits for serial port abstraction.
//!
//! Defines the `SerialPortAdapter` trait that lets real serial ports and the
//! in-memory loopback be driven by the same session code, plus the
//! `PortSettings` record every handle is created from.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration parameters for a serial port.
///
/// `Default` is the session baseline: the transport baseline with finite
/// one second read and write timeouts, since a session has no way to
/// interrupt a blocked read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSettings {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Number of data bits (5, 6, 7, or 8).
    pub data_bits: DataBits,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Read timeout. `None` blocks until data arrives.
    pub timeout: Option<Duration>,

    /// Write timeout. `None` blocks until the write completes.
    pub write_timeout: Option<Duration>,

    /// Maximum gap between two bytes of one read. `None` disables the check.
    pub inter_byte_timeout: Option<Duration>,

    /// Software (XON/XOFF) flow control.
    pub xonxoff: bool,

    /// Hardware RTS/CTS flow control.
    pub rtscts: bool,

    /// Hardware DSR/DTR flow control.
    pub dsrdtr: bool,
}

impl PortSettings {
    /// Settings a freshly constructed transport has when nothing is given.
    pub fn transport_baseline() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: None,
            write_timeout: None,
            inter_byte_timeout: None,
            xonxoff: false,
            rtscts: false,
            dsrdtr: false,
        }
    }
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(1)),
            write_timeout: Some(Duration::from_secs(1)),
            ..Self::transport_baseline()
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    /// Numeric bit count.
    pub fn bits(self) -> u8 {
        match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Trait for serial port I/O operations.
///
/// A handle outlives its open state: it can be closed and reopened with the
/// settings it carries. Operations that need an open port return
/// [`PortError::NotOpen`] when it is closed.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Get the locator this handle was created for.
    fn name(&self) -> &str;

    /// Current settings of the handle.
    fn settings(&self) -> &PortSettings;

    /// Replace the settings, reconfiguring the live port if it is open.
    fn apply_settings(&mut self, settings: PortSettings) -> Result<(), PortError>;

    /// Whether the port is currently open.
    fn is_open(&self) -> bool;

    /// Open the port with the current settings.
    fn open(&mut self) -> Result<(), PortError>;

    /// Close the port. Closing a closed port is not an error.
    fn close(&mut self) -> Result<(), PortError>;

    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read up to `buffer.len()` bytes, waiting at most `timeout` for the
    /// first one (`None` waits forever).
    ///
    /// Returns `Ok(0)` when the wait elapses with nothing available.
    fn read_bytes(
        &mut self,
        buffer: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, PortError>;

    /// Bytes waiting in the input buffer.
    fn bytes_to_read(&self) -> Result<usize, PortError>;

    /// Bytes waiting in the output buffer.
    fn bytes_to_write(&self) -> Result<usize, PortError>;

    /// Block until all written data has been transmitted.
    fn flush(&mut self) -> Result<(), PortError>;

    /// Discard unread input.
    fn reset_input_buffer(&mut self) -> Result<(), PortError>;

    /// Discard unsent output.
    fn reset_output_buffer(&mut self) -> Result<(), PortError>;

    /// Hold the line in break condition for `duration`.
    fn send_break(&mut self, duration: Duration) -> Result<(), PortError>;

    /// Set RTS (Request To Send).
    fn set_rts(&mut self, level: bool) -> Result<(), PortError>;

    /// Set DTR (Data Terminal Ready).
    fn set_dtr(&mut self, level: bool) -> Result<(), PortError>;

    /// Last RTS level requested on this handle.
    fn rts(&self) -> bool;

    /// Last DTR level requested on this handle.
    fn dtr(&self) -> bool;

    /// Read CTS (Clear To Send).
    fn cts(&mut self) -> Result<bool, PortError>;

    /// Read DSR (Data Set Ready).
    fn dsr(&mut self) -> Result<bool, PortError>;

    /// Read RI (Ring Indicator).
    fn ri(&mut self) -> Result<bool, PortError>;

    /// Read CD (Carrier Detect).
    fn cd(&mut self) -> Result<bool, PortError>;

    /// Manually gate incoming data (only meaningful without flow control).
    fn set_input_flow_control(&mut self, _enable: bool) -> Result<(), PortError> {
        Err(PortError::unsupported("input flow control"))
    }

    /// Manually gate outgoing data (only meaningful without flow control).
    fn set_output_flow_control(&mut self, _enable: bool) -> Result<(), PortError> {
        Err(PortError::unsupported("output flow control"))
    }

    /// Switch the transceiver to RS485 mode.
    fn set_rs485_mode(&mut self, _enable: bool) -> Result<(), PortError> {
        Err(PortError::unsupported("RS485 mode"))
    }
}

/// Constructs transport handles for locators.
pub trait PortOpener: Send {
    /// Build a handle for `locator`; it is left open only when `open` is set.
    fn create(
        &self,
        locator: &str,
        settings: &PortSettings,
        open: bool,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}

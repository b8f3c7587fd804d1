//! Synchronous serial port implementation.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own
//! `SerialPortAdapter` trait. The handle keeps its settings while closed so
//! it can be reopened later.

use super::error::PortError;
use super::traits::{PortSettings, SerialPortAdapter};
use std::io::{Read, Write};
use std::time::Duration;

/// Stand-in for "no timeout"; `serialport` always wants a duration.
const BLOCKING_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Timeout handed to the driver; `None` and anything longer block for a day.
fn device_timeout(timeout: Option<Duration>) -> Duration {
    timeout.map_or(BLOCKING_TIMEOUT, |timeout| timeout.min(BLOCKING_TIMEOUT))
}

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    /// The underlying serial port, `None` while closed.
    port: Option<Box<dyn serialport::SerialPort>>,
    /// The port name/path for identification.
    name: String,
    settings: PortSettings,
    /// Timeout currently programmed into the driver.
    active_timeout: Duration,
    rts: bool,
    dtr: bool,
}

impl SyncSerialPort {
    /// Open a serial port with the given settings.
    ///
    /// # Example
    /// ```no_run
    /// use serial_session::port::{PortSettings, SyncSerialPort};
    ///
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", PortSettings::default())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, settings: PortSettings) -> Result<Self, PortError> {
        let mut port = Self::closed(port_name, settings);
        SerialPortAdapter::open(&mut port)?;
        Ok(port)
    }

    /// Create a handle without opening the device.
    pub fn closed(port_name: &str, settings: PortSettings) -> Self {
        Self {
            port: None,
            name: port_name.to_string(),
            active_timeout: device_timeout(settings.timeout),
            settings,
            rts: true,
            dtr: true,
        }
    }

    /// Get a reference to the underlying serialport implementation, if open.
    ///
    /// This can be useful for accessing platform-specific features.
    pub fn as_raw(&self) -> Option<&dyn serialport::SerialPort> {
        self.port.as_deref()
    }

    fn flow_control(settings: &PortSettings) -> Result<serialport::FlowControl, PortError> {
        match (settings.xonxoff, settings.rtscts, settings.dsrdtr) {
            (_, _, true) => Err(PortError::unsupported("DSR/DTR flow control")),
            (true, true, false) => Err(PortError::unsupported(
                "combined XON/XOFF and RTS/CTS flow control",
            )),
            (true, false, false) => Ok(serialport::FlowControl::Software),
            (false, true, false) => Ok(serialport::FlowControl::Hardware),
            (false, false, false) => Ok(serialport::FlowControl::None),
        }
    }

    fn raw(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>, PortError> {
        self.port.as_mut().ok_or(PortError::NotOpen)
    }

    fn raw_ref(&self) -> Result<&dyn serialport::SerialPort, PortError> {
        self.port.as_deref().ok_or(PortError::NotOpen)
    }

    fn program_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        if self.active_timeout != timeout {
            self.raw()?.set_timeout(timeout)?;
            self.active_timeout = timeout;
        }
        Ok(())
    }

    fn reconfigure(&mut self) -> Result<(), PortError> {
        let settings = self.settings.clone();
        let flow = Self::flow_control(&settings)?;
        let port = self.raw()?;
        port.set_baud_rate(settings.baud_rate)?;
        port.set_data_bits(settings.data_bits.into())?;
        port.set_parity(settings.parity.into())?;
        port.set_stop_bits(settings.stop_bits.into())?;
        port.set_flow_control(flow)?;
        let timeout = device_timeout(settings.timeout);
        port.set_timeout(timeout)?;
        self.active_timeout = timeout;
        Ok(())
    }
}

impl SerialPortAdapter for SyncSerialPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn settings(&self) -> &PortSettings {
        &self.settings
    }

    fn apply_settings(&mut self, settings: PortSettings) -> Result<(), PortError> {
        Self::flow_control(&settings)?;
        let previous = std::mem::replace(&mut self.settings, settings);
        if self.port.is_some() {
            if let Err(e) = self.reconfigure() {
                self.settings = previous;
                return Err(e);
            }
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn open(&mut self) -> Result<(), PortError> {
        if self.port.is_some() {
            return Ok(());
        }

        let timeout = device_timeout(self.settings.timeout);
        let mut port = serialport::new(&self.name, self.settings.baud_rate)
            .data_bits(self.settings.data_bits.into())
            .flow_control(Self::flow_control(&self.settings)?)
            .parity(self.settings.parity.into())
            .stop_bits(self.settings.stop_bits.into())
            .timeout(timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(&self.name),
                serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
                _ => PortError::Serial(e),
            })?;

        if !self.settings.rtscts {
            port.write_request_to_send(self.rts)?;
        }
        port.write_data_terminal_ready(self.dtr)?;

        self.active_timeout = timeout;
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<(), PortError> {
        // Dropping the handle releases the device.
        self.port = None;
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let timeout = device_timeout(self.settings.write_timeout);
        self.program_timeout(timeout)?;
        match self.raw()?.write_all(data) {
            Ok(()) => Ok(data.len()),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(PortError::timeout(timeout)),
            Err(e) => Err(PortError::Io(e)),
        }
    }

    fn read_bytes(
        &mut self,
        buffer: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, PortError> {
        self.program_timeout(device_timeout(timeout))?;
        match self.raw()?.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(PortError::Io(e)),
        }
    }

    fn bytes_to_read(&self) -> Result<usize, PortError> {
        Ok(self.raw_ref()?.bytes_to_read()? as usize)
    }

    fn bytes_to_write(&self) -> Result<usize, PortError> {
        Ok(self.raw_ref()?.bytes_to_write()? as usize)
    }

    fn flush(&mut self) -> Result<(), PortError> {
        self.raw()?.flush().map_err(PortError::Io)
    }

    fn reset_input_buffer(&mut self) -> Result<(), PortError> {
        self.raw()?
            .clear(serialport::ClearBuffer::Input)
            .map_err(PortError::Serial)
    }

    fn reset_output_buffer(&mut self) -> Result<(), PortError> {
        self.raw()?
            .clear(serialport::ClearBuffer::Output)
            .map_err(PortError::Serial)
    }

    fn send_break(&mut self, duration: Duration) -> Result<(), PortError> {
        let port = self.raw()?;
        port.set_break()?;
        std::thread::sleep(duration);
        port.clear_break()?;
        Ok(())
    }

    fn set_rts(&mut self, level: bool) -> Result<(), PortError> {
        self.rts = level;
        if let Some(port) = self.port.as_mut() {
            port.write_request_to_send(level)?;
        }
        Ok(())
    }

    fn set_dtr(&mut self, level: bool) -> Result<(), PortError> {
        self.dtr = level;
        if let Some(port) = self.port.as_mut() {
            port.write_data_terminal_ready(level)?;
        }
        Ok(())
    }

    fn rts(&self) -> bool {
        self.rts
    }

    fn dtr(&self) -> bool {
        self.dtr
    }

    fn cts(&mut self) -> Result<bool, PortError> {
        Ok(self.raw()?.read_clear_to_send()?)
    }

    fn dsr(&mut self) -> Result<bool, PortError> {
        Ok(self.raw()?.read_data_set_ready()?)
    }

    fn ri(&mut self) -> Result<bool, PortError> {
        Ok(self.raw()?.read_ring_indicator()?)
    }

    fn cd(&mut self) -> Result<bool, PortError> {
        Ok(self.raw()?.read_carrier_detect()?)
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .field("baud_rate", &self.settings.baud_rate)
            .finish()
    }
}

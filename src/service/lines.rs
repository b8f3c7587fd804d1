//! Port lifecycle, buffers and modem control lines.

use super::SerialSession;
use crate::error::{SessionError, SessionResult};
use crate::parameter::SwitchValue;
use crate::port::{PortError, SerialPortAdapter};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Break length used when `send_break` gets no duration.
pub const DEFAULT_BREAK: Duration = Duration::from_millis(250);

/// A modem control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    /// Request To Send (output)
    Rts,
    /// Data Terminal Ready (output)
    Dtr,
    /// Clear To Send
    Cts,
    /// Data Set Ready
    Dsr,
    /// Ring Indicator
    Ri,
    /// Carrier Detect
    Cd,
}

impl Line {
    pub fn name(self) -> &'static str {
        match self {
            Line::Rts => "RTS",
            Line::Dtr => "DTR",
            Line::Cts => "CTS",
            Line::Dsr => "DSR",
            Line::Ri => "RI",
            Line::Cd => "CD",
        }
    }

    /// Current level on `port`. RTS and DTR report the last level set,
    /// the inputs are read from the device.
    fn level(self, port: &mut dyn SerialPortAdapter) -> Result<bool, PortError> {
        match self {
            Line::Rts => Ok(port.rts()),
            Line::Dtr => Ok(port.dtr()),
            Line::Cts => port.cts(),
            Line::Dsr => port.dsr(),
            Line::Ri => port.ri(),
            Line::Cd => port.cd(),
        }
    }

    fn is_output(self) -> bool {
        matches!(self, Line::Rts | Line::Dtr)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn switch(name: &str, value: impl SwitchValue) -> SessionResult<bool> {
    value
        .to_switch()
        .map_err(|raw| SessionError::invalid_value(name, raw))
}

impl SerialSession {
    // ========== Lifecycle ==========

    /// Open the port. Does nothing when it is already open.
    pub fn open_port(&mut self, locator: Option<&str>) -> SessionResult<()> {
        let port = self.port_mut(locator)?;
        if !port.is_open() {
            port.open()?;
            info!(port = port.name(), "port opened");
        }
        Ok(())
    }

    /// Close the port. Does nothing when it is already closed.
    pub fn close_port(&mut self, locator: Option<&str>) -> SessionResult<()> {
        let port = self.port_mut(locator)?;
        if port.is_open() {
            port.close()?;
            info!(port = port.name(), "port closed");
        }
        Ok(())
    }

    pub fn port_should_be_open(&mut self, locator: Option<&str>) -> SessionResult<()> {
        self.open_port_mut(locator).map(|_| ())
    }

    pub fn port_should_be_closed(&mut self, locator: Option<&str>) -> SessionResult<()> {
        if self.port_mut(locator)?.is_open() {
            return Err(SessionError::PortOpen);
        }
        Ok(())
    }

    // ========== Buffers ==========

    /// Wait until all written data has been sent.
    pub fn flush_port(&mut self, locator: Option<&str>) -> SessionResult<()> {
        Ok(self.open_port_mut(locator)?.flush()?)
    }

    pub fn reset_input_buffer(&mut self, locator: Option<&str>) -> SessionResult<()> {
        Ok(self.open_port_mut(locator)?.reset_input_buffer()?)
    }

    pub fn reset_output_buffer(&mut self, locator: Option<&str>) -> SessionResult<()> {
        Ok(self.open_port_mut(locator)?.reset_output_buffer()?)
    }

    /// Hold the line in break condition, 0.25 s unless `duration` is given.
    /// Buffered input is left alone.
    pub fn send_break(
        &mut self,
        duration: Option<Duration>,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        let duration = duration.unwrap_or(DEFAULT_BREAK);
        let port = self.open_port_mut(locator)?;
        port.send_break(duration)?;
        debug!(port = port.name(), ?duration, "break sent");
        Ok(())
    }

    pub fn port_should_have_unread_bytes(&mut self, locator: Option<&str>) -> SessionResult<()> {
        if self.open_port_mut(locator)?.bytes_to_read()? == 0 {
            return Err(SessionError::BufferMismatch("Port has no in-waiting data."));
        }
        Ok(())
    }

    pub fn port_should_not_have_unread_bytes(
        &mut self,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        if self.open_port_mut(locator)?.bytes_to_read()? > 0 {
            return Err(SessionError::BufferMismatch("Port has in-waiting data."));
        }
        Ok(())
    }

    pub fn port_should_have_unsent_bytes(&mut self, locator: Option<&str>) -> SessionResult<()> {
        if self.open_port_mut(locator)?.bytes_to_write()? == 0 {
            return Err(SessionError::BufferMismatch("Port has no out-waiting data."));
        }
        Ok(())
    }

    pub fn port_should_not_have_unsent_bytes(
        &mut self,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        if self.open_port_mut(locator)?.bytes_to_write()? > 0 {
            return Err(SessionError::BufferMismatch("Port has out-waiting data."));
        }
        Ok(())
    }

    // ========== Control Lines ==========

    /// Set RTS. Accepts booleans and on/off style tokens.
    pub fn set_rts(
        &mut self,
        value: impl SwitchValue,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        let level = switch(Line::Rts.name(), value)?;
        Ok(self.port_mut(locator)?.set_rts(level)?)
    }

    /// Set DTR. Accepts booleans and on/off style tokens.
    pub fn set_dtr(
        &mut self,
        value: impl SwitchValue,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        let level = switch(Line::Dtr.name(), value)?;
        Ok(self.port_mut(locator)?.set_dtr(level)?)
    }

    /// Level of `line`. Input lines need an open port.
    pub fn line_status(&mut self, line: Line, locator: Option<&str>) -> SessionResult<bool> {
        let port = if line.is_output() {
            self.port_mut(locator)?
        } else {
            self.open_port_mut(locator)?
        };
        Ok(line.level(port)?)
    }

    /// Fail with a `LineMismatch` unless `line` is at `value`.
    pub fn line_should_be(
        &mut self,
        line: Line,
        value: impl SwitchValue,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        let expected = switch(line.name(), value)?;
        let actual = self.line_status(line, locator)?;
        if expected != actual {
            return Err(SessionError::LineMismatch {
                line: line.name(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    pub fn rts_should_be(
        &mut self,
        value: impl SwitchValue,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        self.line_should_be(Line::Rts, value, locator)
    }

    pub fn dtr_should_be(
        &mut self,
        value: impl SwitchValue,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        self.line_should_be(Line::Dtr, value, locator)
    }

    pub fn cts_should_be(
        &mut self,
        value: impl SwitchValue,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        self.line_should_be(Line::Cts, value, locator)
    }

    pub fn dsr_should_be(
        &mut self,
        value: impl SwitchValue,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        self.line_should_be(Line::Dsr, value, locator)
    }

    pub fn ri_should_be(
        &mut self,
        value: impl SwitchValue,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        self.line_should_be(Line::Ri, value, locator)
    }

    pub fn cd_should_be(
        &mut self,
        value: impl SwitchValue,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        self.line_should_be(Line::Cd, value, locator)
    }

    pub fn get_cts_status(&mut self, locator: Option<&str>) -> SessionResult<bool> {
        self.line_status(Line::Cts, locator)
    }

    pub fn get_dsr_status(&mut self, locator: Option<&str>) -> SessionResult<bool> {
        self.line_status(Line::Dsr, locator)
    }

    pub fn get_ri_status(&mut self, locator: Option<&str>) -> SessionResult<bool> {
        self.line_status(Line::Ri, locator)
    }

    pub fn get_cd_status(&mut self, locator: Option<&str>) -> SessionResult<bool> {
        self.line_status(Line::Cd, locator)
    }

    // ========== Transport Features ==========

    pub fn set_input_flow_control(
        &mut self,
        enable: impl SwitchValue,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        let enable = switch("input flow control", enable)?;
        Ok(self.open_port_mut(locator)?.set_input_flow_control(enable)?)
    }

    pub fn set_output_flow_control(
        &mut self,
        enable: impl SwitchValue,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        let enable = switch("output flow control", enable)?;
        Ok(self.open_port_mut(locator)?.set_output_flow_control(enable)?)
    }

    pub fn set_rs485_mode(
        &mut self,
        enable: impl SwitchValue,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        let enable = switch("rs485", enable)?;
        Ok(self.open_port_mut(locator)?.set_rs485_mode(enable)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::AddPortOptions;

    fn session() -> SerialSession {
        let mut session = SerialSession::new();
        session.add_port("loop://", AddPortOptions::default()).unwrap();
        session
    }

    #[test]
    fn test_open_close_idempotent() {
        let mut session = session();
        session.open_port(None).unwrap();
        session.port_should_be_open(None).unwrap();

        session.close_port(None).unwrap();
        session.close_port(None).unwrap();
        session.port_should_be_closed(None).unwrap();
        assert!(matches!(
            session.port_should_be_open(None),
            Err(SessionError::PortClosed)
        ));

        session.open_port(Some("_")).unwrap();
        assert!(matches!(
            session.port_should_be_closed(None),
            Err(SessionError::PortOpen)
        ));
    }

    #[test]
    fn test_line_mismatch_message() {
        let mut session = session();
        session.set_rts("off", None).unwrap();
        let err = session.rts_should_be(true, None).unwrap_err();
        assert_eq!(err.to_string(), "RTS should be On but Off.");
    }

    #[test]
    fn test_bad_switch_value() {
        let mut session = session();
        assert!(matches!(
            session.set_dtr("maybe", None),
            Err(SessionError::InvalidParameterValue { name, .. }) if name == "DTR"
        ));
    }

    #[test]
    fn test_input_lines_need_open_port() {
        let mut session = session();
        session.close_port(None).unwrap();
        assert!(matches!(
            session.get_cts_status(None),
            Err(SessionError::PortClosed)
        ));
        // Output lines remember their level while closed.
        session.set_rts(false, None).unwrap();
        session.rts_should_be("0", None).unwrap();
    }

    #[test]
    fn test_flow_control_features_unsupported_on_loopback() {
        let mut session = session();
        assert!(matches!(
            session.set_input_flow_control(true, None),
            Err(SessionError::UnsupportedFeature(_))
        ));
        assert!(matches!(
            session.set_output_flow_control("on", None),
            Err(SessionError::UnsupportedFeature(_))
        ));
        assert!(matches!(
            session.set_rs485_mode(false, None),
            Err(SessionError::UnsupportedFeature(_))
        ));
    }
}

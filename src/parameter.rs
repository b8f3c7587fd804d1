//! Recognised connection parameters and value coercion.
//!
//! Callers address parameters by their conventional names (`baudrate`,
//! `timeout`, ...) and hand in loosely typed values; this module turns both
//! into the closed [`Parameter`] set and typed [`ParameterValue`]s before
//! anything touches a port.

use crate::error::{SessionError, SessionResult};
use crate::port::{DataBits, Parity, PortSettings, StopBits};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A recognised connection parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    BaudRate,
    ByteSize,
    Parity,
    StopBits,
    Timeout,
    XonXoff,
    RtsCts,
    WriteTimeout,
    DsrDtr,
    InterByteTimeout,
}

impl Parameter {
    /// Every parameter, in the conventional order.
    pub const ALL: [Parameter; 10] = [
        Parameter::BaudRate,
        Parameter::ByteSize,
        Parameter::Parity,
        Parameter::StopBits,
        Parameter::Timeout,
        Parameter::XonXoff,
        Parameter::RtsCts,
        Parameter::WriteTimeout,
        Parameter::DsrDtr,
        Parameter::InterByteTimeout,
    ];

    /// Name used in maps, config files and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Parameter::BaudRate => "baudrate",
            Parameter::ByteSize => "bytesize",
            Parameter::Parity => "parity",
            Parameter::StopBits => "stopbits",
            Parameter::Timeout => "timeout",
            Parameter::XonXoff => "xonxoff",
            Parameter::RtsCts => "rtscts",
            Parameter::WriteTimeout => "write_timeout",
            Parameter::DsrDtr => "dsrdtr",
            Parameter::InterByteTimeout => "inter_byte_timeout",
        }
    }

    /// Resolve a parameter name. Names are matched exactly.
    pub fn from_name(name: &str) -> SessionResult<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| SessionError::UnknownParameter(name.to_string()))
    }

    /// Coerce a loosely typed value into this parameter's native type.
    pub fn coerce(self, raw: &Value) -> SessionResult<ParameterValue> {
        let invalid = || SessionError::invalid_value(self.name(), raw);
        match self {
            Parameter::BaudRate => match number(raw) {
                Some(n) if n >= 1.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => {
                    Ok(ParameterValue::BaudRate(n as u32))
                }
                _ => Err(invalid()),
            },
            Parameter::ByteSize => match number(raw) {
                Some(n) if n == 5.0 => Ok(ParameterValue::ByteSize(DataBits::Five)),
                Some(n) if n == 6.0 => Ok(ParameterValue::ByteSize(DataBits::Six)),
                Some(n) if n == 7.0 => Ok(ParameterValue::ByteSize(DataBits::Seven)),
                Some(n) if n == 8.0 => Ok(ParameterValue::ByteSize(DataBits::Eight)),
                _ => Err(invalid()),
            },
            Parameter::Parity => {
                let text = raw.as_str().ok_or_else(invalid)?;
                match text.trim().to_ascii_uppercase().as_str() {
                    "N" | "NONE" => Ok(ParameterValue::Parity(Parity::None)),
                    "E" | "EVEN" => Ok(ParameterValue::Parity(Parity::Even)),
                    "O" | "ODD" => Ok(ParameterValue::Parity(Parity::Odd)),
                    _ => Err(invalid()),
                }
            }
            Parameter::StopBits => match number(raw) {
                Some(n) if n == 1.0 => Ok(ParameterValue::StopBits(StopBits::One)),
                Some(n) if n == 2.0 => Ok(ParameterValue::StopBits(StopBits::Two)),
                _ => Err(invalid()),
            },
            Parameter::Timeout | Parameter::WriteTimeout | Parameter::InterByteTimeout => {
                if is_none(raw) {
                    return Ok(ParameterValue::Timeout(None));
                }
                let secs = number(raw).ok_or_else(invalid)?;
                Duration::try_from_secs_f64(secs)
                    .map(|d| ParameterValue::Timeout(Some(d)))
                    .map_err(|_| invalid())
            }
            Parameter::XonXoff | Parameter::RtsCts | Parameter::DsrDtr => raw
                .to_switch()
                .map(ParameterValue::Flag)
                .map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Parameter {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// A parameter value in its native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterValue {
    BaudRate(u32),
    ByteSize(DataBits),
    Parity(Parity),
    StopBits(StopBits),
    /// Any of the three timeouts. `None` blocks.
    Timeout(Option<Duration>),
    /// Any of the three flow-control switches.
    Flag(bool),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::BaudRate(baud) => write!(f, "{baud}"),
            ParameterValue::ByteSize(bits) => write!(f, "{}", bits.bits()),
            ParameterValue::Parity(Parity::None) => f.write_str("N"),
            ParameterValue::Parity(Parity::Even) => f.write_str("E"),
            ParameterValue::Parity(Parity::Odd) => f.write_str("O"),
            ParameterValue::StopBits(StopBits::One) => f.write_str("1"),
            ParameterValue::StopBits(StopBits::Two) => f.write_str("2"),
            ParameterValue::Timeout(None) => f.write_str("None"),
            ParameterValue::Timeout(Some(t)) => write!(f, "{}", t.as_secs_f64()),
            ParameterValue::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

impl PortSettings {
    /// Read one parameter.
    pub fn get(&self, parameter: Parameter) -> ParameterValue {
        match parameter {
            Parameter::BaudRate => ParameterValue::BaudRate(self.baud_rate),
            Parameter::ByteSize => ParameterValue::ByteSize(self.data_bits),
            Parameter::Parity => ParameterValue::Parity(self.parity),
            Parameter::StopBits => ParameterValue::StopBits(self.stop_bits),
            Parameter::Timeout => ParameterValue::Timeout(self.timeout),
            Parameter::WriteTimeout => ParameterValue::Timeout(self.write_timeout),
            Parameter::InterByteTimeout => ParameterValue::Timeout(self.inter_byte_timeout),
            Parameter::XonXoff => ParameterValue::Flag(self.xonxoff),
            Parameter::RtsCts => ParameterValue::Flag(self.rtscts),
            Parameter::DsrDtr => ParameterValue::Flag(self.dsrdtr),
        }
    }

    /// Write one parameter. The value must be of the parameter's type.
    pub fn set(&mut self, parameter: Parameter, value: ParameterValue) -> SessionResult<()> {
        match (parameter, value) {
            (Parameter::BaudRate, ParameterValue::BaudRate(v)) => self.baud_rate = v,
            (Parameter::ByteSize, ParameterValue::ByteSize(v)) => self.data_bits = v,
            (Parameter::Parity, ParameterValue::Parity(v)) => self.parity = v,
            (Parameter::StopBits, ParameterValue::StopBits(v)) => self.stop_bits = v,
            (Parameter::Timeout, ParameterValue::Timeout(v)) => self.timeout = v,
            (Parameter::WriteTimeout, ParameterValue::Timeout(v)) => self.write_timeout = v,
            (Parameter::InterByteTimeout, ParameterValue::Timeout(v)) => {
                self.inter_byte_timeout = v
            }
            (Parameter::XonXoff, ParameterValue::Flag(v)) => self.xonxoff = v,
            (Parameter::RtsCts, ParameterValue::Flag(v)) => self.rtscts = v,
            (Parameter::DsrDtr, ParameterValue::Flag(v)) => self.dsrdtr = v,
            (parameter, value) => return Err(SessionError::invalid_value(parameter.name(), value)),
        }
        Ok(())
    }

    /// Apply every recognised key of `overrides`; unknown keys are skipped.
    ///
    /// Nothing is changed when any recognised value fails to coerce.
    pub fn apply_overrides(&mut self, overrides: &Map<String, Value>) -> SessionResult<()> {
        let mut updated = self.clone();
        for (key, raw) in overrides {
            let Ok(parameter) = Parameter::from_name(key) else {
                continue;
            };
            updated.set(parameter, parameter.coerce(raw)?)?;
        }
        *self = updated;
        Ok(())
    }
}

/// A value that can stand for an on/off switch.
///
/// Accepts native booleans, integers (non-zero is on) and the tokens
/// `true`/`yes`/`on` and `false`/`no`/`off`/empty, case-insensitively.
/// Anything else is rejected with its textual form.
pub trait SwitchValue {
    fn to_switch(&self) -> Result<bool, String>;
}

impl SwitchValue for bool {
    fn to_switch(&self) -> Result<bool, String> {
        Ok(*self)
    }
}

impl SwitchValue for str {
    fn to_switch(&self) -> Result<bool, String> {
        let token = self.trim();
        if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(token.bytes().any(|b| b != b'0'));
        }
        match token.to_ascii_uppercase().as_str() {
            "TRUE" | "YES" | "ON" => Ok(true),
            "FALSE" | "NO" | "OFF" | "" => Ok(false),
            _ => Err(self.to_string()),
        }
    }
}

impl SwitchValue for String {
    fn to_switch(&self) -> Result<bool, String> {
        self.as_str().to_switch()
    }
}

impl SwitchValue for Value {
    fn to_switch(&self) -> Result<bool, String> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
            Value::String(s) => s.to_switch(),
            other => Err(other.to_string()),
        }
    }
}

impl<T: SwitchValue + ?Sized> SwitchValue for &T {
    fn to_switch(&self) -> Result<bool, String> {
        (**self).to_switch()
    }
}

fn number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_none(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.trim().eq_ignore_ascii_case("none"),
        _ => false,
    }
}

//! Host serial device enumeration.

use super::error::PortError;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use serialport::SerialPortType;

/// One serial device found on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub device: String,
    /// Human readable description, `n/a` when unknown.
    pub description: String,
    /// Hardware identifier, e.g. `USB VID:PID=0403:6001 SER=A50285BI`.
    pub hwid: String,
}

/// Lists serial devices present on the host.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceEnumerator: Send {
    /// All devices, in the order the platform reports them.
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, PortError>;
}

/// Filter `devices` to those whose device path, description or hardware ID
/// matches `pattern` (case-insensitive regex search).
pub fn grep_devices(
    devices: Vec<DeviceInfo>,
    pattern: &str,
) -> Result<Vec<DeviceInfo>, regex::Error> {
    let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
    Ok(devices
        .into_iter()
        .filter(|d| {
            regex.is_match(&d.device) || regex.is_match(&d.description) || regex.is_match(&d.hwid)
        })
        .collect())
}

/// Enumerator backed by `serialport::available_ports`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnumerator;

impl DeviceEnumerator for SystemEnumerator {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, PortError> {
        let ports = serialport::available_ports()?;
        Ok(ports
            .into_iter()
            .map(|info| {
                let (description, hwid) = describe(&info.port_type);
                DeviceInfo {
                    device: info.port_name,
                    description,
                    hwid,
                }
            })
            .collect())
    }
}

fn describe(port_type: &SerialPortType) -> (String, String) {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let description = usb
                .product
                .clone()
                .or_else(|| usb.manufacturer.clone())
                .unwrap_or_else(|| "n/a".to_string());
            let mut hwid = format!("USB VID:PID={:04X}:{:04X}", usb.vid, usb.pid);
            if let Some(serial) = &usb.serial_number {
                hwid.push_str(" SER=");
                hwid.push_str(serial);
            }
            (description, hwid)
        }
        SerialPortType::PciPort => ("PCI serial port".to_string(), "PCI".to_string()),
        SerialPortType::BluetoothPort => {
            ("Bluetooth serial port".to_string(), "BLUETOOTH".to_string())
        }
        SerialPortType::Unknown => ("n/a".to_string(), "n/a".to_string()),
    }
}

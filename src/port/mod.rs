//! Port abstraction layer for serial communication.
//!
//! Provides the transport trait, a `serialport`-backed implementation, an
//! in-memory loopback for `loop://` locators, and host device enumeration.

pub mod discovery;
pub mod error;
pub mod loopback;
pub mod sync_port;
pub mod traits;

pub use discovery::{grep_devices, DeviceEnumerator, DeviceInfo, SystemEnumerator};
pub use error::PortError;
pub use loopback::LoopbackPort;
pub use sync_port::*;
pub use traits::*;

/// Opener used by default: `loop://` locators get a [`LoopbackPort`],
/// anything else is a system device.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl PortOpener for SystemOpener {
    fn create(
        &self,
        locator: &str,
        settings: &PortSettings,
        open: bool,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let mut port: Box<dyn SerialPortAdapter> = if LoopbackPort::handles(locator) {
            Box::new(LoopbackPort::new(locator, settings.clone()))
        } else {
            Box::new(SyncSerialPort::closed(locator, settings.clone()))
        };
        if open {
            port.open()?;
        } else {
            port.close()?;
        }
        Ok(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_opener_loopback() {
        let port = SystemOpener
            .create("loop://", &PortSettings::default(), true)
            .unwrap();
        assert!(port.is_open());
        assert_eq!(port.name(), "loop://");

        let port = SystemOpener
            .create("loop://closed", &PortSettings::default(), false)
            .unwrap();
        assert!(!port.is_open());
    }

    #[test]
    fn test_system_opener_deferred_device() {
        // A closed handle never touches the device.
        let port = SystemOpener
            .create("/dev/does-not-exist", &PortSettings::default(), false)
            .unwrap();
        assert!(!port.is_open());
    }
}

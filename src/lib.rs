//! Serial Session Library
//!
//! Keyword-style control over several serial ports from one test session:
//! add, switch and delete ports, read with terminator/size/timeout framing,
//! assert on received data and on modem control lines.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support
//! - `error`: Session error type
//! - `port`: Port abstraction layer (system devices, `loop://` loopback, enumeration)
//! - `parameter`: Recognised connection parameters and value coercion
//! - `defaults`: Default settings for newly added ports
//! - `encoding`: Text/byte encodings used by reads and writes
//! - `state`: Port registry and current-port tracking
//! - `service`: The `SerialSession` and all its operations
//! - `logging`: Subscriber setup and the data logger

pub mod config;
pub mod defaults;
pub mod encoding;
pub mod error;
pub mod logging;
pub mod parameter;
pub mod port;
pub mod service;
pub mod state;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigLoader, SessionConfig};
pub use encoding::Encoding;
pub use error::{SessionError, SessionResult};
pub use parameter::{Parameter, ParameterValue, SwitchValue};
pub use port::{
    DataBits, DeviceInfo, LoopbackPort, Parity, PortError, PortSettings, SerialPortAdapter,
    StopBits, SyncSerialPort,
};
pub use service::{AddPortOptions, Line, SerialSession, SessionBuilder};
pub use state::{PortEntry, PortRegistry, SharedSession};

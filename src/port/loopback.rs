//! In-memory loopback transport for `loop://` locators.
//!
//! Everything written to a `LoopbackPort` becomes readable from it. Control
//! lines are wired back the same way: RTS drives CTS, DTR drives DSR and CD,
//! RI is never asserted.

use super::error::PortError;
use super::traits::{PortSettings, SerialPortAdapter};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// URL scheme handled by [`LoopbackPort`].
pub const LOOPBACK_SCHEME: &str = "loop://";

/// Inner state of the loopback, shared between clones.
#[derive(Debug)]
struct LoopbackState {
    /// Bytes written and not yet read back.
    queue: VecDeque<u8>,
    open: bool,
    rts: bool,
    dtr: bool,
    /// Break conditions sent since creation.
    breaks_sent: usize,
}

/// Loopback serial port.
///
/// Clones share the same buffer, so another thread can feed a port that a
/// session is blocked reading from.
///
/// # Example
/// ```
/// use serial_session::port::{LoopbackPort, PortSettings, SerialPortAdapter};
///
/// let mut port = LoopbackPort::new("loop://", PortSettings::default());
/// port.write_bytes(b"ping").unwrap();
///
/// let mut buffer = [0u8; 4];
/// let n = port.read_bytes(&mut buffer, None).unwrap();
/// assert_eq!(&buffer[..n], b"ping");
/// ```
#[derive(Clone)]
pub struct LoopbackPort {
    name: String,
    settings: PortSettings,
    state: Arc<(Mutex<LoopbackState>, Condvar)>,
}

impl LoopbackPort {
    /// Create an open loopback with the given settings.
    pub fn new(name: impl Into<String>, settings: PortSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            state: Arc::new((
                Mutex::new(LoopbackState {
                    queue: VecDeque::new(),
                    open: true,
                    rts: true,
                    dtr: true,
                    breaks_sent: 0,
                }),
                Condvar::new(),
            )),
        }
    }

    /// Whether `locator` names a loopback (`loop://`, optionally with a query).
    pub fn handles(locator: &str) -> bool {
        locator.starts_with(LOOPBACK_SCHEME)
    }

    /// Number of break conditions sent on this port.
    pub fn breaks_sent(&self) -> usize {
        self.state.0.lock().breaks_sent
    }

    fn ensure_open(state: &LoopbackState) -> Result<(), PortError> {
        if state.open {
            Ok(())
        } else {
            Err(PortError::NotOpen)
        }
    }

    fn with_open<T>(&self, f: impl FnOnce(&mut LoopbackState) -> T) -> Result<T, PortError> {
        let mut state = self.state.0.lock();
        Self::ensure_open(&state)?;
        Ok(f(&mut state))
    }
}

impl SerialPortAdapter for LoopbackPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn settings(&self) -> &PortSettings {
        &self.settings
    }

    fn apply_settings(&mut self, settings: PortSettings) -> Result<(), PortError> {
        self.settings = settings;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.0.lock().open
    }

    fn open(&mut self) -> Result<(), PortError> {
        self.state.0.lock().open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), PortError> {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock();
        state.open = false;
        state.queue.clear();
        cvar.notify_all();
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock();
        Self::ensure_open(&state)?;
        state.queue.extend(data);
        cvar.notify_all();
        Ok(data.len())
    }

    fn read_bytes(
        &mut self,
        buffer: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, PortError> {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock();
        Self::ensure_open(&state)?;

        if buffer.is_empty() {
            return Ok(0);
        }

        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        while state.queue.is_empty() {
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Ok(0);
                    }
                    cvar.wait_until(&mut state, deadline);
                }
                None => cvar.wait(&mut state),
            }
            Self::ensure_open(&state)?;
        }

        let n = buffer.len().min(state.queue.len());
        for (slot, byte) in buffer.iter_mut().zip(state.queue.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn bytes_to_read(&self) -> Result<usize, PortError> {
        self.with_open(|state| state.queue.len())
    }

    fn bytes_to_write(&self) -> Result<usize, PortError> {
        self.with_open(|_| 0)
    }

    fn flush(&mut self) -> Result<(), PortError> {
        self.with_open(|_| ())
    }

    fn reset_input_buffer(&mut self) -> Result<(), PortError> {
        self.with_open(|state| state.queue.clear())
    }

    fn reset_output_buffer(&mut self) -> Result<(), PortError> {
        self.with_open(|_| ())
    }

    fn send_break(&mut self, duration: Duration) -> Result<(), PortError> {
        self.with_open(|state| state.breaks_sent += 1)?;
        std::thread::sleep(duration);
        Ok(())
    }

    fn set_rts(&mut self, level: bool) -> Result<(), PortError> {
        self.state.0.lock().rts = level;
        Ok(())
    }

    fn set_dtr(&mut self, level: bool) -> Result<(), PortError> {
        self.state.0.lock().dtr = level;
        Ok(())
    }

    fn rts(&self) -> bool {
        self.state.0.lock().rts
    }

    fn dtr(&self) -> bool {
        self.state.0.lock().dtr
    }

    fn cts(&mut self) -> Result<bool, PortError> {
        self.with_open(|state| state.rts)
    }

    fn dsr(&mut self) -> Result<bool, PortError> {
        self.with_open(|state| state.dtr)
    }

    fn ri(&mut self) -> Result<bool, PortError> {
        self.with_open(|_| false)
    }

    fn cd(&mut self) -> Result<bool, PortError> {
        self.with_open(|state| state.dtr)
    }
}

impl std::fmt::Debug for LoopbackPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.0.lock();
        f.debug_struct("LoopbackPort")
            .field("name", &self.name)
            .field("open", &state.open)
            .field("available_bytes", &state.queue.len())
            .finish()
    }
}

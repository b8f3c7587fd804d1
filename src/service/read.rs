//! Read engine and write operations.
//!
//! Reads follow the port's own timeout settings: `timeout` bounds the whole
//! call, `inter_byte_timeout` bounds the gap between bytes once data has
//! started arriving. Running out of time is not an error; the caller gets
//! whatever was collected.

use super::SerialSession;
use crate::encoding::Encoding;
use crate::error::{SessionError, SessionResult};
use crate::logging::LogLevel;
use crate::port::SerialPortAdapter;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

/// Terminator used by `read_until` when none is given. Raw bytes, not
/// passed through the encoding.
pub const LINE_TERMINATOR: &[u8] = b"\n";

/// Largest buffer a single transport read fills.
const READ_CHUNK: usize = 4096;

impl SerialSession {
    /// Read everything waiting in the input buffer.
    pub fn read_all_data(
        &mut self,
        encoding: Option<&str>,
        locator: Option<&str>,
    ) -> SessionResult<String> {
        let encoding = self.encoding_for(encoding)?;
        let data = read_available(self.open_port_mut(locator)?)?;
        Ok(encoding.decode(&data))
    }

    /// Read `size` bytes, or fewer if the port's timeout runs out first.
    pub fn read_n_bytes(
        &mut self,
        size: usize,
        encoding: Option<&str>,
        locator: Option<&str>,
    ) -> SessionResult<String> {
        let encoding = self.encoding_for(encoding)?;
        let data = read_up_to(self.open_port_mut(locator)?, size)?;
        if data.len() < size {
            debug!(requested = size, received = data.len(), "read timed out short");
        }
        Ok(encoding.decode(&data))
    }

    /// Read until the data ends with `terminator`, `size` bytes have been
    /// collected, or the port's timeout runs out.
    ///
    /// `terminator` is written in the active encoding (`"0D 0A"` for
    /// hexlify); without one a newline byte ends the read. The terminator
    /// is part of the result.
    pub fn read_until(
        &mut self,
        terminator: Option<&str>,
        size: Option<usize>,
        encoding: Option<&str>,
        locator: Option<&str>,
    ) -> SessionResult<String> {
        let encoding = self.encoding_for(encoding)?;
        let terminator = match terminator {
            Some(terminator) => encoding.encode(terminator)?,
            None => LINE_TERMINATOR.to_vec(),
        };
        let data = read_until_terminator(self.open_port_mut(locator)?, &terminator, size)?;
        Ok(encoding.decode(&data))
    }

    /// Read everything waiting and compare it with `expected`.
    ///
    /// The comparison is done on bytes, so `"0a"` and `"0A"` are the same
    /// data under hexlify. On mismatch both sides are reported as hex.
    pub fn read_data_should_be(
        &mut self,
        expected: &str,
        encoding: Option<&str>,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        let encoding = self.encoding_for(encoding)?;
        let expected = encoding.encode(expected)?;
        let actual = read_available(self.open_port_mut(locator)?)?;
        if actual != expected {
            return Err(SessionError::DataMismatch {
                actual: Encoding::Hexlify.decode(&actual),
                expected: Encoding::Hexlify.decode(&expected),
            });
        }
        Ok(())
    }

    /// Read everything waiting and hand it to the data logger.
    ///
    /// `loglevel` is one of `info`, `debug` or `warn`; it is checked before
    /// anything is read.
    pub fn read_all_and_log(
        &mut self,
        loglevel: &str,
        encoding: Option<&str>,
        locator: Option<&str>,
    ) -> SessionResult<()> {
        let level: LogLevel = loglevel.parse()?;
        let data = self.read_all_data(encoding, locator)?;
        self.logger.emit(level, &data);
        Ok(())
    }

    /// Encode `data` and write it. Returns the number of bytes written.
    pub fn write_data(
        &mut self,
        data: &str,
        encoding: Option<&str>,
        locator: Option<&str>,
    ) -> SessionResult<usize> {
        let encoding = self.encoding_for(encoding)?;
        let bytes = encoding.encode(data)?;
        self.write_bytes(&bytes, locator)
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, data: &[u8], locator: Option<&str>) -> SessionResult<usize> {
        let port = self.open_port_mut(locator)?;
        let written = port.write_bytes(data)?;
        debug!(port = port.name(), bytes = written, "wrote data");
        Ok(written)
    }

    /// Write `length` bytes of a file starting at `offset` (the rest of the
    /// file when `length` is `None`).
    pub fn write_file_data(
        &mut self,
        path: impl AsRef<Path>,
        offset: u64,
        length: Option<u64>,
        locator: Option<&str>,
    ) -> SessionResult<usize> {
        // Fail on a closed port before touching the file.
        self.open_port_mut(locator)?;

        let mut file = File::open(path.as_ref())?;
        file.seek(SeekFrom::Start(offset))?;
        let mut data = Vec::new();
        match length {
            Some(length) => file.take(length).read_to_end(&mut data)?,
            None => file.read_to_end(&mut data)?,
        };
        self.write_bytes(&data, locator)
    }
}

fn remaining(deadline: Option<Instant>) -> Option<Duration> {
    deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

/// `None` when reads block, including timeouts too long to represent.
fn deadline(port: &dyn SerialPortAdapter) -> Option<Instant> {
    port.settings()
        .timeout
        .and_then(|timeout| Instant::now().checked_add(timeout))
}

/// Everything currently in the input buffer.
fn read_available(port: &mut dyn SerialPortAdapter) -> SessionResult<Vec<u8>> {
    let waiting = port.bytes_to_read()?;
    if waiting == 0 {
        return Ok(Vec::new());
    }
    read_up_to(port, waiting)
}

/// Up to `size` bytes within the port's timeouts. At least one read is
/// attempted, even with a zero timeout.
fn read_up_to(port: &mut dyn SerialPortAdapter, size: usize) -> SessionResult<Vec<u8>> {
    let deadline = deadline(port);
    let inter_byte = port.settings().inter_byte_timeout;
    let mut data = Vec::new();
    let mut chunk = vec![0u8; size.min(READ_CHUNK)];

    while data.len() < size {
        let mut wait = remaining(deadline);
        if !data.is_empty() {
            if let Some(gap) = inter_byte {
                wait = Some(wait.map_or(gap, |wait| wait.min(gap)));
            }
        }

        let want = chunk.len().min(size - data.len());
        let n = port.read_bytes(&mut chunk[..want], wait)?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
        if expired(deadline) {
            break;
        }
    }
    Ok(data)
}

/// Byte-by-byte read that stops right after `terminator`, at `size` bytes,
/// or when the deadline passes.
fn read_until_terminator(
    port: &mut dyn SerialPortAdapter,
    terminator: &[u8],
    size: Option<usize>,
) -> SessionResult<Vec<u8>> {
    let deadline = deadline(port);
    let mut data = Vec::new();
    let mut byte = [0u8; 1];

    while size.map_or(true, |size| data.len() < size) {
        if port.read_bytes(&mut byte, remaining(deadline))? == 0 {
            break;
        }
        data.push(byte[0]);
        if !terminator.is_empty() && data.ends_with(terminator) {
            break;
        }
        if expired(deadline) {
            break;
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{LoopbackPort, PortSettings};
    use pretty_assertions::assert_eq;

    fn loopback(timeout: Option<Duration>) -> LoopbackPort {
        let settings = PortSettings {
            timeout,
            ..PortSettings::default()
        };
        LoopbackPort::new("loop://", settings)
    }

    #[test]
    fn test_read_up_to_short_on_timeout() {
        let mut port = loopback(Some(Duration::from_millis(20)));
        port.write_bytes(&[1, 2]).unwrap();
        assert_eq!(read_up_to(&mut port, 4).unwrap(), vec![1, 2]);
        assert!(read_up_to(&mut port, 4).unwrap().is_empty());
    }

    #[test]
    fn test_read_up_to_zero_timeout_still_reads() {
        let mut port = loopback(Some(Duration::ZERO));
        port.write_bytes(&[7, 8, 9]).unwrap();
        assert_eq!(read_up_to(&mut port, 2).unwrap(), vec![7, 8]);
    }

    #[test]
    fn test_read_up_to_collects_late_bytes() {
        let mut port = loopback(Some(Duration::from_secs(5)));
        let mut writer = port.clone();
        let handle = std::thread::spawn(move || {
            writer.write_bytes(&[1]).unwrap();
            std::thread::sleep(Duration::from_millis(20));
            writer.write_bytes(&[2]).unwrap();
        });
        assert_eq!(read_up_to(&mut port, 2).unwrap(), vec![1, 2]);
        handle.join().unwrap();
    }

    #[test]
    fn test_inter_byte_timeout_cuts_gap() {
        let mut port = loopback(Some(Duration::from_secs(5)));
        let mut settings = port.settings().clone();
        settings.inter_byte_timeout = Some(Duration::from_millis(20));
        port.apply_settings(settings).unwrap();
        port.write_bytes(&[1]).unwrap();

        let started = Instant::now();
        assert_eq!(read_up_to(&mut port, 3).unwrap(), vec![1]);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_read_until_terminator_and_size() {
        let mut port = loopback(Some(Duration::from_millis(20)));
        port.write_bytes(b"ab\r\ncdef").unwrap();
        assert_eq!(read_until_terminator(&mut port, b"\r\n", None).unwrap(), b"ab\r\n");
        assert_eq!(read_until_terminator(&mut port, b"\n", Some(3)).unwrap(), b"cde");
        assert_eq!(read_until_terminator(&mut port, b"\n", None).unwrap(), b"f");
        assert!(read_until_terminator(&mut port, b"\n", None).unwrap().is_empty());
    }

    #[test]
    fn test_read_until_zero_size_reads_nothing() {
        let mut port = loopback(Some(Duration::from_millis(20)));
        port.write_bytes(b"x").unwrap();
        assert!(read_until_terminator(&mut port, b"\n", Some(0)).unwrap().is_empty());
        assert_eq!(port.bytes_to_read().unwrap(), 1);
    }

    #[test]
    fn test_read_available_empty() {
        let mut port = loopback(None);
        assert!(read_available(&mut port).unwrap().is_empty());
    }
}

//! Read engine scenarios over the `loop://` transport.

mod common;

use common::{loopback_session, RecordingLogger};
use pretty_assertions::assert_eq;
use serial_session::logging::LogLevel;
use serial_session::port::{LoopbackPort, PortError, PortOpener, PortSettings, SerialPortAdapter};
use serial_session::service::{AddPortOptions, SerialSession};
use serial_session::SessionError;
use std::io::Write;
use std::time::{Duration, Instant};

#[test]
fn read_all_returns_written_bytes() {
    let mut session = loopback_session();
    assert_eq!(session.read_all_data(None, None).unwrap(), "");

    session
        .write_data("01 23 45 67 89 AB CD EF", None, None)
        .unwrap();
    assert_eq!(
        session.read_all_data(None, None).unwrap(),
        "01 23 45 67 89 AB CD EF"
    );
    assert_eq!(session.read_all_data(None, None).unwrap(), "");
}

#[test]
fn read_until_resumes_where_previous_read_stopped() {
    let mut session = loopback_session();
    session
        .write_data("01 23 45 0A 67 89 AB CD EF", None, None)
        .unwrap();

    assert_eq!(
        session.read_until(None, None, None, None).unwrap(),
        "01 23 45 0A"
    );
    assert_eq!(session.read_until(None, Some(2), None, None).unwrap(), "67 89");
    assert_eq!(
        session.read_until(Some("CD"), None, None, None).unwrap(),
        "AB CD"
    );
    assert_eq!(session.read_until(None, None, None, None).unwrap(), "EF");
    assert_eq!(session.read_until(None, None, None, None).unwrap(), "");
}

#[test]
fn read_until_terminator_in_text_encoding() {
    let mut session = loopback_session();
    session
        .write_data("OK\r\nERROR\r\n", Some("ascii"), None)
        .unwrap();

    assert_eq!(
        session
            .read_until(Some("\r\n"), None, Some("ascii"), None)
            .unwrap(),
        "OK\r\n"
    );
    assert_eq!(
        session
            .read_until(Some("\r\n"), None, Some("ascii"), None)
            .unwrap(),
        "ERROR\r\n"
    );
}

#[test]
fn read_until_timeout_is_bounded() {
    let mut session = loopback_session();
    session.write_data("41 42", None, None).unwrap();

    let started = Instant::now();
    assert_eq!(session.read_until(None, None, None, None).unwrap(), "41 42");
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn read_n_bytes_returns_short_on_timeout() {
    let mut session = loopback_session();
    session.write_data("01 02 03", None, None).unwrap();

    assert_eq!(session.read_n_bytes(2, None, None).unwrap(), "01 02");
    assert_eq!(session.read_n_bytes(4, None, None).unwrap(), "03");
    assert_eq!(session.read_n_bytes(1, None, None).unwrap(), "");
}

/// Opener handing out clones of one loopback, so the test keeps a writer
/// end while the session reads.
struct SharedLoopback(LoopbackPort);

impl PortOpener for SharedLoopback {
    fn create(
        &self,
        _locator: &str,
        settings: &PortSettings,
        open: bool,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let mut port = self.0.clone();
        port.apply_settings(settings.clone())?;
        if !open {
            port.close()?;
        }
        Ok(Box::new(port))
    }
}

#[test]
fn read_n_bytes_waits_for_late_data() {
    let wire = LoopbackPort::new("loop://", PortSettings::default());
    let mut session = SerialSession::builder()
        .opener(SharedLoopback(wire.clone()))
        .build()
        .unwrap();
    session
        .add_port("loop://", AddPortOptions::new().with("timeout", 5))
        .unwrap();

    let mut writer = wire;
    let handle = std::thread::spawn(move || {
        writer.write_bytes(&[0xAA]).unwrap();
        std::thread::sleep(Duration::from_millis(30));
        writer.write_bytes(&[0xBB]).unwrap();
    });

    assert_eq!(session.read_n_bytes(2, None, None).unwrap(), "AA BB");
    handle.join().unwrap();
}

#[test]
fn read_data_should_be_compares_bytes() {
    let mut session = loopback_session();
    session.write_data("0a ff", None, None).unwrap();
    session.read_data_should_be("0A FF", None, None).unwrap();

    session.write_data("01 02", None, None).unwrap();
    let err = session.read_data_should_be("01 03", None, None).unwrap_err();
    assert_eq!(err.to_string(), "'01 02'(read) != '01 03'(data)");
}

#[test]
fn read_data_should_be_reports_hex_for_text_encodings() {
    let mut session = loopback_session();
    session.set_encoding(Some("ascii")).unwrap();
    session.write_data("AB", None, None).unwrap();
    let err = session.read_data_should_be("AC", None, None).unwrap_err();
    assert!(matches!(
        err,
        SessionError::DataMismatch { actual, expected } if actual == "41 42" && expected == "41 43"
    ));
}

#[test]
fn read_all_and_log_forwards_to_logger() {
    let logger = RecordingLogger::default();
    let mut session = SerialSession::builder()
        .logger(logger.clone())
        .port(Some("loop://".to_string()))
        .build()
        .unwrap();

    session.write_data("DE AD", None, None).unwrap();
    session.read_all_and_log("WARN", None, None).unwrap();
    session.read_all_and_log("info", None, None).unwrap();

    assert_eq!(
        logger.records(),
        vec![
            (LogLevel::Warn, "DE AD".to_string()),
            (LogLevel::Info, String::new())
        ]
    );
}

#[test]
fn read_all_and_log_rejects_unknown_level_before_reading() {
    let mut session = loopback_session();
    session.write_data("01", None, None).unwrap();
    let err = session.read_all_and_log("trace", None, None).unwrap_err();
    assert_eq!(err.to_string(), "Invalid loglevel: trace");
    assert_eq!(session.read_all_data(None, None).unwrap(), "01");
}

#[test]
fn per_call_encoding_overrides_default() {
    let mut session = loopback_session();
    session.write_data("hi", Some("utf-8"), None).unwrap();
    assert_eq!(session.read_all_data(None, None).unwrap(), "68 69");

    session.write_data("68 69", None, None).unwrap();
    assert_eq!(session.read_all_data(Some("latin-1"), None).unwrap(), "hi");
    assert!(matches!(
        session.read_all_data(Some("ebcdic"), None),
        Err(SessionError::UnknownEncoding(_))
    ));
}

#[test]
fn invalid_hex_is_rejected_before_writing() {
    let mut session = loopback_session();
    assert!(matches!(
        session.write_data("01 XYZ", None, None),
        Err(SessionError::InvalidData { .. })
    ));
    assert_eq!(session.read_all_data(None, None).unwrap(), "");
}

#[test]
fn reads_target_the_addressed_port() {
    let mut session = common::session_with_ports(&["loop://a", "loop://b"]);
    session.write_data("0A", None, Some("loop://b")).unwrap();

    assert_eq!(session.read_all_data(None, None).unwrap(), "");
    assert_eq!(session.read_all_data(None, Some("loop://b")).unwrap(), "0A");
}

#[test]
fn reads_on_closed_port_fail() {
    let mut session = loopback_session();
    session.close_port(None).unwrap();
    assert!(matches!(
        session.read_all_data(None, None),
        Err(SessionError::PortClosed)
    ));
    assert!(matches!(
        session.read_until(None, None, None, None),
        Err(SessionError::PortClosed)
    ));
    assert!(matches!(
        session.write_data("01", None, None),
        Err(SessionError::PortClosed)
    ));
}

#[test]
fn write_file_data_sends_slice() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0x10, 0x11, 0x12, 0x13, 0x14]).unwrap();
    file.flush().unwrap();

    let mut session = loopback_session();
    assert_eq!(
        session
            .write_file_data(file.path(), 1, Some(3), None)
            .unwrap(),
        3
    );
    assert_eq!(session.read_all_data(None, None).unwrap(), "11 12 13");

    session.write_file_data(file.path(), 3, None, None).unwrap();
    assert_eq!(session.read_all_data(None, None).unwrap(), "13 14");

    assert!(matches!(
        session.write_file_data("/no/such/file.bin", 0, None, None),
        Err(SessionError::Io(_))
    ));
}

#[test]
fn reads_with_unrepresentable_deadline_block_like_no_timeout() {
    let mut session = loopback_session();
    session.set_port_parameter("timeout", 1.5e19, None).unwrap();
    session.write_data("01 02", None, None).unwrap();

    assert_eq!(session.read_n_bytes(1, None, None).unwrap(), "01");
    assert_eq!(session.read_until(Some("02"), None, None, None).unwrap(), "02");
    assert_eq!(session.read_all_data(None, None).unwrap(), "");
}

#[test]
fn read_n_bytes_huge_count_returns_what_arrives() {
    let mut session = loopback_session();
    session.write_data("01", None, None).unwrap();
    assert_eq!(session.read_n_bytes(usize::MAX, None, None).unwrap(), "01");

    session.write_bytes(&[0x5A; 5000], None).unwrap();
    let read = session.read_n_bytes(1 << 34, None, None).unwrap();
    assert_eq!(read.split(' ').count(), 5000);
}

//! Text encodings used between test data and port bytes.
//!
//! `encode` turns caller text into bytes for the wire, `decode` renders
//! bytes read from the wire as text. The default `hexlify` scheme writes
//! bytes as space-separated upper-case hex pairs.

use crate::error::{SessionError, SessionResult};
use std::fmt;
use std::str::FromStr;

/// Supported encoding schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// `"01 23 AB"` <-> `[0x01, 0x23, 0xAB]`.
    #[default]
    Hexlify,
    /// 7-bit ASCII. Undecodable bytes become U+FFFD.
    Ascii,
    /// UTF-8. Invalid sequences become U+FFFD.
    Utf8,
    /// ISO-8859-1, one char per byte.
    Latin1,
}

impl Encoding {
    /// Canonical name of the scheme.
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Hexlify => "hexlify",
            Encoding::Ascii => "ascii",
            Encoding::Utf8 => "utf-8",
            Encoding::Latin1 => "latin-1",
        }
    }

    /// Look up a scheme by name, case-insensitively.
    pub fn from_name(name: &str) -> SessionResult<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "hexlify" => Ok(Encoding::Hexlify),
            "ascii" | "us-ascii" => Ok(Encoding::Ascii),
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(Encoding::Latin1),
            _ => Err(SessionError::UnknownEncoding(name.to_string())),
        }
    }

    /// Convert text to the bytes it stands for.
    pub fn encode(self, text: &str) -> SessionResult<Vec<u8>> {
        match self {
            Encoding::Hexlify => text.split_whitespace().map(|t| self.hex_byte(t)).collect(),
            Encoding::Ascii => text
                .chars()
                .map(|c| {
                    if c.is_ascii() {
                        Ok(c as u8)
                    } else {
                        Err(self.unencodable(c))
                    }
                })
                .collect(),
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| self.unencodable(c)))
                .collect(),
        }
    }

    /// Render bytes as text.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Hexlify => bytes
                .iter()
                .map(|b| format!("{b:02X}"))
                .collect::<Vec<_>>()
                .join(" "),
            Encoding::Ascii => bytes
                .iter()
                .map(|&b| {
                    if b.is_ascii() {
                        char::from(b)
                    } else {
                        char::REPLACEMENT_CHARACTER
                    }
                })
                .collect(),
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }

    fn hex_byte(self, token: &str) -> SessionResult<u8> {
        if token.is_empty() || token.len() > 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SessionError::InvalidData {
                encoding: self.name().to_string(),
                reason: format!("'{token}' is not a hex byte"),
            });
        }
        u8::from_str_radix(token, 16).map_err(|e| SessionError::InvalidData {
            encoding: self.name().to_string(),
            reason: e.to_string(),
        })
    }

    fn unencodable(self, c: char) -> SessionError {
        SessionError::InvalidData {
            encoding: self.name().to_string(),
            reason: format!("character {c:?} is out of range"),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_hexlify_encode_is_case_insensitive() {
        let bytes = Encoding::Hexlify.encode("01 23 ab Cd ef").unwrap();
        assert_eq!(bytes, vec![0x01, 0x23, 0xAB, 0xCD, 0xEF]);
    }

    #[test]
    fn test_hexlify_single_digit_and_whitespace() {
        let bytes = Encoding::Hexlify.encode("  A\t0a\n").unwrap();
        assert_eq!(bytes, vec![0x0A, 0x0A]);
        assert!(Encoding::Hexlify.encode("").unwrap().is_empty());
    }

    #[test]
    fn test_hexlify_rejects_garbage() {
        assert!(matches!(
            Encoding::Hexlify.encode("0x1"),
            Err(SessionError::InvalidData { .. })
        ));
        assert!(Encoding::Hexlify.encode("123").is_err());
        assert!(Encoding::Hexlify.encode("+1").is_err());
    }

    #[test]
    fn test_hexlify_decode_format() {
        let text = Encoding::Hexlify.decode(&[0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF]);
        assert_eq!(text, "01 23 45 67 89 AB CD EF");
        assert_eq!(Encoding::Hexlify.decode(&[]), "");
    }

    #[test]
    fn test_ascii() {
        assert_eq!(Encoding::Ascii.encode("Hello").unwrap(), b"Hello".to_vec());
        assert!(Encoding::Ascii.encode("héllo").is_err());
        assert_eq!(Encoding::Ascii.decode(&[0x48, 0xFF]), "H\u{FFFD}");
    }

    #[test]
    fn test_latin1() {
        assert_eq!(Encoding::Latin1.encode("é").unwrap(), vec![0xE9]);
        assert!(Encoding::Latin1.encode("€").is_err());
        assert_eq!(Encoding::Latin1.decode(&[0xE9]), "é");
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(Encoding::from_name("HEXLIFY").unwrap(), Encoding::Hexlify);
        assert_eq!(Encoding::from_name("utf_8").unwrap(), Encoding::Utf8);
        assert_eq!("ISO-8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert!(matches!(
            Encoding::from_name("ebcdic"),
            Err(SessionError::UnknownEncoding(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_decode_encode_is_stable(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let ascii: Vec<u8> = bytes.iter().map(|b| b & 0x7F).collect();
            for (encoding, input) in [
                (Encoding::Hexlify, &bytes),
                (Encoding::Ascii, &ascii),
                (Encoding::Utf8, &bytes),
                (Encoding::Latin1, &bytes),
            ] {
                let once = encoding.decode(input);
                let again = encoding.decode(&encoding.encode(&once).unwrap());
                prop_assert_eq!(&again, &once);
            }
        }

        #[test]
        fn prop_hexlify_is_lossless(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let text = Encoding::Hexlify.decode(&bytes);
            prop_assert_eq!(Encoding::Hexlify.encode(&text).unwrap(), bytes);
        }
    }
}

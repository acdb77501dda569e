use std::io::{Read, Write};

use crate::error::WireError;

/// Magic bytes opening every connection: ASCII "BIO\0".
///
/// Raw bytes rather than an integer so byte order never enters into it.
pub const MAGIC: [u8; 4] = *b"BIO\0";

/// Fixed preamble size in bytes.
pub const PREAMBLE_SIZE: usize = 6;

/// Current protocol version.
pub const VERSION: u8 = 1;

/// Connection preamble — the first 6 bytes a client sends after connecting.
///
/// ```text
/// ┌────────┬─────────┬──────────────────────────────────┐
/// │ Offset │ Size    │ Description                      │
/// ├────────┼─────────┼──────────────────────────────────┤
/// │ 0x00   │ 4 bytes │ Magic: "BIO\0"                   │
/// │ 0x04   │ 1 byte  │ Protocol version                 │
/// │ 0x05   │ 1 byte  │ Reserved (0x00)                  │
/// └────────┴─────────┴──────────────────────────────────┘
/// ```
///
/// The server validates in arrival order — magic (is this even our
/// protocol?), then version, then the reserved byte — so each failure mode
/// gets the most specific error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preamble {
    pub version: u8,
}

impl Preamble {
    /// Preamble for the version this build speaks.
    #[must_use]
    pub fn current() -> Self {
        Self { version: VERSION }
    }

    /// Write the 6-byte preamble.
    ///
    /// # Errors
    ///
    /// [`WireError::Io`] if the write fails.
    pub fn write_to(&self, w: &mut impl Write) -> Result<(), WireError> {
        let mut buf = [0u8; PREAMBLE_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4] = self.version;
        buf[5] = 0x00; // reserved
        w.write_all(&buf)?;
        Ok(())
    }

    /// Read and validate a preamble.
    ///
    /// # Errors
    ///
    /// - [`WireError::Io`] if fewer than 6 bytes arrive.
    /// - [`WireError::InvalidMagic`] if the magic bytes don't match.
    /// - [`WireError::UnsupportedVersion`] if the version is unknown.
    /// - [`WireError::ReservedNonZero`] if the reserved byte is not 0x00.
    pub fn read_from(r: &mut impl Read) -> Result<Self, WireError> {
        let mut buf = [0u8; PREAMBLE_SIZE];
        r.read_exact(&mut buf)?;

        if buf[0..4] != MAGIC {
            return Err(WireError::InvalidMagic {
                found: [buf[0], buf[1], buf[2], buf[3]],
            });
        }

        let version = buf[4];
        if version != VERSION {
            return Err(WireError::UnsupportedVersion { version });
        }

        if buf[5] != 0x00 {
            return Err(WireError::ReservedNonZero { value: buf[5] });
        }

        Ok(Self { version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_current_preamble() {
        let mut buf = Vec::new();
        Preamble::current().write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), PREAMBLE_SIZE);
        let parsed = Preamble::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(parsed, Preamble::current());
    }

    #[test]
    fn magic_bytes_are_literal() {
        let mut buf = Vec::new();
        Preamble::current().write_to(&mut buf).unwrap();
        assert_eq!(&buf[0..4], b"BIO\0");
    }

    #[test]
    fn reject_bad_magic() {
        let buf = *b"NOPE\x01\x00";
        let result = Preamble::read_from(&mut buf.as_slice());
        assert!(matches!(
            result,
            Err(WireError::InvalidMagic { found }) if &found == b"NOPE"
        ));
    }

    #[test]
    fn reject_unsupported_version() {
        let mut buf = [0u8; PREAMBLE_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4] = 9;
        let result = Preamble::read_from(&mut buf.as_slice());
        assert!(matches!(
            result,
            Err(WireError::UnsupportedVersion { version: 9 })
        ));
    }

    #[test]
    fn reject_nonzero_reserved() {
        let mut buf = [0u8; PREAMBLE_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4] = VERSION;
        buf[5] = 0xFF;
        let result = Preamble::read_from(&mut buf.as_slice());
        assert!(matches!(
            result,
            Err(WireError::ReservedNonZero { value: 0xFF })
        ));
    }

    #[test]
    fn reject_truncated_preamble() {
        let buf = [0u8; 3];
        let result = Preamble::read_from(&mut buf.as_slice());
        assert!(matches!(result, Err(WireError::Io(_))));
    }
}

/// Errors from encoding or decoding the block-fetch wire protocol.
///
/// Decode validation is layered the way the bytes arrive: the connection
/// preamble first (magic, version, reserved byte), then per-request op
/// codes, then response framing (status, length guard, checksum).
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Connection preamble did not start with "BIO\0".
    #[error("invalid magic bytes: expected \"BIO\\0\", got {found:02X?}")]
    InvalidMagic { found: [u8; 4] },

    /// Peer speaks a protocol version this side does not.
    #[error("unsupported protocol version {version}")]
    UnsupportedVersion { version: u8 },

    /// Reserved preamble byte was non-zero.
    #[error("reserved preamble byte was {value:#04X}, expected 0x00")]
    ReservedNonZero { value: u8 },

    /// Unrecognized request op code.
    #[error("unknown request op {found:#04X}")]
    UnknownOp { found: u8 },

    /// Unrecognized response status byte.
    #[error("unknown response status {found:#04X}")]
    UnknownStatus { found: u8 },

    /// A declared frame length exceeds the safety limit.
    ///
    /// Guards against hostile or corrupt length fields allocating
    /// arbitrary memory on the receiving side.
    #[error("frame payload of {len} bytes exceeds limit of {limit}")]
    FrameTooLarge { len: u64, limit: u64 },

    /// Response payload did not hash to the checksum it was sent with.
    #[error("payload checksum mismatch: transfer corrupted")]
    ChecksumMismatch,

    /// I/O error from the underlying connection.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

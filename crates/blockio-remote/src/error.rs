use std::io;

use blockio_wire::WireError;

/// Errors from the remote block transport.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The server answered the request with a fault (unknown block,
    /// offset past end). The connection itself is still healthy.
    #[error("server fault: {message}")]
    Remote { message: String },

    /// The server's answer was well-formed on the wire but nonsensical
    /// for the request (wrong stat payload size, more data than asked).
    #[error("protocol violation: {detail}")]
    Protocol { detail: String },

    /// Frame-level failure: bad preamble, bad status, checksum mismatch.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// Connection-level I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RemoteError {
    /// Adapt into `io::Error` for the `BlockTransport` hook signatures.
    ///
    /// Plain I/O errors unwrap to themselves; everything else is wrapped
    /// with this type kept as the source, so callers can still downcast
    /// to see whether the server faulted or the wire broke.
    #[must_use]
    pub fn into_io(self) -> io::Error {
        match self {
            Self::Io(e) | Self::Wire(WireError::Io(e)) => e,
            other => io::Error::other(other),
        }
    }
}

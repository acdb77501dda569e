use std::io;

use crate::transport::BlockId;

/// Errors from [`BufferedBlockStream`](crate::BufferedBlockStream) operations.
///
/// Three families, detected in this order on every call:
///
/// ```text
///   StreamError
///   ├── Closed            ← operation on a closed stream (illegal state)
///   ├── RangeOutOfBounds  ← malformed (offset, len) for a bulk read
///   ├── SeekPastEnd       ← seek target beyond the block length
///   └── Transport(io)     ← the injected transport failed; passed through
///                           verbatim, stream state untouched
/// ```
///
/// Validation failures are raised before any state mutation or transport
/// call — a failed operation never partially advances the position.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The stream was closed, explicitly or by reading past the last byte.
    #[error("stream for block {block_id} is closed")]
    Closed { block_id: BlockId },

    /// A bulk read named a destination range outside its buffer.
    ///
    /// Covers both `offset + len` overflowing and the range exceeding the
    /// destination length.
    #[error("destination range invalid: offset {offset} + len {len} exceeds buffer of {dst_len} bytes")]
    RangeOutOfBounds {
        offset: usize,
        len: usize,
        dst_len: usize,
    },

    /// A seek targeted an offset beyond the end of the block.
    ///
    /// Seeking *to* the end (`target == block_size`) is legal; the next
    /// single-byte read then observes end-of-block.
    #[error("seek to {target} is past the end of block {block_id} ({block_size} bytes)")]
    SeekPastEnd {
        block_id: BlockId,
        target: u64,
        block_size: u64,
    },

    /// The transport hook failed. Not retried or reinterpreted here; the
    /// consumer decides whether to retry, seek, or close.
    #[error(transparent)]
    Transport(#[from] io::Error),
}

impl StreamError {
    /// Adapt into `io::Error` for the `std::io::Read`/`Seek` impls.
    ///
    /// Transport errors unwrap back to the original `io::Error`; the
    /// stream's own errors are wrapped, keeping this type as the source.
    #[must_use]
    pub fn into_io(self) -> io::Error {
        match self {
            Self::Transport(e) => e,
            other => io::Error::other(other),
        }
    }
}

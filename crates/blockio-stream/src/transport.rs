use std::fmt;
use std::io;

/// Identifies one block within a store.
///
/// Block ids are opaque to this crate — they are assigned by whatever
/// placed the block (a store layout, a cluster metadata service) and are
/// only carried along for transport addressing and error context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u64);

impl BlockId {
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the underlying numeric id.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for BlockId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The byte source behind a [`BufferedBlockStream`](crate::BufferedBlockStream).
///
/// A transport fetches ranges of one immutable block from wherever the
/// block physically lives — a file on local disk, a remote worker over the
/// network. The stream owns the buffering and positioning state machine;
/// the transport only answers positioned reads and observes consumption.
///
/// All calls are synchronous and blocking. The stream never retries a
/// failed call and never interprets transport errors — they surface to the
/// stream's caller unchanged, with stream state left exactly as it was
/// before the failed call. Cancellation and timeouts, if any, are the
/// transport's own business.
pub trait BlockTransport {
    /// Fill `dst` with block bytes starting at absolute offset `pos`.
    ///
    /// Used to (re)populate the stream's internal buffer. The stream always
    /// asks for its *current* position, which is how refills stay correct
    /// across seeks and skips: a fill must return bytes starting exactly at
    /// `pos`, never bytes from a previous window.
    ///
    /// Returns the number of bytes written to the front of `dst`. Short
    /// fills are allowed; returning 0 for a non-empty `dst` is treated by
    /// the stream as a transport fault, since `pos` is always strictly
    /// inside the block when this is called.
    ///
    /// # Errors
    ///
    /// Any I/O failure from the underlying source. The stream discards the
    /// (possibly partially written) window on error.
    fn fill(&mut self, pos: u64, dst: &mut [u8]) -> io::Result<usize>;

    /// Service a large read directly into the caller's buffer, bypassing
    /// the stream's internal buffer entirely.
    ///
    /// The stream only requests in-range spans (`pos + dst.len()` never
    /// exceeds the block size), so implementations are expected to fill
    /// `dst` completely or fail — a bypass read must not silently return a
    /// short count. Implementations account the delivered bytes to their
    /// metrics themselves; the stream does not call
    /// [`record_bytes_read`](Self::record_bytes_read) for bypass reads.
    ///
    /// # Errors
    ///
    /// Any I/O failure from the underlying source.
    fn read_direct(&mut self, pos: u64, dst: &mut [u8]) -> io::Result<usize>;

    /// Observe `n` bytes delivered to the consumer from the buffered path.
    ///
    /// Fire-and-forget: must not fail and must not touch stream state.
    fn record_bytes_read(&mut self, n: u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_id_roundtrips_raw_value() {
        let id = BlockId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(BlockId::from(42u64), id);
    }

    #[test]
    fn block_id_displays_as_plain_number() {
        assert_eq!(BlockId::new(7).to_string(), "7");
    }
}

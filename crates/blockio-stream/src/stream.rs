use std::io;

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::transport::{BlockId, BlockTransport};

/// Buffered, seekable, bounded read stream over one immutable block.
///
/// The stream knows the block's exact length and enforces it: reads clamp
/// at the end of the block, seeks beyond it fail, and `remaining()` is
/// always `block_size - pos`. Bytes come from an injected
/// [`BlockTransport`] — small reads are served from an internal buffer
/// refilled through the transport, while bulk reads larger than what the
/// buffer currently holds bypass it and go to the transport directly.
///
/// # Buffer window
///
/// The buffer holds one contiguous window of the block,
/// `[buf_start, buf_start + buf.len())`. A read is served from the window
/// only when the stream position lies inside it, so seeks and skips never
/// need to touch the buffer — a stale window is simply not consulted, and
/// the next out-of-window read refills at the current position. Bypass
/// reads additionally clear the window outright rather than leaving stale
/// contents behind.
///
/// # Lifecycle
///
/// Constructed with the block's identity and size; closed either
/// explicitly via [`close`](Self::close) or automatically the moment a
/// single-byte read observes the end of the block. Closing is one-way:
/// every subsequent read/seek/skip fails with [`StreamError::Closed`].
///
/// Not thread-safe — one instance belongs to one consumer, and all methods
/// take `&mut self`.
pub struct BufferedBlockStream<T: BlockTransport> {
    block_id: BlockId,
    block_size: u64,
    transport: T,
    /// Buffer window contents. `len()` is the window size; emptied when
    /// the window is invalidated, released entirely on close.
    buf: Vec<u8>,
    /// Absolute block offset of `buf[0]`.
    buf_start: u64,
    /// Configured window capacity. Kept separately from `buf.capacity()`,
    /// which the allocator may round up.
    capacity: usize,
    /// Absolute stream position, in `[0, block_size]`.
    pos: u64,
    closed: bool,
}

impl<T: BlockTransport> BufferedBlockStream<T> {
    /// Create a stream over block `block_id` of exactly `block_size` bytes.
    ///
    /// The internal buffer is allocated here, sized from `config` (a zero
    /// capacity is clamped to 1), and freed on close.
    pub fn new(block_id: BlockId, block_size: u64, transport: T, config: &StreamConfig) -> Self {
        let capacity = config.read_buffer_bytes.max(1);
        Self {
            block_id,
            block_size,
            transport,
            buf: Vec::with_capacity(capacity),
            buf_start: 0,
            capacity,
            pos: 0,
            closed: false,
        }
    }

    /// Read the next byte, or `None` at the end of the block.
    ///
    /// Observing the end auto-closes the stream: the `None` itself is
    /// returned once, and any later call fails with
    /// [`StreamError::Closed`]. (Bulk reads do *not* auto-close; callers
    /// using [`read_into`](Self::read_into) watch `remaining()` and close
    /// themselves.)
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] on a closed stream,
    /// [`StreamError::Transport`] if the refill fails.
    pub fn read_byte(&mut self) -> Result<Option<u8>, StreamError> {
        self.check_open()?;
        if self.pos == self.block_size {
            self.close();
            return Ok(None);
        }
        if self.buffered_remaining() == 0 {
            self.refill()?;
        }
        let idx = (self.pos - self.buf_start) as usize;
        let byte = self.buf[idx];
        self.pos += 1;
        self.transport.record_bytes_read(1);
        Ok(Some(byte))
    }

    /// Read up to `len` bytes into `dst[offset..offset + len]`.
    ///
    /// Returns the number of bytes read. The count is less than `len` only
    /// when the block has fewer bytes left; a request that merely exceeds
    /// the *buffered* bytes never returns short — it is serviced as a
    /// bypass read through the transport instead, leaving the internal
    /// buffer out of the transfer entirely.
    ///
    /// A `len` of 0 returns 0 without touching any state. Reading at the
    /// end of the block returns 0 and leaves the stream open.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] on a closed stream,
    /// [`StreamError::RangeOutOfBounds`] if `offset + len` overflows or
    /// exceeds `dst.len()` (checked before any state change),
    /// [`StreamError::Transport`] if the transport fails (position
    /// unchanged).
    pub fn read_into(
        &mut self,
        dst: &mut [u8],
        offset: usize,
        len: usize,
    ) -> Result<usize, StreamError> {
        self.check_open()?;
        let out_of_bounds = StreamError::RangeOutOfBounds {
            offset,
            len,
            dst_len: dst.len(),
        };
        let end = offset.checked_add(len).ok_or(out_of_bounds)?;
        if end > dst.len() {
            return Err(StreamError::RangeOutOfBounds {
                offset,
                len,
                dst_len: dst.len(),
            });
        }
        if len == 0 {
            return Ok(0);
        }

        let to_read = u64::min(len as u64, self.remaining()) as usize;
        if to_read == 0 {
            return Ok(0);
        }

        if len > self.buffered_remaining() {
            // Bypass path: the whole span goes to the transport, and the
            // window is invalidated rather than left stale.
            log::trace!(
                "block {}: bypass read of {} bytes at offset {}",
                self.block_id,
                to_read,
                self.pos
            );
            let n = self
                .transport
                .read_direct(self.pos, &mut dst[offset..offset + to_read])?;
            self.pos += n as u64;
            self.buf.clear();
            return Ok(n);
        }

        let idx = (self.pos - self.buf_start) as usize;
        dst[offset..offset + to_read].copy_from_slice(&self.buf[idx..idx + to_read]);
        self.pos += to_read as u64;
        self.transport.record_bytes_read(to_read as u64);
        Ok(to_read)
    }

    /// Fill as much of `dst` as the block has left.
    ///
    /// Equivalent to `read_into(dst, 0, dst.len())`.
    ///
    /// # Errors
    ///
    /// Same as [`read_into`](Self::read_into).
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize, StreamError> {
        let len = dst.len();
        self.read_into(dst, 0, len)
    }

    /// Bytes left between the current position and the end of the block.
    ///
    /// Pure; legal even on a closed stream.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.block_size - self.pos
    }

    /// Move the position to absolute offset `target`.
    ///
    /// The buffer is not reconciled here — the next read either finds the
    /// new position inside the current window or triggers a refill at it.
    /// Seeking to `block_size` exactly is allowed.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] on a closed stream,
    /// [`StreamError::SeekPastEnd`] if `target > block_size` (position
    /// unchanged).
    pub fn seek(&mut self, target: u64) -> Result<(), StreamError> {
        self.check_open()?;
        if target > self.block_size {
            return Err(StreamError::SeekPastEnd {
                block_id: self.block_id,
                target,
                block_size: self.block_size,
            });
        }
        self.pos = target;
        Ok(())
    }

    /// Advance the position by up to `n` bytes, clamping at the end of the
    /// block. Returns how far it actually moved; never fails for large `n`.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] on a closed stream.
    pub fn skip(&mut self, n: u64) -> Result<u64, StreamError> {
        self.check_open()?;
        let to_skip = u64::min(self.remaining(), n);
        self.pos += to_skip;
        Ok(to_skip)
    }

    /// Close the stream and release the buffer. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.buf = Vec::new();
    }

    #[must_use]
    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    #[must_use]
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Current absolute position in the block.
    #[must_use]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_open(&self) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed {
                block_id: self.block_id,
            });
        }
        Ok(())
    }

    /// Bytes the window can serve at the current position: nonzero only
    /// when `pos` lies inside `[buf_start, buf_start + buf.len())`.
    fn buffered_remaining(&self) -> usize {
        let window_end = self.buf_start + self.buf.len() as u64;
        if self.pos >= self.buf_start && self.pos < window_end {
            (window_end - self.pos) as usize
        } else {
            0
        }
    }

    /// Repopulate the window starting at the current position.
    ///
    /// Only called with `pos < block_size`, so there is always at least one
    /// byte to ask for. A transport that returns 0 bytes anyway is reported
    /// as an unexpected-EOF transport fault.
    fn refill(&mut self) -> Result<(), StreamError> {
        let want = u64::min(self.capacity as u64, self.remaining()) as usize;
        self.buf.clear();
        self.buf.resize(want, 0);
        let n = match self.transport.fill(self.pos, &mut self.buf) {
            Ok(n) => n,
            Err(e) => {
                // Partially written windows are not trustworthy.
                self.buf.clear();
                return Err(e.into());
            }
        };
        if n == 0 {
            self.buf.clear();
            return Err(StreamError::Transport(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "transport produced no data refilling block {} at offset {}",
                    self.block_id, self.pos
                ),
            )));
        }
        self.buf.truncate(n);
        self.buf_start = self.pos;
        log::trace!(
            "block {}: refilled {} bytes at offset {}",
            self.block_id,
            n,
            self.pos
        );
        Ok(())
    }
}

impl<T: BlockTransport> io::Read for BufferedBlockStream<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        BufferedBlockStream::read(self, buf).map_err(StreamError::into_io)
    }
}

impl<T: BlockTransport> io::Seek for BufferedBlockStream<T> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let target = match pos {
            io::SeekFrom::Start(n) => i128::from(n),
            io::SeekFrom::End(delta) => i128::from(self.block_size) + i128::from(delta),
            io::SeekFrom::Current(delta) => i128::from(self.pos) + i128::from(delta),
        };
        let target = u64::try_from(target).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before the start of the block",
            )
        })?;
        BufferedBlockStream::seek(self, target).map_err(StreamError::into_io)?;
        Ok(target)
    }
}

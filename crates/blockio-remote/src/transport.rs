use std::io;
use std::net::{TcpStream, ToSocketAddrs};

use blockio_stream::{BlockId, BlockTransport, BytesReadCounter};
use blockio_wire::{MAX_PAYLOAD_LEN, Preamble, Request, Response};

use crate::error::RemoteError;

/// Transport fetching one block from a remote block server over TCP.
///
/// One connection per transport instance, opened at
/// [`connect`](Self::connect) and held for the transport's lifetime —
/// matching the stream's exclusive-ownership model, there is never
/// request interleaving to untangle. Every call is a blocking
/// request/response round trip; timeouts and retries are the caller's
/// (or the socket's) business, not this type's.
///
/// Ranges larger than the protocol's per-frame payload limit are fetched
/// as a sequence of frames transparently.
#[derive(Debug)]
pub struct RemoteBlockTransport {
    block_id: BlockId,
    conn: TcpStream,
    metrics: BytesReadCounter,
}

impl RemoteBlockTransport {
    /// Connect to a block server and send the protocol preamble.
    ///
    /// # Errors
    ///
    /// [`RemoteError::Io`] if the connection cannot be established,
    /// [`RemoteError::Wire`] if the preamble cannot be written.
    pub fn connect(
        addr: impl ToSocketAddrs,
        block_id: BlockId,
        metrics: BytesReadCounter,
    ) -> Result<Self, RemoteError> {
        let mut conn = TcpStream::connect(addr)?;
        // Request frames are a few dozen bytes; don't let Nagle hold them.
        conn.set_nodelay(true)?;
        Preamble::current().write_to(&mut conn)?;
        if let Ok(peer) = conn.peer_addr() {
            log::debug!("block {block_id}: connected to {peer}");
        }
        Ok(Self {
            block_id,
            conn,
            metrics,
        })
    }

    #[must_use]
    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    /// Ask the server for the block's length in bytes.
    ///
    /// # Errors
    ///
    /// [`RemoteError::Remote`] if the server doesn't have the block,
    /// [`RemoteError::Protocol`] if the stat payload isn't 8 bytes, plus
    /// the usual wire and I/O failures.
    pub fn block_size(&mut self) -> Result<u64, RemoteError> {
        Request::Stat {
            block_id: self.block_id.raw(),
        }
        .write_to(&mut self.conn)?;
        match Response::read_from(&mut self.conn)? {
            Response::Data { payload } => {
                let raw: [u8; 8] =
                    payload
                        .as_slice()
                        .try_into()
                        .map_err(|_| RemoteError::Protocol {
                            detail: format!("stat payload of {} bytes, expected 8", payload.len()),
                        })?;
                Ok(u64::from_be_bytes(raw))
            }
            Response::Fault { message } => Err(RemoteError::Remote { message }),
        }
    }

    /// One READ round trip for at most [`MAX_PAYLOAD_LEN`] bytes.
    fn fetch(&mut self, offset: u64, len: u64) -> Result<Vec<u8>, RemoteError> {
        Request::Read {
            block_id: self.block_id.raw(),
            offset,
            len,
        }
        .write_to(&mut self.conn)?;
        match Response::read_from(&mut self.conn)? {
            Response::Data { payload } => {
                if payload.len() as u64 > len {
                    return Err(RemoteError::Protocol {
                        detail: format!("asked for {len} bytes, got {}", payload.len()),
                    });
                }
                Ok(payload)
            }
            Response::Fault { message } => Err(RemoteError::Remote { message }),
        }
    }

    /// Fetch into `dst`, splitting into frame-sized round trips as
    /// needed. Stops early if the server runs out of bytes.
    fn fetch_into(&mut self, pos: u64, dst: &mut [u8]) -> Result<usize, RemoteError> {
        let mut filled = 0;
        while filled < dst.len() {
            let want = u64::min((dst.len() - filled) as u64, MAX_PAYLOAD_LEN);
            let payload = self.fetch(pos + filled as u64, want)?;
            if payload.is_empty() {
                break;
            }
            dst[filled..filled + payload.len()].copy_from_slice(&payload);
            filled += payload.len();
            if (payload.len() as u64) < want {
                break;
            }
        }
        Ok(filled)
    }
}

impl BlockTransport for RemoteBlockTransport {
    fn fill(&mut self, pos: u64, dst: &mut [u8]) -> io::Result<usize> {
        let n = self
            .fetch_into(pos, dst)
            .map_err(RemoteError::into_io)?;
        log::debug!(
            "block {}: remote fill of {} bytes at offset {}",
            self.block_id,
            n,
            pos
        );
        Ok(n)
    }

    fn read_direct(&mut self, pos: u64, dst: &mut [u8]) -> io::Result<usize> {
        let n = self
            .fetch_into(pos, dst)
            .map_err(RemoteError::into_io)?;
        if n < dst.len() {
            // In-range spans must come back whole; a short answer means
            // the server's view of the block is smaller than ours.
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "server delivered {} bytes short of a read on block {} at offset {}",
                    dst.len() - n,
                    self.block_id,
                    pos
                ),
            ));
        }
        log::debug!(
            "block {}: remote direct read of {} bytes at offset {}",
            self.block_id,
            n,
            pos
        );
        self.metrics.add(n as u64);
        Ok(n)
    }

    fn record_bytes_read(&mut self, n: u64) {
        self.metrics.add(n);
    }
}

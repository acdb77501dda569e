use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread;

use blockio_local::{LocalStore, StoreError};
use blockio_stream::BlockId;
use blockio_wire::{MAX_PAYLOAD_LEN, Preamble, Request, Response, WireError};

/// Serves blocks out of a [`LocalStore`] over the block-fetch protocol.
///
/// One OS thread per accepted connection; the per-connection loop is the
/// blocking mirror of the client transport — validate the preamble, then
/// answer requests until the peer hangs up. Per-request problems (missing
/// block, offset past end) are answered as fault frames and the
/// connection keeps serving; only wire-level violations tear it down.
pub struct BlockServer {
    listener: TcpListener,
    store: LocalStore,
}

impl BlockServer {
    /// Bind the listening socket. Serving starts with [`run`](Self::run).
    ///
    /// # Errors
    ///
    /// Any socket-level bind failure.
    pub fn bind(addr: impl ToSocketAddrs, store: LocalStore) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self { listener, store })
    }

    /// Address the server is listening on. Useful with port 0 binds.
    ///
    /// # Errors
    ///
    /// Any socket-level failure resolving the local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept and serve connections until the process ends.
    ///
    /// # Errors
    ///
    /// Only if the listener itself dies; per-connection failures are
    /// logged and absorbed.
    pub fn run(self) -> io::Result<()> {
        log::info!(
            "serving blocks from {} on {}",
            self.store.root().display(),
            self.local_addr()?
        );
        for conn in self.listener.incoming() {
            match conn {
                Ok(sock) => {
                    let store = self.store.clone();
                    thread::spawn(move || {
                        let peer = sock
                            .peer_addr()
                            .map_or_else(|_| "<unknown>".to_string(), |a| a.to_string());
                        log::debug!("connection from {peer}");
                        if let Err(e) = serve_connection(sock, &store) {
                            log::warn!("connection from {peer} failed: {e}");
                        }
                    });
                }
                Err(e) => log::warn!("accept failed: {e}"),
            }
        }
        Ok(())
    }
}

/// Answer requests on one connection until clean EOF.
fn serve_connection(mut sock: TcpStream, store: &LocalStore) -> Result<(), WireError> {
    Preamble::read_from(&mut sock)?;
    while let Some(request) = Request::read_from(&mut sock)? {
        answer(store, request).write_to(&mut sock)?;
    }
    Ok(())
}

/// Build the response for one request. Infallible by construction:
/// anything that goes wrong becomes a fault frame.
fn answer(store: &LocalStore, request: Request) -> Response {
    let result = match request {
        Request::Stat { block_id } => store
            .block_size(BlockId::new(block_id))
            .map(|size| size.to_be_bytes().to_vec()),
        Request::Read {
            block_id,
            offset,
            len,
        } => read_range(store, BlockId::new(block_id), offset, len),
    };
    match result {
        Ok(payload) => Response::Data { payload },
        Err(e) => Response::Fault {
            message: e.to_string(),
        },
    }
}

/// Read a clamped range of a block file.
///
/// `len` is clamped both to the bytes the block actually has past
/// `offset` and to the protocol's per-frame payload limit — the client
/// splits large ranges into multiple requests.
fn read_range(store: &LocalStore, id: BlockId, offset: u64, len: u64) -> Result<Vec<u8>, StoreError> {
    let size = store.block_size(id)?;
    if offset > size {
        return Err(StoreError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("offset {offset} past end of block {id} ({size} bytes)"),
        )));
    }
    let len = len.min(size - offset).min(MAX_PAYLOAD_LEN);
    let mut file = File::open(store.block_path(id))?;
    file.seek(SeekFrom::Start(offset))?;
    let mut payload = vec![0u8; len as usize];
    file.read_exact(&mut payload)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn store_with_block(id: u64, data: &[u8]) -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(format!("{id}.blk")), data).unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn stat_answers_block_length() {
        let (_dir, store) = store_with_block(1, b"0123456789");
        let response = answer(&store, Request::Stat { block_id: 1 });
        assert_eq!(
            response,
            Response::Data {
                payload: 10u64.to_be_bytes().to_vec()
            }
        );
    }

    #[test]
    fn stat_for_missing_block_faults() {
        let (_dir, store) = store_with_block(1, b"x");
        let response = answer(&store, Request::Stat { block_id: 99 });
        assert!(matches!(
            response,
            Response::Fault { message } if message.contains("99")
        ));
    }

    #[test]
    fn read_answers_the_requested_range() {
        let (_dir, store) = store_with_block(1, b"0123456789");
        let response = answer(
            &store,
            Request::Read {
                block_id: 1,
                offset: 3,
                len: 4,
            },
        );
        assert_eq!(
            response,
            Response::Data {
                payload: b"3456".to_vec()
            }
        );
    }

    #[test]
    fn read_clamps_past_the_end_of_the_block() {
        let (_dir, store) = store_with_block(1, b"0123456789");
        let response = answer(
            &store,
            Request::Read {
                block_id: 1,
                offset: 8,
                len: 100,
            },
        );
        assert_eq!(
            response,
            Response::Data {
                payload: b"89".to_vec()
            }
        );
    }

    #[test]
    fn read_with_offset_past_end_faults() {
        let (_dir, store) = store_with_block(1, b"0123");
        let response = answer(
            &store,
            Request::Read {
                block_id: 1,
                offset: 5,
                len: 1,
            },
        );
        assert!(matches!(response, Response::Fault { .. }));
    }

    #[test]
    fn read_at_exact_end_answers_empty() {
        let (_dir, store) = store_with_block(1, b"0123");
        let response = answer(
            &store,
            Request::Read {
                block_id: 1,
                offset: 4,
                len: 8,
            },
        );
        assert_eq!(response, Response::Data { payload: vec![] });
    }
}

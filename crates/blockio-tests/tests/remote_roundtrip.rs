//! End-to-end tests against a live `BlockServer`.
//!
//! Each test binds a server on an ephemeral port, serving a temp-dir
//! store, and drives it through the real client stack — either a
//! `RemoteBlockTransport` behind a `BufferedBlockStream`, or raw wire
//! frames when the test is about protocol behavior itself. The reference
//! answer is always the block file's bytes.

use std::io::Read;
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::thread;

use blockio_local::LocalStore;
use blockio_remote::{BlockServer, RemoteBlockTransport, RemoteError};
use blockio_stream::{BlockId, BufferedBlockStream, BytesReadCounter, StreamConfig};
use blockio_tests::{pattern_bytes, write_block};
use blockio_wire::{Preamble, Request, Response};

/// Bind a server over `dir` on an ephemeral port and run it on a
/// background thread. The thread is detached; it dies with the process.
fn start_server(dir: &Path) -> SocketAddr {
    let store = LocalStore::open(dir).unwrap();
    let server = BlockServer::bind("127.0.0.1:0", store).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run());
    addr
}

fn connect(addr: SocketAddr, id: u64, metrics: &BytesReadCounter) -> RemoteBlockTransport {
    RemoteBlockTransport::connect(addr, BlockId::new(id), metrics.clone()).unwrap()
}

#[test]
fn stat_reports_the_file_length() {
    let dir = tempfile::tempdir().unwrap();
    write_block(dir.path(), 1, &pattern_bytes(12345));
    let addr = start_server(dir.path());

    let mut transport = connect(addr, 1, &BytesReadCounter::new());
    assert_eq!(transport.block_size().unwrap(), 12345);
}

#[test]
fn buffered_drain_matches_the_block_file() {
    let data = pattern_bytes(4096);
    let dir = tempfile::tempdir().unwrap();
    write_block(dir.path(), 1, &data);
    let addr = start_server(dir.path());

    let metrics = BytesReadCounter::new();
    let mut transport = connect(addr, 1, &metrics);
    let size = transport.block_size().unwrap();
    let mut stream = BufferedBlockStream::new(
        BlockId::new(1),
        size,
        transport,
        &StreamConfig::with_buffer_bytes(512),
    );

    let mut out = Vec::new();
    stream.read_to_end(&mut out).unwrap();
    assert_eq!(out, data);
    assert_eq!(metrics.total(), 4096);
}

#[test]
fn bypass_read_matches_the_block_file() {
    let data = pattern_bytes(8000);
    let dir = tempfile::tempdir().unwrap();
    write_block(dir.path(), 2, &data);
    let addr = start_server(dir.path());

    let mut transport = connect(addr, 2, &BytesReadCounter::new());
    let size = transport.block_size().unwrap();
    let mut stream = BufferedBlockStream::new(
        BlockId::new(2),
        size,
        transport,
        &StreamConfig::with_buffer_bytes(64),
    );

    let mut out = vec![0u8; 8000];
    assert_eq!(stream.read_into(&mut out, 0, 8000).unwrap(), 8000);
    assert_eq!(out, data);
}

#[test]
fn seek_and_skip_work_over_the_wire() {
    let data = pattern_bytes(1000);
    let dir = tempfile::tempdir().unwrap();
    write_block(dir.path(), 3, &data);
    let addr = start_server(dir.path());

    let mut transport = connect(addr, 3, &BytesReadCounter::new());
    let size = transport.block_size().unwrap();
    let mut stream = BufferedBlockStream::new(
        BlockId::new(3),
        size,
        transport,
        &StreamConfig::with_buffer_bytes(100),
    );

    stream.seek(950).unwrap();
    assert_eq!(stream.read_byte().unwrap(), Some(data[950]));
    stream.seek(10).unwrap();
    stream.skip(5).unwrap();
    assert_eq!(stream.read_byte().unwrap(), Some(data[15]));
}

#[test]
fn missing_block_surfaces_as_a_server_fault() {
    let dir = tempfile::tempdir().unwrap();
    write_block(dir.path(), 1, b"present");
    let addr = start_server(dir.path());

    let mut transport = connect(addr, 42, &BytesReadCounter::new());
    let err = transport.block_size().unwrap_err();
    assert!(matches!(err, RemoteError::Remote { .. }), "got {err:?}");
}

#[test]
fn connection_survives_a_faulted_request() {
    let data = pattern_bytes(100);
    let dir = tempfile::tempdir().unwrap();
    write_block(dir.path(), 1, &data);
    let addr = start_server(dir.path());

    // Raw wire session: a READ past the end faults, but the same
    // connection must still answer the next request.
    let mut sock = TcpStream::connect(addr).unwrap();
    Preamble::current().write_to(&mut sock).unwrap();

    Request::Read {
        block_id: 1,
        offset: 500,
        len: 10,
    }
    .write_to(&mut sock)
    .unwrap();
    let first = Response::read_from(&mut sock).unwrap();
    assert!(matches!(first, Response::Fault { .. }));

    Request::Stat { block_id: 1 }.write_to(&mut sock).unwrap();
    let second = Response::read_from(&mut sock).unwrap();
    assert_eq!(
        second,
        Response::Data {
            payload: 100u64.to_be_bytes().to_vec()
        }
    );
}

#[test]
fn server_drops_connections_with_a_bad_preamble() {
    let dir = tempfile::tempdir().unwrap();
    write_block(dir.path(), 1, b"x");
    let addr = start_server(dir.path());

    let mut sock = TcpStream::connect(addr).unwrap();
    use std::io::Write;
    sock.write_all(b"GARBAG").unwrap(); // preamble-sized, wrong magic

    // The server abandons the connection without answering, so no frame
    // can ever be read back — only EOF or a reset.
    let result = Response::read_from(&mut sock);
    assert!(result.is_err());
}

#[test]
fn one_connection_serves_many_requests() {
    let data = pattern_bytes(256);
    let dir = tempfile::tempdir().unwrap();
    write_block(dir.path(), 7, &data);
    let addr = start_server(dir.path());

    let mut transport = connect(addr, 7, &BytesReadCounter::new());
    let size = transport.block_size().unwrap();
    let mut stream = BufferedBlockStream::new(
        BlockId::new(7),
        size,
        transport,
        &StreamConfig::with_buffer_bytes(16),
    );

    // 256 single-byte reads = 16 refill round trips on one connection.
    let mut out = Vec::new();
    while let Some(byte) = stream.read_byte().unwrap() {
        out.push(byte);
    }
    assert_eq!(out, data);
    assert!(stream.is_closed());
}

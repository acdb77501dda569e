use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use blockio_stream::{BlockId, BlockTransport, BytesReadCounter};

/// Transport serving one block out of a local file.
///
/// Owns an open handle on the block file for its whole lifetime; positions
/// are absolute block offsets, which for a one-block-per-file layout are
/// file offsets directly.
#[derive(Debug)]
pub struct LocalBlockTransport {
    block_id: BlockId,
    file: File,
    metrics: BytesReadCounter,
}

impl LocalBlockTransport {
    #[must_use]
    pub fn new(block_id: BlockId, file: File, metrics: BytesReadCounter) -> Self {
        Self {
            block_id,
            file,
            metrics,
        }
    }

    #[must_use]
    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    /// Positioned read: seek to `pos`, then read until `dst` is full or
    /// the file ends. Returns how much landed in `dst`.
    fn read_at(&mut self, pos: u64, dst: &mut [u8]) -> io::Result<usize> {
        self.file.seek(SeekFrom::Start(pos))?;
        let mut filled = 0;
        while filled < dst.len() {
            let n = self.file.read(&mut dst[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}

impl BlockTransport for LocalBlockTransport {
    fn fill(&mut self, pos: u64, dst: &mut [u8]) -> io::Result<usize> {
        let n = self.read_at(pos, dst)?;
        log::debug!(
            "block {}: local fill of {} bytes at offset {}",
            self.block_id,
            n,
            pos
        );
        Ok(n)
    }

    fn read_direct(&mut self, pos: u64, dst: &mut [u8]) -> io::Result<usize> {
        let n = self.read_at(pos, dst)?;
        if n < dst.len() {
            // The stream only asks for in-range spans, so a short file
            // means the file and the declared block size disagree.
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "block {} file ended {} bytes short of a read at offset {}",
                    self.block_id,
                    dst.len() - n,
                    pos
                ),
            ));
        }
        log::debug!(
            "block {}: local direct read of {} bytes at offset {}",
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

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn transport_over(data: &[u8]) -> (tempfile::TempDir, LocalBlockTransport, BytesReadCounter) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.blk");
        fs::write(&path, data).unwrap();
        let metrics = BytesReadCounter::new();
        let transport =
            LocalBlockTransport::new(BlockId::new(1), File::open(&path).unwrap(), metrics.clone());
        (dir, transport, metrics)
    }

    #[test]
    fn fill_reads_at_the_requested_offset() {
        let (_dir, mut transport, _) = transport_over(b"0123456789");
        let mut dst = [0u8; 4];
        let n = transport.fill(3, &mut dst).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&dst, b"3456");
    }

    #[test]
    fn fill_short_reads_at_end_of_file() {
        let (_dir, mut transport, _) = transport_over(b"0123456789");
        let mut dst = [0u8; 8];
        let n = transport.fill(7, &mut dst).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&dst[..3], b"789");
    }

    #[test]
    fn direct_read_fills_completely_and_records() {
        let (_dir, mut transport, metrics) = transport_over(b"0123456789");
        let mut dst = [0u8; 6];
        let n = transport.read_direct(2, &mut dst).unwrap();
        assert_eq!(n, 6);
        assert_eq!(&dst, b"234567");
        assert_eq!(metrics.total(), 6);
    }

    #[test]
    fn direct_read_past_file_end_is_an_error() {
        let (_dir, mut transport, metrics) = transport_over(b"0123");
        let mut dst = [0u8; 8];
        let err = transport.read_direct(0, &mut dst).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(metrics.total(), 0);
    }

    #[test]
    fn fill_does_not_record_consumption() {
        let (_dir, mut transport, metrics) = transport_over(b"0123456789");
        let mut dst = [0u8; 4];
        transport.fill(0, &mut dst).unwrap();
        assert_eq!(metrics.total(), 0);
    }
}

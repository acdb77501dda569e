/// Implementation of `blockio cat`.
///
/// Streams one block to stdout through a [`BufferedBlockStream`], so the
/// read path exercised here is exactly the one library consumers get:
/// `--offset` becomes a seek, `--length` a bounded read, and everything
/// else a sequential drain of the stream.
use std::io::{self, Read};

use anyhow::{Context, Result, bail};
use blockio_local::LocalStore;
use blockio_remote::RemoteBlockTransport;
use blockio_stream::{BlockId, BlockTransport, BufferedBlockStream, BytesReadCounter, StreamConfig};

use crate::CatArgs;

/// Run the `blockio cat` command.
///
/// # Errors
///
/// Returns an error if neither or both sources are given, the block
/// cannot be opened, or any read/seek fails mid-transfer.
pub fn run(args: &CatArgs) -> Result<()> {
    let id = BlockId::new(args.block_id);
    let metrics = BytesReadCounter::new();
    let config = StreamConfig::with_buffer_bytes(args.buffer_size);

    let copied = match (&args.store, &args.remote) {
        (Some(dir), None) => {
            let store = LocalStore::open(dir)
                .with_context(|| format!("cannot open store {}", dir.display()))?;
            let stream = store
                .read_stream(id, &config, metrics.clone())
                .with_context(|| format!("cannot open block {id}"))?;
            copy_range(stream, args.offset, args.length)?
        }
        (None, Some(addr)) => {
            let mut transport = RemoteBlockTransport::connect(addr, id, metrics.clone())
                .with_context(|| format!("cannot connect to {addr}"))?;
            let size = transport
                .block_size()
                .with_context(|| format!("cannot stat block {id} on {addr}"))?;
            let stream = BufferedBlockStream::new(id, size, transport, &config);
            copy_range(stream, args.offset, args.length)?
        }
        _ => bail!("exactly one of --store or --remote must be given"),
    };

    log::debug!("block {id}: {copied} bytes written to stdout");
    Ok(())
}

/// Seek to `offset`, then copy `length` bytes (or the rest of the block)
/// to stdout via the stream's `std::io::Read` adapter.
fn copy_range<T: BlockTransport>(
    mut stream: BufferedBlockStream<T>,
    offset: u64,
    length: Option<u64>,
) -> Result<u64> {
    if offset > 0 {
        stream
            .seek(offset)
            .with_context(|| format!("cannot seek to offset {offset}"))?;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let copied = match length {
        Some(len) => io::copy(&mut stream.take(len), &mut out),
        None => io::copy(&mut stream, &mut out),
    }
    .context("copy to stdout failed")?;
    Ok(copied)
}

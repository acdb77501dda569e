/// Implementation of `blockio info`.
///
/// # Output
///
/// ```text
/// $ blockio info --store /data/blocks
/// block 1      4194304 bytes
/// block 2      4194304 bytes
/// block 7       524288 bytes
/// 3 blocks, 8912896 bytes total
///
/// $ blockio info 7 --store /data/blocks --json
/// {
///   "block_id": 7,
///   "size_bytes": 524288,
///   "source": "/data/blocks"
/// }
/// ```
use std::path::Path;

use anyhow::{Context, Result, bail};
use blockio_local::LocalStore;
use blockio_remote::RemoteBlockTransport;
use blockio_stream::{BlockId, BytesReadCounter};
use serde_json::json;

use crate::InfoArgs;

/// Run the `blockio info` command.
///
/// # Errors
///
/// Returns an error if neither or both sources are given, a named block
/// is missing, or `--remote` is used without a block id.
pub fn run(args: &InfoArgs) -> Result<()> {
    match (&args.store, &args.remote) {
        (Some(dir), None) => info_local(dir, args),
        (None, Some(addr)) => info_remote(addr, args),
        _ => bail!("exactly one of --store or --remote must be given"),
    }
}

fn info_local(dir: &Path, args: &InfoArgs) -> Result<()> {
    let store =
        LocalStore::open(dir).with_context(|| format!("cannot open store {}", dir.display()))?;

    if let Some(raw) = args.block_id {
        let id = BlockId::new(raw);
        let size = store.block_size(id)?;
        if args.json {
            print_json(&json!({
                "block_id": raw,
                "size_bytes": size,
                "source": dir.display().to_string(),
            }))?;
        } else {
            println!("block {id}: {size} bytes ({})", store.block_path(id).display());
        }
        return Ok(());
    }

    let ids = store.block_ids()?;
    let mut sizes = Vec::with_capacity(ids.len());
    for id in &ids {
        sizes.push(store.block_size(*id)?);
    }

    if args.json {
        let blocks: Vec<_> = ids
            .iter()
            .zip(&sizes)
            .map(|(id, size)| json!({ "block_id": id.raw(), "size_bytes": size }))
            .collect();
        print_json(&json!({
            "source": dir.display().to_string(),
            "blocks": blocks,
        }))?;
    } else {
        for (id, size) in ids.iter().zip(&sizes) {
            println!("block {:<6} {size:>12} bytes", id.raw());
        }
        let total: u64 = sizes.iter().sum();
        println!("{} blocks, {total} bytes total", ids.len());
    }
    Ok(())
}

fn info_remote(addr: &str, args: &InfoArgs) -> Result<()> {
    let Some(raw) = args.block_id else {
        bail!("--remote needs a block id; servers do not enumerate their blocks");
    };
    let id = BlockId::new(raw);
    let mut transport = RemoteBlockTransport::connect(addr, id, BytesReadCounter::new())
        .with_context(|| format!("cannot connect to {addr}"))?;
    let size = transport
        .block_size()
        .with_context(|| format!("cannot stat block {id} on {addr}"))?;

    if args.json {
        print_json(&json!({
            "block_id": raw,
            "size_bytes": size,
            "source": addr,
        }))?;
    } else {
        println!("block {id}: {size} bytes ({addr})");
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

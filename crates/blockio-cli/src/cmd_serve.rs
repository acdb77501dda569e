/// Implementation of `blockio serve`.
///
/// Binds the block server and runs its accept loop in the foreground
/// until the process is killed. The bound address is printed once at
/// startup (useful with `--listen 127.0.0.1:0`).
use anyhow::{Context, Result};
use blockio_local::LocalStore;
use blockio_remote::BlockServer;

use crate::ServeArgs;

/// Run the `blockio serve` command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the listen address
/// cannot be bound; after that, per-connection failures are logged, not
/// fatal.
pub fn run(args: &ServeArgs) -> Result<()> {
    let store = LocalStore::open(&args.store)
        .with_context(|| format!("cannot open store {}", args.store.display()))?;
    let server = BlockServer::bind(&args.listen, store)
        .with_context(|| format!("cannot bind {}", args.listen))?;
    println!("serving on {}", server.local_addr()?);
    server.run().context("server loop failed")?;
    Ok(())
}

/// blockio command-line tool — read, inspect, and serve blocks from a
/// block store directory, locally or over the network.
///
/// # Command overview
///
/// ```text
/// blockio <COMMAND> [OPTIONS]
///
/// Commands:
///   cat      Stream a block (or a range of it) to stdout
///   info     Print block sizes from a store or a server
///   serve    Serve a store directory to remote readers
///   help     Print help information
/// ```
///
/// Every command takes its blocks from exactly one source: `--store DIR`
/// (a local directory of `<id>.blk` files) or `--remote ADDR` (a running
/// `blockio serve`).
///
/// # Exit codes
///
/// | Code | Meaning                                   |
/// |------|-------------------------------------------|
/// | 0    | Success                                   |
/// | 1    | Error (I/O failure, unknown block, etc.)  |
///
/// Errors go to stderr so stdout stays pipeable (`blockio cat` writes
/// raw block bytes there). Set `RUST_LOG=debug` for transfer logging.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod cmd_cat;
mod cmd_info;
mod cmd_serve;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// Read, inspect, and serve block-store blocks.
#[derive(Parser)]
#[command(name = "blockio", version, about = "Block store read tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream a block (or a range of it) to stdout.
    Cat(CatArgs),
    /// Print block sizes from a store or a server.
    Info(InfoArgs),
    /// Serve a store directory to remote readers.
    Serve(ServeArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `blockio cat`.
#[derive(clap::Args)]
pub struct CatArgs {
    /// Numeric id of the block to read.
    pub block_id: u64,

    /// Read from this local store directory.
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Read from a block server at this address (e.g. `127.0.0.1:9700`).
    #[arg(long, value_name = "ADDR", conflicts_with = "store")]
    pub remote: Option<String>,

    /// Start reading at this byte offset instead of 0.
    #[arg(long, default_value_t = 0)]
    pub offset: u64,

    /// Read at most this many bytes instead of the rest of the block.
    #[arg(long)]
    pub length: Option<u64>,

    /// Internal read buffer capacity in bytes.
    #[arg(long, default_value_t = blockio_stream::DEFAULT_READ_BUFFER_BYTES)]
    pub buffer_size: usize,
}

/// Arguments for `blockio info`.
#[derive(clap::Args)]
pub struct InfoArgs {
    /// Block to describe. Without it, a local store lists every block
    /// it holds (a remote source always needs an id).
    pub block_id: Option<u64>,

    /// Inspect this local store directory.
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Inspect a block server at this address.
    #[arg(long, value_name = "ADDR", conflicts_with = "store")]
    pub remote: Option<String>,

    /// Emit machine-readable JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `blockio serve`.
#[derive(clap::Args)]
pub struct ServeArgs {
    /// Store directory to serve blocks from.
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,

    /// Address to listen on (port 0 picks a free port).
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:9700")]
    pub listen: String,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Cat(args) => cmd_cat::run(&args),
        Commands::Info(args) => cmd_info::run(&args),
        Commands::Serve(args) => cmd_serve::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

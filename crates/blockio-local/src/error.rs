use std::path::PathBuf;

use blockio_stream::BlockId;

/// Errors from opening a local store or one of its blocks.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store root does not exist or is not a directory.
    #[error("store path {path} is not an existing directory")]
    NotADirectory { path: PathBuf },

    /// No block file exists for this id.
    #[error("block {id} not found at {path}")]
    BlockNotFound { id: BlockId, path: PathBuf },

    /// Filesystem failure other than a missing block.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

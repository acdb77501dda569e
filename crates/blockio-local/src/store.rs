use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use blockio_stream::{BlockId, BufferedBlockStream, BytesReadCounter, StreamConfig};

use crate::error::StoreError;
use crate::transport::LocalBlockTransport;

/// File extension of block files inside a store directory.
pub const BLOCK_FILE_EXT: &str = "blk";

/// A directory of immutable block files, one `<id>.blk` file per block.
///
/// Strictly a read surface: blocks are placed into the directory by
/// whatever wrote them (a worker, a loader, a test fixture), and this type
/// only locates, sizes, and opens them. The root is validated once at
/// open, so later failures are per-block, not per-store.
#[derive(Clone, Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotADirectory`] if `root` does not exist or is not a
    /// directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::NotADirectory { path: root });
        }
        log::debug!("store/{}: opened", root.display());
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a block with this id would live at, whether or not it exists.
    #[must_use]
    pub fn block_path(&self, id: BlockId) -> PathBuf {
        self.root.join(format!("{id}.{BLOCK_FILE_EXT}"))
    }

    /// Whether a block file for `id` exists.
    #[must_use]
    pub fn contains(&self, id: BlockId) -> bool {
        self.block_path(id).is_file()
    }

    /// Length of block `id` in bytes, from file metadata.
    ///
    /// # Errors
    ///
    /// [`StoreError::BlockNotFound`] if there is no such block file,
    /// [`StoreError::Io`] for any other filesystem failure.
    pub fn block_size(&self, id: BlockId) -> Result<u64, StoreError> {
        let path = self.block_path(id);
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::BlockNotFound { id, path })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Ids of every block file in the store, ascending.
    ///
    /// Files that do not parse as `<u64>.blk` are ignored — a store
    /// directory may carry unrelated files (lockfiles, editor droppings).
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] if the directory cannot be read.
    pub fn block_ids(&self) -> Result<Vec<BlockId>, StoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(BLOCK_FILE_EXT) {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                ids.push(BlockId::new(id));
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Open a transport over block `id`.
    ///
    /// Bytes delivered to consumers through the transport are accounted to
    /// `metrics`.
    ///
    /// # Errors
    ///
    /// [`StoreError::BlockNotFound`] if there is no such block file,
    /// [`StoreError::Io`] for any other open failure.
    pub fn open_block(
        &self,
        id: BlockId,
        metrics: BytesReadCounter,
    ) -> Result<LocalBlockTransport, StoreError> {
        let path = self.block_path(id);
        match fs::File::open(&path) {
            Ok(file) => Ok(LocalBlockTransport::new(id, file, metrics)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::BlockNotFound { id, path })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Open a buffered read stream over block `id`, sized by `config`.
    ///
    /// The block length is taken from file metadata at open; block files
    /// are immutable, so it stays authoritative for the stream's lifetime.
    ///
    /// # Errors
    ///
    /// Same as [`open_block`](Self::open_block).
    pub fn read_stream(
        &self,
        id: BlockId,
        config: &StreamConfig,
        metrics: BytesReadCounter,
    ) -> Result<BufferedBlockStream<LocalBlockTransport>, StoreError> {
        let size = self.block_size(id)?;
        let transport = self.open_block(id, metrics)?;
        Ok(BufferedBlockStream::new(id, size, transport, config))
    }
}

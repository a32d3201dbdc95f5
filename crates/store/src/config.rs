//! Store configuration

use std::path::PathBuf;

/// Configuration for a [`Store`](crate::Store)
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Directory for storage data
    pub data_dir: PathBuf,

    /// Block cache size for Fjall (in bytes)
    pub block_cache_size: u64,

    /// Compression type for bucket data
    pub compression: fjall::CompressionType,

    /// Durability of every write transaction's journal entry
    ///
    /// The journal is synced in this mode before the transaction's writes are
    /// applied. `None` leaves flushing to Fjall's own journal policy.
    pub persist_mode: Option<fjall::PersistMode>,
}

impl StoreConfig {
    /// Create a new config with the given data directory
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            block_cache_size: 64 * 1024 * 1024, // 64 MB
            compression: fjall::CompressionType::Lz4,
            persist_mode: Some(fjall::PersistMode::SyncAll),
        }
    }

    /// Set block cache size
    pub fn with_block_cache_size(mut self, size: u64) -> Self {
        self.block_cache_size = size;
        self
    }

    /// Set compression type
    pub fn with_compression(mut self, compression: fjall::CompressionType) -> Self {
        self.compression = compression;
        self
    }

    /// Set persist mode (`None` disables the per-commit flush)
    pub fn with_persist_mode(mut self, mode: Option<fjall::PersistMode>) -> Self {
        self.persist_mode = mode;
        self
    }
}

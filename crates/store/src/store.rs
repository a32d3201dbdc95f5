//! Keyspace handle and writer serialization

use crate::bucket::{self, Bucket};
use crate::config::StoreConfig;
use crate::encoding::Decode;
use crate::error::Result;
use crate::txn::WriteTxn;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use parking_lot::Mutex;
use tracing::{debug, info};

#[cfg(feature = "failpoints")]
use std::sync::atomic::{AtomicUsize, Ordering};

/// Partition holding the persisted sequence counters, keyed by name
const SEQUENCES_PARTITION: &str = "_sequences";

/// Embedded bucket store with single-writer transactions
pub struct Store {
    keyspace: Keyspace,
    sequences: PartitionHandle,

    /// Held by every live [`WriteTxn`]
    writer: Mutex<()>,

    config: StoreConfig,

    #[cfg(feature = "failpoints")]
    failing_commits: AtomicUsize,
}

impl Store {
    /// Open (or create) a store in `config.data_dir`
    ///
    /// Buckets and sequence counters written by a previous process are picked
    /// up as they were left by the last successful commit.
    pub fn open(config: StoreConfig) -> Result<Self> {
        // Ensure directory exists
        std::fs::create_dir_all(&config.data_dir)?;

        let keyspace = fjall::Config::new(&config.data_dir)
            .cache_size(config.block_cache_size)
            .open()?;

        let sequences = keyspace.open_partition(
            SEQUENCES_PARTITION,
            PartitionCreateOptions::default()
                .block_size(16 * 1024)
                .compression(fjall::CompressionType::None),
        )?;

        info!(
            data_dir = %config.data_dir.display(),
            partitions = keyspace.partition_count(),
            "store opened"
        );

        Ok(Self {
            keyspace,
            sequences,
            writer: Mutex::new(()),
            config,
            #[cfg(feature = "failpoints")]
            failing_commits: AtomicUsize::new(0),
        })
    }

    /// Open (or create) the bucket called `name`
    pub fn bucket(&self, name: &str) -> Result<Bucket> {
        bucket::validate_name(name)?;

        let partition = self
            .keyspace
            .open_partition(name, bucket::partition_options(self.config.compression))?;

        debug!(bucket = name, "bucket opened");
        Ok(Bucket::new(name.to_string(), partition))
    }

    /// Begin a write transaction, waiting for any other writer to finish
    pub fn begin(&self) -> WriteTxn<'_> {
        WriteTxn::new(self, self.writer.lock())
    }

    /// Last committed value of the sequence called `name` (0 if never used)
    pub fn sequence(&self, name: &str) -> Result<u64> {
        match self.sequences.get(name)? {
            Some(bytes) => u64::decode(&bytes),
            None => Ok(0),
        }
    }

    /// Flush and fsync the journal
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }

    /// Configuration this store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Make the next `count` commits fail before anything is written
    #[cfg(feature = "failpoints")]
    pub fn fail_next_commits(&self, count: usize) {
        self.failing_commits.store(count, Ordering::SeqCst);
    }

    #[cfg(feature = "failpoints")]
    pub(crate) fn take_failpoint(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    pub(crate) fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    pub(crate) fn sequences(&self) -> &PartitionHandle {
        &self.sequences
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // Ensure data is persisted on drop
        let _ = self.keyspace.persist(fjall::PersistMode::SyncAll);
    }
}

//! Single-writer write transactions
//!
//! A [`WriteTxn`] stages inserts, removes and sequence increments in a Fjall
//! batch while holding the store's writer lock. Nothing becomes visible until
//! [`WriteTxn::commit`] succeeds; dropping the transaction discards every
//! staged write, sequence increments included.
//!
//! The configured persist mode is attached to the batch, so the journal is
//! synced before any write is applied. A failed sync fails the commit with
//! nothing visible.

use crate::bucket::Bucket;
use crate::encoding::Encode;
use crate::error::{Error, Result};
use crate::store::Store;
use fjall::Batch;
use parking_lot::MutexGuard;
use std::collections::HashMap;
use tracing::debug;

/// Longest key Fjall accepts
pub const MAX_KEY_LEN: usize = u16::MAX as usize;

/// Largest value Fjall accepts
pub const MAX_VALUE_LEN: usize = u32::MAX as usize;

fn check_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey("key cannot be empty".into()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(Error::InvalidKey(format!(
            "key of {} bytes exceeds {MAX_KEY_LEN} bytes",
            key.len()
        )));
    }
    Ok(())
}

/// Write transaction holding the store's writer lock
pub struct WriteTxn<'a> {
    store: &'a Store,
    batch: Batch,

    /// Staged values by (bucket, key); `None` marks a removal
    staged: HashMap<(String, Vec<u8>), Option<Vec<u8>>>,

    /// Sequence values handed out by this transaction
    sequences: HashMap<String, u64>,

    _writer: MutexGuard<'a, ()>,
}

impl<'a> WriteTxn<'a> {
    pub(crate) fn new(store: &'a Store, writer: MutexGuard<'a, ()>) -> Self {
        Self {
            store,
            batch: store
                .keyspace()
                .batch()
                .durability(store.config().persist_mode),
            staged: HashMap::new(),
            sequences: HashMap::new(),
            _writer: writer,
        }
    }

    /// Read `key` from `bucket`, seeing this transaction's own staged writes
    pub fn get(&self, bucket: &Bucket, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.staged.get(&(bucket.name().to_string(), key.to_vec())) {
            Some(staged) => Ok(staged.clone()),
            None => bucket.get(key),
        }
    }

    /// Stage `value` at `key` in `bucket`
    ///
    /// Keys must be 1 to [`MAX_KEY_LEN`] bytes and values at most
    /// [`MAX_VALUE_LEN`] bytes. Rejected writes leave the transaction as it was.
    pub fn insert(&mut self, bucket: &Bucket, key: &[u8], value: &[u8]) -> Result<()> {
        check_key(key)?;
        if value.len() > MAX_VALUE_LEN {
            return Err(Error::ValueTooLarge(value.len()));
        }

        self.batch.insert(bucket.partition(), key, value);
        self.staged
            .insert((bucket.name().to_string(), key.to_vec()), Some(value.to_vec()));
        Ok(())
    }

    /// Stage removal of `key` from `bucket`
    pub fn remove(&mut self, bucket: &Bucket, key: &[u8]) -> Result<()> {
        check_key(key)?;

        self.batch.remove(bucket.partition(), key);
        self.staged
            .insert((bucket.name().to_string(), key.to_vec()), None);
        Ok(())
    }

    /// Increment the sequence called `name` and return the new value
    ///
    /// The first value of a sequence is 1. The increment is persisted with the
    /// rest of the transaction, so a rolled back transaction hands the same
    /// value out again.
    pub fn next_sequence(&mut self, name: &str) -> Result<u64> {
        let current = match self.sequences.get(name) {
            Some(value) => *value,
            None => self.store.sequence(name)?,
        };

        let next = current
            .checked_add(1)
            .ok_or_else(|| Error::Encoding(format!("sequence {name} exhausted")))?;

        self.sequences.insert(name.to_string(), next);
        Ok(next)
    }

    /// Atomically apply every staged write
    ///
    /// The writer lock is released only after the commit (journal sync
    /// included) has finished.
    pub fn commit(mut self) -> Result<()> {
        #[cfg(feature = "failpoints")]
        if self.store.take_failpoint() {
            return Err(Error::Injected("commit"));
        }

        for (name, value) in &self.sequences {
            self.batch
                .insert(self.store.sequences(), name.as_str(), value.encode()?);
        }

        let writes = self.staged.len();
        self.batch.commit()?;

        debug!(writes, sequences = self.sequences.len(), "transaction committed");
        Ok(())
    }
}

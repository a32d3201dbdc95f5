//! Named buckets backed by Fjall partitions
//!
//! A bucket is a key-ordered map of raw bytes. Reads through a [`Bucket`]
//! observe committed state only; writes go through a
//! [`WriteTxn`](crate::WriteTxn).

use crate::error::{Error, Result};
use fjall::{PartitionCreateOptions, PartitionHandle};

/// Longest bucket name Fjall accepts (the length is stored in one byte)
pub const MAX_BUCKET_NAME_LEN: usize = u8::MAX as usize;

/// Check a bucket name against Fjall's partition naming rules
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_BUCKET_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '#' | '$'));

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidBucketName(name.to_string()))
    }
}

/// Partition options used for every bucket
pub(crate) fn partition_options(compression: fjall::CompressionType) -> PartitionCreateOptions {
    PartitionCreateOptions::default()
        .block_size(32 * 1024)
        .compression(compression)
}

/// Handle to a named bucket
#[derive(Clone)]
pub struct Bucket {
    name: String,
    partition: PartitionHandle,
}

impl Bucket {
    pub(crate) fn new(name: String, partition: PartitionHandle) -> Self {
        Self { name, partition }
    }

    /// Bucket name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the committed value stored at `key`
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.partition.get(key)?.map(|value| value.to_vec()))
    }

    /// Up to `limit` entries with the lowest keys, in key order
    pub fn first(&self, limit: usize) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut entries = Vec::with_capacity(limit.min(64));
        for result in self.partition.iter().take(limit) {
            let (key, value) = result?;
            entries.push((key.to_vec(), value.to_vec()));
        }
        Ok(entries)
    }

    /// All entries in key order
    pub fn entries(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.first(usize::MAX)
    }

    /// Number of committed entries
    ///
    /// This walks the whole partition.
    pub fn len(&self) -> Result<usize> {
        Ok(self.partition.len()?)
    }

    /// Check if the bucket has no committed entries
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.partition.is_empty()?)
    }

    pub(crate) fn partition(&self) -> &PartitionHandle {
        &self.partition
    }
}

impl std::fmt::Debug for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("jobs_ready").is_ok());
        assert!(validate_name("a-b#c$d").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("has space").is_err());
        assert!(validate_name("slash/name").is_err());
        assert!(validate_name(&"x".repeat(MAX_BUCKET_NAME_LEN)).is_ok());
        assert!(validate_name(&"x".repeat(MAX_BUCKET_NAME_LEN + 1)).is_err());
    }
}

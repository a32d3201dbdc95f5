//! ID generation
//!
//! By default a queue draws IDs from a counter persisted in the store and
//! incremented inside the same write transaction as the `send` that consumes
//! it, so an aborted send gives its ID back. A custom [`Sequencer`] replaces
//! that counter.

use crate::error::{BoxError, Error, Result};
use crate::id::Id;
use proven_store::{MAX_KEY_LEN, WriteTxn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of message IDs
///
/// Implementations must uphold the following, which the queue relies on but
/// does not check:
///
/// * `next_sequence` is safe to call from many threads at once.
/// * It never returns the same ID twice.
/// * Successive IDs increase in big-endian byte order.
///
/// IDs are also store keys, so they must be 1 to
/// [`MAX_KEY_LEN`](proven_store::MAX_KEY_LEN) bytes long. Other lengths fail
/// the send with [`Error::Sequencer`].
///
/// A queue may draw IDs it never uses, for example when a send's transaction
/// fails after the ID was generated.
pub trait Sequencer: Send + Sync {
    fn next_sequence(&self) -> std::result::Result<Id, BoxError>;
}

/// In-memory sequencer backed by an atomic counter
///
/// The counter is not persisted. After a restart, start it above the highest
/// ID already in the queue.
#[derive(Debug)]
pub struct AtomicSequencer {
    next: AtomicU64,
}

impl AtomicSequencer {
    /// Sequencer whose first ID is 1
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Sequencer whose first ID is `first`
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for AtomicSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer for AtomicSequencer {
    fn next_sequence(&self) -> std::result::Result<Id, BoxError> {
        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_add(1))
            .map(Id::from)
            .map_err(|_| "atomic sequencer exhausted".into())
    }
}

/// Where a queue gets its IDs from
pub(crate) enum IdSource {
    /// Persisted counter named after the queue
    Store { sequence: String },
    Custom(Arc<dyn Sequencer>),
}

impl IdSource {
    pub(crate) fn next_id(&self, txn: &mut WriteTxn<'_>) -> Result<Id> {
        match self {
            IdSource::Store { sequence } => Ok(Id::from(txn.next_sequence(sequence)?)),
            IdSource::Custom(sequencer) => {
                let id = sequencer.next_sequence().map_err(Error::Sequencer)?;
                check_len(&id)?;
                Ok(id)
            }
        }
    }
}

fn check_len(id: &Id) -> Result<()> {
    let len = id.as_bytes().len();
    if len == 0 || len > MAX_KEY_LEN {
        return Err(Error::Sequencer(
            format!("sequencer returned a {len} byte ID (allowed: 1 to {MAX_KEY_LEN})").into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_sequencer_increments() {
        let sequencer = AtomicSequencer::starting_at(41);
        assert_eq!(sequencer.next_sequence().unwrap().to_u64(), Some(41));
        assert_eq!(sequencer.next_sequence().unwrap().to_u64(), Some(42));
    }

    #[test]
    fn test_ids_must_fit_store_keys() {
        assert!(matches!(check_len(&Id::new(vec![])), Err(Error::Sequencer(_))));
        assert!(matches!(
            check_len(&Id::new(vec![7; MAX_KEY_LEN + 1])),
            Err(Error::Sequencer(_))
        ));
        assert!(check_len(&Id::new(vec![7; MAX_KEY_LEN])).is_ok());
        assert!(check_len(&Id::from(1)).is_ok());
    }

    #[test]
    fn test_atomic_sequencer_exhaustion_is_an_error() {
        let sequencer = AtomicSequencer::starting_at(u64::MAX);
        assert!(sequencer.next_sequence().is_err());
    }

    #[test]
    fn test_atomic_sequencer_is_unique_across_threads() {
        let sequencer = AtomicSequencer::new();
        let mut ids: Vec<Id> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        (0..250)
                            .map(|_| sequencer.next_sequence().unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect()
        });

        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 1000);
    }
}

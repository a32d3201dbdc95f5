//! Error types for the queue

use crate::id::Id;
use crate::status::Status;
use thiserror::Error;

/// Boxed error returned by custom [`Sequencer`](crate::Sequencer)s
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, Error>;

/// Queue error types
#[derive(Error, Debug)]
pub enum Error {
    /// `ack` or `nack` was already called on this message
    #[error("Ack or Nack already called")]
    AlreadyResolved,

    /// The queue was closed
    #[error("Queue is closed")]
    Closed,

    /// Non-blocking receive found nothing to deliver
    #[error("Queue is empty")]
    Empty,

    /// Invalid options, rejected before any storage is touched
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Store or transaction failure, passed through untouched
    #[error("Storage error: {0}")]
    Storage(#[from] proven_store::Error),

    /// The configured sequencer failed to produce an ID
    #[error("Sequencer error: {0}")]
    Sequencer(#[source] BoxError),

    /// Blocking receive was cancelled through its token
    #[error("Receive cancelled")]
    Cancelled,

    /// Blocking receive hit its deadline
    #[error("Receive deadline exceeded")]
    DeadlineExceeded,

    /// The entry a nack needs to move is not where it should be
    #[error("No {status} entry for message {id}")]
    MissingEntry { status: Status, id: Id },
}

impl Error {
    /// Whether this is the normal "nothing to receive" signal
    pub fn is_empty(&self) -> bool {
        matches!(self, Error::Empty)
    }
}

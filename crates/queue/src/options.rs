//! Queue construction options

use crate::error::{Error, Result};
use crate::sequencer::Sequencer;
use crate::status::Status;
use proven_store::MAX_BUCKET_NAME_LEN;
use std::fmt;
use std::sync::Arc;

/// Longest queue name accepted
///
/// Bucket names are `{queue}_{status}`, and `_returned` is the longest suffix.
pub const MAX_QUEUE_NAME_LEN: usize =
    MAX_BUCKET_NAME_LEN - Status::Returned.as_str().len() - 1;

/// Options passed to [`Queue::open`](crate::Queue::open)
#[derive(Clone, Default)]
pub struct Options {
    pub(crate) sequencer: Option<Arc<dyn Sequencer>>,
    pub(crate) dead_letters: bool,
    pub(crate) message_buffer_size: i64,
    pub(crate) recover_unacked: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `sequencer` instead of the store-backed counter
    pub fn with_sequencer(mut self, sequencer: Arc<dyn Sequencer>) -> Self {
        self.sequencer = Some(sequencer);
        self
    }

    /// Keep messages nacked without retry in the returned bucket instead of
    /// discarding them
    pub fn with_dead_letters(mut self) -> Self {
        self.dead_letters = true;
        self
    }

    /// Stage up to `size` messages per receive transaction (0 disables)
    ///
    /// Staged messages move to unacked before any receive hands them out, and
    /// stay in memory until then, so large messages call for a small buffer.
    /// Negative sizes are rejected when the queue is opened.
    pub fn with_message_buffer_size(mut self, size: i64) -> Self {
        self.message_buffer_size = size;
        self
    }

    /// Move every unacked message back to ready when the queue is opened
    ///
    /// Messages left unacked by a previous process are otherwise never
    /// redelivered.
    pub fn with_unacked_recovery(mut self) -> Self {
        self.recover_unacked = true;
        self
    }

    /// Validate the options, returning the staging buffer capacity
    pub(crate) fn validate(&self) -> Result<usize> {
        usize::try_from(self.message_buffer_size).map_err(|_| {
            Error::Config(format!(
                "invalid message buffer size: {}",
                self.message_buffer_size
            ))
        })
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("custom_sequencer", &self.sequencer.is_some())
            .field("dead_letters", &self.dead_letters)
            .field("message_buffer_size", &self.message_buffer_size)
            .field("recover_unacked", &self.recover_unacked)
            .finish()
    }
}

/// Check a queue name before any bucket is opened for it
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Config("queue name cannot be empty".into()));
    }
    if name.len() > MAX_QUEUE_NAME_LEN {
        return Err(Error::Config(format!(
            "queue name exceeds {MAX_QUEUE_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::Config(format!(
            "queue name {name:?} contains invalid characters (allowed: a-z, A-Z, 0-9, -, _)"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_validation() {
        assert_eq!(Options::new().validate().unwrap(), 0);
        assert_eq!(
            Options::new().with_message_buffer_size(16).validate().unwrap(),
            16
        );
        assert!(matches!(
            Options::new().with_message_buffer_size(-1).validate(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_name("jobs").is_ok());
        assert!(validate_name("jobs-v2_eu").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("jobs/eu").is_err());
        assert_eq!(MAX_QUEUE_NAME_LEN, 246);
        assert!(validate_name(&"q".repeat(MAX_QUEUE_NAME_LEN)).is_ok());
        assert!(validate_name(&"q".repeat(MAX_QUEUE_NAME_LEN + 1)).is_err());
    }
}

//! Delivered messages and the once-only ack/nack protocol

use crate::error::{Error, Result};
use crate::id::Id;
use crate::queue::Inner;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::warn;

/// A message handed out by [`Queue::send`](crate::Queue::send) or one of the
/// receive methods
///
/// Each message can be resolved exactly once, by either [`Message::ack`] or
/// [`Message::nack`]. The once-guard is claimed once the store transaction has
/// started and before it commits: if the commit fails, the error is returned
/// and every later attempt reports [`Error::AlreadyResolved`], while the entry
/// stays unacked in storage. Attempts refused with [`Error::Closed`] leave the
/// guard untouched.
pub struct Message {
    id: Id,
    body: Vec<u8>,

    /// Routes ack/nack back to the queue; does not keep it alive
    queue: Weak<Inner>,

    resolved: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl Message {
    pub(crate) fn new(id: Id, body: Vec<u8>, queue: Weak<Inner>) -> Self {
        Self {
            id,
            body,
            queue,
            resolved: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Whether `ack` or `nack` has been called
    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::SeqCst)
    }

    /// Error returned by the store when resolving this message, if any
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// Acknowledge successful processing, removing the message for good
    pub fn ack(&self) -> Result<()> {
        self.queue()?.ack(self)
    }

    /// Reject the message
    ///
    /// With `retry` the message goes back to ready under its original ID, so it
    /// is delivered again ahead of anything sent after it. Without `retry` it
    /// moves to the returned bucket when dead letters are enabled and is
    /// discarded otherwise.
    pub fn nack(&self, retry: bool) -> Result<()> {
        self.queue()?.nack(self, retry)
    }

    fn queue(&self) -> Result<Arc<Inner>> {
        let queue = self.queue.upgrade().ok_or(Error::Closed)?;
        queue.ensure_open()?;
        // Skip the writer lock when the outcome is already known
        if self.is_resolved() {
            return Err(Error::AlreadyResolved);
        }
        Ok(queue)
    }

    /// Claim the once-guard
    pub(crate) fn claim(&self) -> Result<()> {
        self.resolved
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| Error::AlreadyResolved)
    }

    /// Keep the error of a claimed attempt that failed
    pub(crate) fn record(&self, result: Result<()>) -> Result<()> {
        if let Err(e) = &result {
            warn!(id = %self.id, error = %e, "failed to resolve message");
            *self.last_error.lock() = Some(e.to_string());
        }
        result
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id)
            .field("body_len", &self.body.len())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

//! Fixed-capacity staging buffer for received messages
//!
//! When the queue is configured with a message buffer, a single store
//! transaction moves up to `capacity` messages from ready to unacked and parks
//! them here. Following receives pop from the buffer without touching the
//! store. Staged messages are already unacked in storage even though no caller
//! has seen them yet.

use std::collections::VecDeque;

/// Bounded FIFO of staged items
#[derive(Debug)]
pub(crate) struct StagingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> StagingBuffer<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append at the tail
    ///
    /// # Panics
    ///
    /// Panics if the buffer is full. The queue never stages more than the
    /// capacity, so this indicates a bug in the queue, not bad input.
    pub(crate) fn push(&mut self, item: T) {
        assert!(
            self.items.len() < self.capacity,
            "push to full staging buffer (capacity {})",
            self.capacity
        );
        self.items.push_back(item);
    }

    /// Remove and return the oldest staged item
    pub(crate) fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every staged item, returning how many there were
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.items.len();
        self.items.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_returns_push_order() {
        let mut buffer = StagingBuffer::new(3);
        buffer.push(1);
        buffer.push(2);
        buffer.push(3);
        assert_eq!(buffer.len(), 3);

        assert_eq!(buffer.pop(), Some(1));
        buffer.push(4);
        assert_eq!(buffer.pop(), Some(2));
        assert_eq!(buffer.pop(), Some(3));
        assert_eq!(buffer.pop(), Some(4));
        assert_eq!(buffer.pop(), None);
        assert!(buffer.is_empty());
    }

    #[test]
    #[should_panic(expected = "push to full staging buffer")]
    fn test_push_beyond_capacity_panics() {
        let mut buffer = StagingBuffer::new(1);
        buffer.push("a");
        buffer.push("b");
    }

    #[test]
    fn test_clear_reports_dropped() {
        let mut buffer = StagingBuffer::new(4);
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.clear(), 2);
        assert!(buffer.is_empty());
    }
}

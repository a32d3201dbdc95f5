//! Wakeups for blocking receives

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Wakeup signal shared by a queue and its cancel tokens
///
/// Every event that might let a blocked receive make progress (send, nack
/// with retry, close, cancellation) bumps the epoch. A receiver records the
/// epoch before checking for messages and only parks while it is unchanged,
/// so an event that lands between the check and the wait is never lost.
#[derive(Debug, Default)]
pub(crate) struct Signal {
    epoch: Mutex<u64>,
    cond: Condvar,
}

impl Signal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn epoch(&self) -> u64 {
        *self.epoch.lock()
    }

    pub(crate) fn notify(&self) {
        let mut epoch = self.epoch.lock();
        *epoch = epoch.wrapping_add(1);
        self.cond.notify_all();
    }

    /// Park until the epoch moves past `seen`
    ///
    /// Returns `false` if `deadline` passed first.
    pub(crate) fn wait(&self, seen: u64, deadline: Option<Instant>) -> bool {
        let mut epoch = self.epoch.lock();
        while *epoch == seen {
            match deadline {
                Some(deadline) => {
                    if self.cond.wait_until(&mut epoch, deadline).timed_out() {
                        return *epoch != seen;
                    }
                }
                None => self.cond.wait(&mut epoch),
            }
        }
        true
    }
}

/// Cancels blocking receives on the queue that issued it
///
/// Obtained from [`Queue::cancel_token`](crate::Queue::cancel_token). Once
/// cancelled, every receive using the token (or a clone of it) returns
/// [`Error::Cancelled`](crate::Error::Cancelled) without touching storage.
#[derive(Clone, Debug)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    signal: Arc<Signal>,
}

impl CancelToken {
    pub(crate) fn new(signal: Arc<Signal>) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            signal,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.signal.notify();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn wakes(&self, signal: &Arc<Signal>) -> bool {
        Arc::ptr_eq(&self.signal, signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_wait_returns_after_notify() {
        let signal = Arc::new(Signal::new());
        let seen = signal.epoch();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                std::thread::sleep(Duration::from_millis(20));
                signal.notify();
            });
            assert!(signal.wait(seen, None));
        });
    }

    #[test]
    fn test_wait_does_not_miss_earlier_notify() {
        let signal = Signal::new();
        let seen = signal.epoch();
        signal.notify();
        assert!(signal.wait(seen, Some(Instant::now())));
    }

    #[test]
    fn test_wait_times_out() {
        let signal = Signal::new();
        let seen = signal.epoch();
        let deadline = Instant::now() + Duration::from_millis(20);
        assert!(!signal.wait(seen, Some(deadline)));
        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn test_cancel_bumps_epoch() {
        let signal = Arc::new(Signal::new());
        let token = CancelToken::new(signal.clone());
        let seen = signal.epoch();

        assert!(!token.is_cancelled());
        token.clone().cancel();
        assert!(token.is_cancelled());
        assert_ne!(signal.epoch(), seen);
        assert!(token.wakes(&signal));
        assert!(!token.wakes(&Arc::new(Signal::new())));
    }
}

//! Queue engine
//!
//! Every state change is a single store write transaction:
//! - `send`: next ID + insert into ready
//! - receive: move the lowest ready keys to unacked (one key, or a whole
//!   staging batch when the message buffer is enabled)
//! - `ack`: delete from unacked
//! - `nack`: delete from unacked, then reinsert into ready (retry) or returned
//!   (dead letters) under the same key
//!
//! The store admits one writer at a time, so these never interleave and a
//! failed transaction leaves every bucket as it was.

use crate::buffer::StagingBuffer;
use crate::error::{Error, Result};
use crate::id::Id;
use crate::message::Message;
use crate::options::{self, Options};
use crate::sequencer::IdSource;
use crate::signal::{CancelToken, Signal};
use crate::status::Status;
use parking_lot::Mutex;
use proven_store::{Bucket, Store, WriteTxn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Durable FIFO queue with at-least-once delivery
///
/// Cloning is cheap and every clone refers to the same queue.
#[derive(Clone)]
pub struct Queue {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    name: String,
    store: Arc<Store>,

    ready: Bucket,
    unacked: Bucket,
    /// Present only with dead letters enabled
    returned: Option<Bucket>,

    ids: IdSource,

    /// Staging buffer capacity; 0 disables staging
    capacity: usize,
    buffer: Mutex<StagingBuffer<Message>>,

    signal: Arc<Signal>,
    closed: AtomicBool,
}

impl Queue {
    /// Open the queue called `name` in `store`
    ///
    /// Buckets left by a previous process are reused, so ready, unacked and
    /// returned messages (and the default ID counter) carry over. Options are
    /// validated before the store is touched.
    pub fn open(store: Arc<Store>, name: &str, options: Options) -> Result<Self> {
        let capacity = options.validate()?;
        options::validate_name(name)?;

        let ready = store.bucket(&Status::Ready.bucket_name(name))?;
        let unacked = store.bucket(&Status::Unacked.bucket_name(name))?;
        let returned = if options.dead_letters {
            Some(store.bucket(&Status::Returned.bucket_name(name))?)
        } else {
            None
        };

        let ids = match options.sequencer {
            Some(sequencer) => IdSource::Custom(sequencer),
            None => IdSource::Store {
                sequence: name.to_string(),
            },
        };

        let inner = Arc::new(Inner {
            name: name.to_string(),
            store,
            ready,
            unacked,
            returned,
            ids,
            capacity,
            buffer: Mutex::new(StagingBuffer::new(capacity)),
            signal: Arc::new(Signal::new()),
            closed: AtomicBool::new(false),
        });

        if options.recover_unacked {
            let recovered = inner.recover_unacked()?;
            if recovered > 0 {
                info!(queue = name, recovered, "moved unacked messages back to ready");
            }
        }

        info!(
            queue = name,
            buffer = capacity,
            dead_letters = options.dead_letters,
            "queue opened"
        );

        Ok(Self { inner })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Durably enqueue `body`
    pub fn send(&self, body: impl Into<Vec<u8>>) -> Result<Message> {
        self.inner.send(body.into())
    }

    /// Receive the next message without waiting
    ///
    /// Returns [`Error::Empty`] when nothing is ready.
    pub fn try_receive(&self) -> Result<Message> {
        self.inner.try_receive()
    }

    /// Receive the next message, waiting for one to be sent or retried
    ///
    /// Returns [`Error::Cancelled`] once `cancel` is cancelled and
    /// [`Error::Closed`] if the queue is closed while waiting.
    pub fn receive(&self, cancel: &CancelToken) -> Result<Message> {
        self.inner.receive(cancel, None)
    }

    /// Like [`Queue::receive`], giving up with [`Error::DeadlineExceeded`] at
    /// `deadline`
    pub fn receive_deadline(&self, cancel: &CancelToken, deadline: Instant) -> Result<Message> {
        self.inner.receive(cancel, Some(deadline))
    }

    /// New token for cancelling blocking receives on this queue
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken::new(self.inner.signal.clone())
    }

    /// Number of stored entries in `status`
    ///
    /// Always 0 for [`Status::Returned`] unless dead letters are enabled.
    pub fn len(&self, status: Status) -> Result<usize> {
        self.inner.ensure_open()?;
        match self.inner.bucket(status) {
            Some(bucket) => Ok(bucket.len()?),
            None => Ok(0),
        }
    }

    /// Body stored under `id` in `status`, if any
    pub fn get(&self, status: Status, id: &Id) -> Result<Option<Vec<u8>>> {
        self.inner.ensure_open()?;
        match self.inner.bucket(status) {
            Some(bucket) => Ok(bucket.get(id.as_bytes())?),
            None => Ok(None),
        }
    }

    /// Every dead-lettered message in ID order
    pub fn dead_letters(&self) -> Result<Vec<(Id, Vec<u8>)>> {
        self.inner.ensure_open()?;
        match &self.inner.returned {
            Some(bucket) => Ok(bucket
                .entries()?
                .into_iter()
                .map(|(key, body)| (Id::from(key), body))
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    /// Messages staged in memory and not yet handed out
    pub fn buffered(&self) -> usize {
        self.inner.buffer.lock().len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Close the queue
    ///
    /// Every later operation on the queue, its clones and its messages returns
    /// [`Error::Closed`], and blocked receivers wake up with that error.
    /// Messages still staged in the buffer stay unacked in storage.
    pub fn close(&self) -> Result<()> {
        self.inner.close()
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.inner.name)
            .field("closed", &self.inner.is_closed())
            .finish()
    }
}

impl Inner {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }

    fn bucket(&self, status: Status) -> Option<&Bucket> {
        match status {
            Status::Ready => Some(&self.ready),
            Status::Unacked => Some(&self.unacked),
            Status::Returned => self.returned.as_ref(),
        }
    }

    /// Start a write transaction, failing if the queue was closed
    ///
    /// Close flips the flag while holding the writer lock, so no transaction
    /// started here can run after a close.
    fn begin(&self) -> Result<WriteTxn<'_>> {
        let txn = self.store.begin();
        self.ensure_open()?;
        Ok(txn)
    }

    fn send(self: &Arc<Self>, body: Vec<u8>) -> Result<Message> {
        let mut txn = self.begin()?;
        let id = self.ids.next_id(&mut txn)?;
        txn.insert(&self.ready, id.as_bytes(), &body)?;
        txn.commit()?;

        self.signal.notify();
        debug!(queue = %self.name, id = %id, len = body.len(), "message sent");
        Ok(Message::new(id, body, Arc::downgrade(self)))
    }

    fn try_receive(self: &Arc<Self>) -> Result<Message> {
        self.ensure_open()?;
        if self.capacity == 0 {
            return self.move_ready(1)?.into_iter().next().ok_or(Error::Empty);
        }

        let mut buffer = self.buffer.lock();
        // Close clears the buffer after setting the flag
        self.ensure_open()?;

        if buffer.is_empty() {
            for message in self.move_ready(self.capacity)? {
                buffer.push(message);
            }
        }
        buffer.pop().ok_or(Error::Empty)
    }

    /// Move up to `limit` of the lowest ready keys to unacked
    fn move_ready(self: &Arc<Self>, limit: usize) -> Result<Vec<Message>> {
        let mut txn = self.begin()?;
        let entries = self.ready.first(limit)?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut messages = Vec::with_capacity(entries.len());
        for (key, body) in entries {
            txn.remove(&self.ready, &key)?;
            txn.insert(&self.unacked, &key, &body)?;
            messages.push(Message::new(Id::from(key), body, Arc::downgrade(self)));
        }
        txn.commit()?;

        debug!(queue = %self.name, count = messages.len(), "moved ready messages to unacked");
        Ok(messages)
    }

    fn receive(self: &Arc<Self>, cancel: &CancelToken, deadline: Option<Instant>) -> Result<Message> {
        if !cancel.wakes(&self.signal) {
            return Err(Error::Config(
                "cancel token was issued by a different queue".into(),
            ));
        }

        loop {
            // Read the epoch first: cancel and close set their flag before
            // bumping it, so either the checks below see the flag or the wait
            // sees the bump.
            let seen = self.signal.epoch();
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            match self.try_receive() {
                Err(Error::Empty) => {}
                result => return result,
            }

            if !self.signal.wait(seen, deadline) {
                return Err(Error::DeadlineExceeded);
            }
        }
    }

    /// Ack `message` if the queue is still open
    ///
    /// The once-guard is claimed only after the transaction has started, so a
    /// close that wins the writer lock leaves the message unresolved.
    pub(crate) fn ack(&self, message: &Message) -> Result<()> {
        let txn = self.begin()?;
        message.claim()?;
        message.record(self.commit_ack(txn, message.id()))
    }

    fn commit_ack(&self, mut txn: WriteTxn<'_>, id: &Id) -> Result<()> {
        txn.remove(&self.unacked, id.as_bytes())?;
        txn.commit()?;

        debug!(queue = %self.name, id = %id, "message acked");
        Ok(())
    }

    /// Nack `message` if the queue is still open
    pub(crate) fn nack(&self, message: &Message, retry: bool) -> Result<()> {
        let txn = self.begin()?;
        message.claim()?;
        message.record(self.commit_nack(txn, message.id(), retry))
    }

    fn commit_nack(&self, mut txn: WriteTxn<'_>, id: &Id, retry: bool) -> Result<()> {
        let key = id.as_bytes();
        let body = txn
            .get(&self.unacked, key)?
            .ok_or_else(|| Error::MissingEntry {
                status: Status::Unacked,
                id: id.clone(),
            })?;

        txn.remove(&self.unacked, key)?;
        let destination = if retry {
            Some(&self.ready)
        } else {
            self.returned.as_ref()
        };
        if let Some(bucket) = destination {
            txn.insert(bucket, key, &body)?;
        }
        txn.commit()?;

        if retry {
            self.signal.notify();
        }
        debug!(
            queue = %self.name,
            id = %id,
            retry,
            dead_lettered = !retry && destination.is_some(),
            "message nacked"
        );
        Ok(())
    }

    /// Move every unacked entry back to ready under its original key
    fn recover_unacked(&self) -> Result<usize> {
        let mut txn = self.begin()?;
        let entries = self.unacked.entries()?;
        for (key, body) in &entries {
            txn.remove(&self.unacked, key)?;
            txn.insert(&self.ready, key, body)?;
        }
        txn.commit()?;
        Ok(entries.len())
    }

    fn close(&self) -> Result<()> {
        {
            let _txn = self.store.begin();
            if self.closed.swap(true, Ordering::SeqCst) {
                return Err(Error::Closed);
            }
        }

        let discarded = self.buffer.lock().clear();
        if discarded > 0 {
            warn!(
                queue = %self.name,
                discarded,
                "dropped staged messages on close; they remain unacked"
            );
        }

        self.signal.notify();
        self.store.persist()?;

        info!(queue = %self.name, "queue closed");
        Ok(())
    }
}

//! Durable at-least-once FIFO queue on top of the bucket store
//!
//! Producers [`send`](Queue::send) opaque byte payloads; consumers receive
//! them in ID order and must [`ack`](Message::ack) or [`nack`](Message::nack)
//! each one. Messages live in one of three buckets:
//!
//! - `ready`: waiting for delivery
//! - `unacked`: delivered, waiting for ack/nack
//! - `returned`: nacked without retry (only with dead letters enabled)
//!
//! Every move between buckets is one atomic store transaction, so a crash
//! never leaves a message in two buckets or in none. IDs come from a counter
//! persisted in the store (or a custom [`Sequencer`]) and only ever increase.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use proven_queue::{Options, Queue, Store, StoreConfig};
//!
//! let store = Arc::new(Store::open(StoreConfig::new("/tmp/jobs"))?);
//! let queue = Queue::open(store, "jobs", Options::new().with_dead_letters())?;
//!
//! queue.send(b"resize image 42".to_vec())?;
//!
//! let message = queue.try_receive()?;
//! match message.body() {
//!     b"resize image 42" => message.ack()?,
//!     _ => message.nack(false)?,
//! }
//! # Ok::<(), proven_queue::Error>(())
//! ```

mod buffer;
pub mod error;
pub mod id;
pub mod message;
pub mod options;
pub mod queue;
pub mod sequencer;
mod signal;
pub mod status;

pub use error::{BoxError, Error, Result};
pub use id::Id;
pub use message::Message;
pub use options::{MAX_QUEUE_NAME_LEN, Options};
pub use queue::Queue;
pub use sequencer::{AtomicSequencer, Sequencer};
pub use signal::CancelToken;
pub use status::Status;

// Re-export the store types needed to open a queue
pub use proven_store::{Store, StoreConfig};

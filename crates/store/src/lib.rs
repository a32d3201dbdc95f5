//! Transactional bucket store built on top of Fjall
//!
//! This crate provides the small slice of an embedded key-value store that a
//! durable queue needs:
//! - Named buckets (one Fjall partition each) with key-ordered iteration
//! - Single-writer write transactions that commit atomically across buckets
//! - Persisted per-name sequence counters that commit with the transaction
//!   that consumed them
//!
//! # Architecture
//!
//! A [`Store`] owns the Fjall keyspace and a store-wide writer lock. Readers go
//! straight to a [`Bucket`] and always observe committed state. Writers call
//! [`Store::begin`] to obtain a [`WriteTxn`], which holds the writer lock until
//! it is committed or dropped, so every write transaction sees the result of
//! the previous one and no two of them interleave.

pub mod bucket;
pub mod config;
pub mod encoding;
pub mod error;
pub mod store;
pub mod txn;

pub use bucket::{Bucket, MAX_BUCKET_NAME_LEN};
pub use config::StoreConfig;
pub use encoding::{Decode, Encode};
pub use error::{Error, Result};
pub use store::Store;
pub use txn::{MAX_KEY_LEN, MAX_VALUE_LEN, WriteTxn};

// Re-export the Fjall knobs that appear in the config
pub use fjall::{CompressionType, PersistMode};

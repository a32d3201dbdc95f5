//! Error types for the bucket store

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the store
#[derive(Error, Debug)]
pub enum Error {
    /// Fjall storage error
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    /// Filesystem error outside of Fjall
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Bucket name rejected before reaching Fjall
    #[error("Invalid bucket name: {0:?}")]
    InvalidBucketName(String),

    /// Key rejected before reaching Fjall
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Value too large for Fjall
    #[error("Value of {0} bytes exceeds the maximum value size")]
    ValueTooLarge(usize),

    /// Failure forced through [`Store::fail_next_commits`](crate::Store::fail_next_commits)
    #[cfg(feature = "failpoints")]
    #[error("Injected failure at {0}")]
    Injected(&'static str),
}

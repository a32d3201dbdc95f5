//! Encoding/decoding traits for stored values
//!
//! Values in the store are raw bytes. These traits give the handful of typed
//! values the store keeps for itself (sequence counters) a fixed encoding.

use crate::error::{Error, Result};

/// Encode a value to bytes
pub trait Encode {
    fn encode(&self) -> Result<Vec<u8>>;
}

/// Decode a value from bytes
pub trait Decode: Sized {
    fn decode(bytes: &[u8]) -> Result<Self>;
}

impl Encode for u64 {
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.to_be_bytes().to_vec())
    }
}

impl Decode for u64 {
    fn decode(bytes: &[u8]) -> Result<Self> {
        let buf: [u8; 8] = bytes.try_into().map_err(|_| {
            Error::Encoding(format!("Expected 8 bytes for u64, got {}", bytes.len()))
        })?;
        Ok(u64::from_be_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u64_is_big_endian() {
        assert_eq!(258u64.encode().unwrap(), vec![0, 0, 0, 0, 0, 0, 1, 2]);
        assert!(1u64.encode().unwrap() < 256u64.encode().unwrap());
    }

    #[test]
    fn test_u64_rejects_wrong_length() {
        assert!(matches!(u64::decode(&[1, 2, 3]), Err(Error::Encoding(_))));
        assert_eq!(u64::decode(&[0, 0, 0, 0, 0, 0, 0, 7]).unwrap(), 7);
    }
}

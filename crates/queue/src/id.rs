//! Message identifiers

use std::fmt;

/// Message identifier
///
/// IDs are opaque bytes. The queue orders messages by comparing IDs
/// byte-wise, so a sequencer must produce IDs whose big-endian byte
/// representation increases. The default sequencer produces 8-byte
/// big-endian `u64`s.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(Vec<u8>);

impl Id {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Interpret an 8-byte ID as a big-endian `u64`
    pub fn to_u64(&self) -> Option<u64> {
        let buf: [u8; 8] = self.0.as_slice().try_into().ok()?;
        Some(u64::from_be_bytes(buf))
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Self(value.to_be_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Id {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Id {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u64_ids_order_bytewise() {
        let ids: Vec<Id> = [1u64, 2, 255, 256, 1 << 40].into_iter().map(Id::from).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(ids[3].to_u64(), Some(256));
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(Id::from(258u64).to_string(), "0000000000000102");
        assert_eq!(Id::new(vec![0xab]).to_string(), "ab");
        assert_eq!(Id::new(vec![0xab]).to_u64(), None);
    }
}

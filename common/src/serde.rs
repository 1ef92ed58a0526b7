//! Key encoding helpers shared by every record stored through [`Storage`].
//!
//! All keys start with a two byte prefix:
//!
//! ```text
//! | version (u8) | tag (u8) | ... record-specific fields ... |
//! ```
//!
//! The tag identifies the record type. Crates sharing one storage instance
//! must use disjoint tags:
//!
//! - `0x10..=0x2F`: event log records (`eventlog` crate)
//! - `0x40..=0x5F`: content records (`blog` crate)
//!
//! [`Storage`]: crate::Storage

use std::fmt;
use std::ops::Bound;

use bytes::{BufMut, Bytes, BytesMut};

use crate::BytesRange;

/// Error produced when stored bytes cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializeError {
    pub message: String,
}

impl DeserializeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DeserializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deserialize error: {}", self.message)
    }
}

impl std::error::Error for DeserializeError {}

/// The `| version | tag |` prefix of a storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPrefix {
    version: u8,
    tag: u8,
}

impl KeyPrefix {
    pub const LEN: usize = 2;

    pub const fn new(version: u8, tag: u8) -> Self {
        Self { version, tag }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn to_bytes(&self) -> [u8; 2] {
        [self.version, self.tag]
    }

    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u8(self.version);
        buf.put_u8(self.tag);
    }

    /// Reads a prefix and checks that it carries the expected version.
    pub fn from_bytes_versioned(data: &[u8], expected_version: u8) -> Result<Self, DeserializeError> {
        if data.len() < Self::LEN {
            return Err(DeserializeError::new(format!(
                "key too short for prefix: {} bytes",
                data.len()
            )));
        }
        if data[0] != expected_version {
            return Err(DeserializeError::new(format!(
                "unsupported key version: expected 0x{:02x}, got 0x{:02x}",
                expected_version, data[0]
            )));
        }
        Ok(Self::new(data[0], data[1]))
    }

    /// Range covering every key that starts with this prefix.
    pub fn scan_range(&self) -> BytesRange {
        let start = Bytes::copy_from_slice(&self.to_bytes());
        match self.tag.checked_add(1) {
            Some(next_tag) => BytesRange::new(
                Bound::Included(start),
                Bound::Excluded(Bytes::copy_from_slice(&[self.version, next_tag])),
            ),
            None => match self.version.checked_add(1) {
                Some(next_version) => BytesRange::new(
                    Bound::Included(start),
                    Bound::Excluded(Bytes::copy_from_slice(&[next_version])),
                ),
                None => BytesRange::new(Bound::Included(start), Bound::Unbounded),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ops::RangeBounds;

    use rstest::rstest;

    use super::*;

    #[test]
    fn should_write_prefix_bytes() {
        // given
        let prefix = KeyPrefix::new(0x01, 0x10);
        let mut buf = BytesMut::new();

        // when
        prefix.write_to(&mut buf);

        // then
        assert_eq!(buf.as_ref(), &[0x01, 0x10]);
    }

    #[rstest]
    #[case::wrong_version(&[0x02, 0x10, 0x00])]
    #[case::too_short(&[0x01])]
    #[case::empty(&[])]
    fn should_reject_invalid_prefix(#[case] data: &[u8]) {
        // when
        let result = KeyPrefix::from_bytes_versioned(data, 0x01);

        // then
        assert!(result.is_err());
    }

    #[test]
    fn should_read_prefix_with_expected_version() {
        // when
        let prefix = KeyPrefix::from_bytes_versioned(&[0x01, 0x41, 0x61], 0x01).unwrap();

        // then
        assert_eq!(prefix, KeyPrefix::new(0x01, 0x41));
    }

    #[test]
    fn should_scan_only_keys_with_prefix() {
        // given
        let range = KeyPrefix::new(0x01, 0x10).scan_range();

        // then
        assert!(range.contains(&Bytes::from_static(&[0x01, 0x10])));
        assert!(range.contains(&Bytes::from_static(&[0x01, 0x10, 0xFF, 0xFF])));
        assert!(!range.contains(&Bytes::from_static(&[0x01, 0x11])));
        assert!(!range.contains(&Bytes::from_static(&[0x01, 0x0F, 0xFF])));
    }

    #[test]
    fn should_scan_to_next_version_when_tag_is_max() {
        // given
        let range = KeyPrefix::new(0x01, 0xFF).scan_range();

        // then
        assert!(range.contains(&Bytes::from_static(&[0x01, 0xFF, 0x00])));
        assert!(!range.contains(&Bytes::from_static(&[0x02])));
    }
}

//! Key encoding for blog records.
//!
//! ```text
//! | version (u8) | tag (u8) | record key (UTF-8 bytes) |
//! ```
//!
//! Record values are the JSON encoding of the record.

use bytes::{BufMut, Bytes, BytesMut};
use common::BytesRange;
use common::serde::KeyPrefix;

use crate::error::{Error, Result};

/// Key format version (currently 0x01)
pub(crate) const KEY_VERSION: u8 = 0x01;

/// Tag of article records.
pub(crate) const ARTICLE_TAG: u8 = 0x40;

/// Tag of user records.
pub(crate) const USER_TAG: u8 = 0x41;

pub(crate) fn encode_key(tag: u8, key: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(KeyPrefix::LEN + key.len());
    KeyPrefix::new(KEY_VERSION, tag).write_to(&mut buf);
    buf.put_slice(key.as_bytes());
    buf.freeze()
}

pub(crate) fn decode_key(tag: u8, data: &[u8]) -> Result<String> {
    let prefix = KeyPrefix::from_bytes_versioned(data, KEY_VERSION)
        .map_err(|e| Error::Serialization(e.message))?;
    if prefix.tag() != tag {
        return Err(Error::Serialization(format!(
            "unexpected record tag: expected 0x{:02x}, got 0x{:02x}",
            tag,
            prefix.tag()
        )));
    }
    String::from_utf8(data[KeyPrefix::LEN..].to_vec())
        .map_err(|e| Error::Serialization(format!("record key is not UTF-8: {}", e)))
}

/// Range covering every record with `tag`.
pub(crate) fn scan_range(tag: u8) -> BytesRange {
    KeyPrefix::new(KEY_VERSION, tag).scan_range()
}

#[cfg(test)]
mod tests {
    use std::ops::RangeBounds;

    use super::*;

    #[test]
    fn should_encode_key_after_prefix() {
        // when
        let key = encode_key(ARTICLE_TAG, "foo");

        // then
        assert_eq!(key.as_ref(), &[0x01, 0x40, b'f', b'o', b'o']);
        assert_eq!(decode_key(ARTICLE_TAG, &key).unwrap(), "foo");
    }

    #[test]
    fn should_reject_key_with_other_tag() {
        // given
        let key = encode_key(USER_TAG, "foo");

        // when
        let result = decode_key(ARTICLE_TAG, &key);

        // then
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn should_separate_article_and_user_ranges() {
        // given
        let articles = scan_range(ARTICLE_TAG);

        // then
        assert!(articles.contains(&encode_key(ARTICLE_TAG, "zzz")));
        assert!(!articles.contains(&encode_key(USER_TAG, "")));
    }
}

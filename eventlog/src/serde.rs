//! Serde for event log storage.
//!
//! # Key Format
//!
//! All keys start with a version byte and record type discriminator:
//!
//! ```text
//! | version (u8) | type (u8) | ... record-specific fields ... |
//! ```
//!
//! # Record Types
//!
//! - `Event` (0x10): one record per event, keyed by offset
//! - `LogHead` (0x20): the offset the next append will receive
//!
//! Offsets are encoded big-endian so that lexicographic key order matches
//! commit order.

use std::ops::{Bound, Range};

use bytes::{BufMut, Bytes, BytesMut};
use common::BytesRange;
use common::serde::KeyPrefix;

use crate::error::Error;
use crate::model::{Event, Offset};

impl From<common::serde::DeserializeError> for Error {
    fn from(err: common::serde::DeserializeError) -> Self {
        Error::Encoding(err.message)
    }
}

/// Key format version (currently 0x01)
pub(crate) const KEY_VERSION: u8 = 0x01;

/// Storage key for the LogHead record.
pub(crate) const LOG_HEAD_KEY: [u8; 2] = [KEY_VERSION, 0x20]; // RecordType::LogHead

/// Record type discriminators for event log storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordType {
    /// Event record containing timestamp and payload
    Event = 0x10,
    /// Head record tracking the next offset
    LogHead = 0x20,
}

impl RecordType {
    pub(crate) fn id(&self) -> u8 {
        *self as u8
    }

    pub(crate) fn from_id(id: u8) -> Result<Self, Error> {
        match id {
            0x10 => Ok(RecordType::Event),
            0x20 => Ok(RecordType::LogHead),
            _ => Err(Error::Encoding(format!(
                "invalid record type: 0x{:02x}",
                id
            ))),
        }
    }

    pub(crate) fn prefix(&self) -> KeyPrefix {
        KeyPrefix::new(KEY_VERSION, self.id())
    }
}

/// Key for an event record.
///
/// ```text
/// | version (u8) | type (u8=0x10) | offset (u64 BE) |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EventKey {
    pub(crate) offset: Offset,
}

impl EventKey {
    const LEN: usize = KeyPrefix::LEN + 8;

    pub(crate) fn new(offset: Offset) -> Self {
        Self { offset }
    }

    pub(crate) fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::LEN);
        RecordType::Event.prefix().write_to(&mut buf);
        buf.put_u64(self.offset);
        buf.freeze()
    }

    pub(crate) fn deserialize(data: &[u8]) -> Result<Self, Error> {
        let prefix = KeyPrefix::from_bytes_versioned(data, KEY_VERSION)?;
        let record_type = RecordType::from_id(prefix.tag())?;
        if record_type != RecordType::Event {
            return Err(Error::Encoding(format!(
                "invalid record type: expected Event, got {:?}",
                record_type
            )));
        }

        if data.len() != Self::LEN {
            return Err(Error::Encoding(format!(
                "invalid event key length: expected {}, got {}",
                Self::LEN,
                data.len()
            )));
        }

        let mut offset = [0u8; 8];
        offset.copy_from_slice(&data[2..10]);
        Ok(EventKey {
            offset: u64::from_be_bytes(offset),
        })
    }

    /// Creates a storage key range covering `range` (inclusive start,
    /// exclusive end).
    pub(crate) fn scan_range(range: Range<Offset>) -> BytesRange {
        let start = Bound::Included(EventKey::new(range.start).serialize());
        let end = Bound::Excluded(EventKey::new(range.end).serialize());
        BytesRange::new(start, end)
    }
}

/// Value for an event record.
///
/// ```text
/// | timestamp_ms (i64 BE) | payload (remaining bytes) |
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EventValue {
    pub(crate) timestamp_ms: i64,
    pub(crate) payload: Bytes,
}

impl EventValue {
    const HEADER_LEN: usize = 8;

    pub(crate) fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::HEADER_LEN + self.payload.len());
        buf.put_i64(self.timestamp_ms);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Decodes the value, sharing the payload with `data` instead of copying.
    pub(crate) fn deserialize(data: &Bytes) -> Result<Self, Error> {
        if data.len() < Self::HEADER_LEN {
            return Err(Error::Encoding(format!(
                "buffer too short for event value: need {} bytes, got {}",
                Self::HEADER_LEN,
                data.len()
            )));
        }

        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(&data[..Self::HEADER_LEN]);
        Ok(EventValue {
            timestamp_ms: i64::from_be_bytes(timestamp),
            payload: data.slice(Self::HEADER_LEN..),
        })
    }
}

/// Value for the LogHead record.
///
/// ```text
/// | head (u64 BE) |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LogHead {
    pub(crate) head: Offset,
}

impl LogHead {
    pub(crate) fn new(head: Offset) -> Self {
        Self { head }
    }

    pub(crate) fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(8);
        buf.put_u64(self.head);
        buf.freeze()
    }

    pub(crate) fn deserialize(data: &[u8]) -> Result<Self, Error> {
        if data.len() != 8 {
            return Err(Error::Encoding(format!(
                "invalid LogHead value length: expected 8, got {}",
                data.len()
            )));
        }
        let mut head = [0u8; 8];
        head.copy_from_slice(data);
        Ok(LogHead {
            head: u64::from_be_bytes(head),
        })
    }
}

/// Builds the storage records written by a single append.
///
/// Produces one record per event followed by the updated head record, so the
/// caller can write them in one atomic batch.
pub(crate) fn build_append_records(events: &[Event], new_head: Offset) -> Vec<common::Record> {
    let mut records = Vec::with_capacity(events.len() + 1);
    for event in events {
        let value = EventValue {
            timestamp_ms: event.timestamp_ms,
            payload: event.payload.clone(),
        };
        records.push(common::Record::new(
            EventKey::new(event.offset).serialize(),
            value.serialize(),
        ));
    }
    records.push(common::Record::new(
        Bytes::from_static(&LOG_HEAD_KEY),
        LogHead::new(new_head).serialize(),
    ));
    records
}

impl Event {
    /// Decodes an event from its storage key and value.
    pub(crate) fn from_record(record: &common::Record) -> Result<Self, Error> {
        let key = EventKey::deserialize(&record.key)?;
        let value = EventValue::deserialize(&record.value)?;
        Ok(Event {
            offset: key.offset,
            timestamp_ms: value.timestamp_ms,
            payload: value.payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::ops::RangeBounds;

    use super::*;

    #[test]
    fn should_convert_record_type_to_id_and_back() {
        for record_type in [RecordType::Event, RecordType::LogHead] {
            assert_eq!(RecordType::from_id(record_type.id()).unwrap(), record_type);
        }
    }

    #[test]
    fn should_reject_invalid_record_type() {
        // when
        let result = RecordType::from_id(0x30);

        // then
        assert!(matches!(result, Err(Error::Encoding(_))));
    }

    #[test]
    fn should_serialize_event_key_with_correct_structure() {
        // given
        let key = EventKey::new(0x0102);

        // when
        let serialized = key.serialize();

        // then
        assert_eq!(
            serialized.as_ref(),
            &[0x01, 0x10, 0, 0, 0, 0, 0, 0, 0x01, 0x02]
        );
        assert_eq!(EventKey::deserialize(&serialized).unwrap(), key);
    }

    #[test]
    fn should_reject_head_key_as_event_key() {
        // when
        let result = EventKey::deserialize(&LOG_HEAD_KEY);

        // then
        assert!(matches!(result, Err(Error::Encoding(_))));
    }

    #[test]
    fn should_keep_head_key_outside_event_scan_range() {
        // given
        let range = EventKey::scan_range(0..u64::MAX);

        // then
        assert!(!range.contains(&Bytes::from_static(&LOG_HEAD_KEY)));
        assert!(range.contains(&EventKey::new(0).serialize()));
        assert!(range.contains(&EventKey::new(u64::MAX - 1).serialize()));
    }

    #[test]
    fn should_share_payload_when_decoding_event_value() {
        // given
        let value = EventValue {
            timestamp_ms: -5,
            payload: Bytes::from("payload"),
        };
        let serialized = value.serialize();

        // when
        let decoded = EventValue::deserialize(&serialized).unwrap();

        // then
        assert_eq!(decoded, value);
        assert_eq!(decoded.payload.as_ptr(), serialized[8..].as_ptr());
    }

    #[test]
    fn should_fail_deserialize_event_value_too_short() {
        // when
        let result = EventValue::deserialize(&Bytes::from_static(&[0x00, 0x01]));

        // then
        assert!(matches!(result, Err(Error::Encoding(_))));
    }

    #[test]
    fn should_build_event_records_followed_by_head() {
        // given
        let events = vec![
            Event {
                offset: 3,
                timestamp_ms: 10,
                payload: Bytes::from("a"),
            },
            Event {
                offset: 4,
                timestamp_ms: 10,
                payload: Bytes::from("b"),
            },
        ];

        // when
        let records = build_append_records(&events, 5);

        // then
        assert_eq!(records.len(), 3);
        assert_eq!(Event::from_record(&records[0]).unwrap(), events[0]);
        assert_eq!(Event::from_record(&records[1]).unwrap(), events[1]);
        assert_eq!(records[2].key.as_ref(), &LOG_HEAD_KEY);
        assert_eq!(LogHead::deserialize(&records[2].value).unwrap().head, 5);
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn should_preserve_offset_ordering(a: u64, b: u64) {
                let enc_a = EventKey::new(a).serialize();
                let enc_b = EventKey::new(b).serialize();

                prop_assert_eq!(a.cmp(&b), enc_a.cmp(&enc_b));
            }
        }
    }
}

//! Event-log specific storage wrappers.
//!
//! [`EventLogStorage`] and [`EventLogStorageRead`] wrap the shared storage
//! traits with the handful of operations the log needs: recovering the head,
//! scanning events by offset and writing an append batch.

use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;
use common::{RecordOp, Storage, StorageRead, WriteOptions};

use crate::error::{Error, Result};
use crate::model::{Event, Offset};
use crate::reader::EventIterator;
use crate::serde::{EventKey, LOG_HEAD_KEY, LogHead, build_append_records};

/// Read-only event log storage operations.
#[derive(Clone)]
pub(crate) struct EventLogStorageRead {
    storage: Arc<dyn StorageRead>,
}

impl EventLogStorageRead {
    pub(crate) fn new(storage: Arc<dyn StorageRead>) -> Self {
        Self { storage }
    }

    /// Reads the persisted head.
    ///
    /// Returns `None` if nothing has been appended yet.
    pub(crate) async fn get_head(&self) -> Result<Option<Offset>> {
        let record = self.storage.get(Bytes::from_static(&LOG_HEAD_KEY)).await?;
        match record {
            Some(r) => Ok(Some(LogHead::deserialize(&r.value)?.head)),
            None => Ok(None),
        }
    }

    /// Scans events within the given offset range (inclusive start,
    /// exclusive end).
    pub(crate) async fn scan_events(&self, range: Range<Offset>) -> Result<EventIterator> {
        if range.is_empty() {
            return Ok(EventIterator::empty());
        }
        let scan_range = EventKey::scan_range(range);
        let inner = self.storage.scan_iter(scan_range).await?;
        Ok(EventIterator::new(inner))
    }

    /// Reads every event in `range` and checks that none is missing.
    ///
    /// The range must lie below a published head, so a gap means the backend
    /// lost a committed record.
    pub(crate) async fn read_contiguous(&self, range: Range<Offset>) -> Result<Vec<Event>> {
        let mut iter = self.scan_events(range.clone()).await?;
        let mut events = Vec::with_capacity((range.end - range.start) as usize);
        let mut expected = range.start;
        while let Some(event) = iter.next().await? {
            if event.offset != expected {
                return Err(Error::Storage(format!(
                    "missing event at offset {}",
                    expected
                )));
            }
            expected += 1;
            events.push(event);
        }
        if expected != range.end {
            return Err(Error::Storage(format!(
                "missing event at offset {}",
                expected
            )));
        }
        Ok(events)
    }
}

/// Read-write event log storage.
pub(crate) struct EventLogStorage {
    storage: Arc<dyn Storage>,
}

impl EventLogStorage {
    pub(crate) fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub(crate) fn as_read(&self) -> EventLogStorageRead {
        EventLogStorageRead::new(self.storage.clone())
    }

    /// Writes `events`, the new head and any `extra` operations in one
    /// durable batch.
    pub(crate) async fn write_events(
        &self,
        events: &[Event],
        new_head: Offset,
        extra: Vec<RecordOp>,
    ) -> Result<()> {
        let mut ops = extra;
        ops.extend(
            build_append_records(events, new_head)
                .into_iter()
                .map(RecordOp::from),
        );
        self.storage
            .apply_with_options(
                ops,
                WriteOptions {
                    await_durable: true,
                },
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn close(&self) -> Result<()> {
        self.storage.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::storage::in_memory::InMemoryStorage;

    use super::*;

    fn event(offset: Offset) -> Event {
        Event {
            offset,
            timestamp_ms: 1_000,
            payload: Bytes::from(format!("event-{}", offset)),
        }
    }

    #[tokio::test]
    async fn should_return_no_head_for_empty_storage() {
        // given
        let storage = EventLogStorage::new(Arc::new(InMemoryStorage::new()));

        // when
        let head = storage.as_read().get_head().await.unwrap();

        // then
        assert_eq!(head, None);
    }

    #[tokio::test]
    async fn should_write_events_and_head_together() {
        // given
        let storage = EventLogStorage::new(Arc::new(InMemoryStorage::new()));
        let events = vec![event(0), event(1)];

        // when
        storage.write_events(&events, 2, Vec::new()).await.unwrap();

        // then
        let read = storage.as_read();
        assert_eq!(read.get_head().await.unwrap(), Some(2));
        assert_eq!(read.read_contiguous(0..2).await.unwrap(), events);
    }

    #[tokio::test]
    async fn should_write_extra_records_in_the_same_batch() {
        // given
        let backend = Arc::new(InMemoryStorage::new());
        let storage = EventLogStorage::new(backend.clone());
        let extra = common::Record::new(Bytes::from_static(b"\x01\x40foo"), Bytes::from("{}"));

        // when
        storage
            .write_events(&[event(0)], 1, vec![RecordOp::Put(extra.clone())])
            .await
            .unwrap();

        // then
        assert_eq!(backend.get(extra.key.clone()).await.unwrap(), Some(extra));
        assert_eq!(storage.as_read().get_head().await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn should_fail_read_when_committed_event_is_missing() {
        // given
        let backend = Arc::new(InMemoryStorage::new());
        let storage = EventLogStorage::new(backend.clone());
        storage
            .write_events(&[event(0), event(1), event(2)], 3, Vec::new())
            .await
            .unwrap();
        backend
            .delete(vec![EventKey::new(1).serialize()])
            .await
            .unwrap();

        // when
        let result = storage.as_read().read_contiguous(0..3).await;

        // then
        assert!(matches!(result, Err(Error::Storage(_))));
    }
}

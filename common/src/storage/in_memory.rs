//! Ordered in-memory storage backend.
//!
//! Useful for tests and local development. Data is lost when the process
//! exits.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use super::{
    BytesRange, Record, RecordOp, Storage, StorageError, StorageIterator, StorageRead,
    StorageResult, WriteOptions,
};

/// In-memory implementation of [`Storage`] backed by a `BTreeMap`.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    data: RwLock<BTreeMap<Bytes, Bytes>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Internal("in-memory storage lock poisoned".to_string())
}

#[async_trait]
impl StorageRead for InMemoryStorage {
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.get(&key).map(|v| Record::new(key.clone(), v.clone())))
    }

    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>> {
        let data = self.data.read().map_err(poisoned)?;
        let records: Vec<Record> = data
            .range(range)
            .map(|(k, v)| Record::new(k.clone(), v.clone()))
            .collect();
        Ok(Box::new(InMemoryIterator {
            records: records.into_iter(),
        }))
    }
}

struct InMemoryIterator {
    records: std::vec::IntoIter<Record>,
}

#[async_trait]
impl StorageIterator for InMemoryIterator {
    async fn next(&mut self) -> StorageResult<Option<Record>> {
        Ok(self.records.next())
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn apply_with_options(
        &self,
        ops: Vec<RecordOp>,
        _options: WriteOptions,
    ) -> StorageResult<()> {
        let mut data = self.data.write().map_err(poisoned)?;
        for op in ops {
            match op {
                RecordOp::Put(record) => {
                    data.insert(record.key, record.value);
                }
                RecordOp::Delete(key) => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Bound;

    use super::*;

    fn record(key: &'static str, value: &'static str) -> Record {
        Record::new(Bytes::from(key), Bytes::from(value))
    }

    #[tokio::test]
    async fn should_get_put_record() {
        // given
        let storage = InMemoryStorage::new();
        storage.put(vec![record("a", "1")]).await.unwrap();

        // when
        let result = storage.get(Bytes::from("a")).await.unwrap();

        // then
        assert_eq!(result, Some(record("a", "1")));
    }

    #[tokio::test]
    async fn should_return_none_for_missing_key() {
        // given
        let storage = InMemoryStorage::new();

        // when
        let result = storage.get(Bytes::from("missing")).await.unwrap();

        // then
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn should_scan_in_key_order_within_range() {
        // given
        let storage = InMemoryStorage::new();
        storage
            .put(vec![record("c", "3"), record("a", "1"), record("b", "2"), record("d", "4")])
            .await
            .unwrap();
        let range = BytesRange::new(
            Bound::Included(Bytes::from("b")),
            Bound::Excluded(Bytes::from("d")),
        );

        // when
        let records = storage.scan(range).await.unwrap();

        // then
        assert_eq!(records, vec![record("b", "2"), record("c", "3")]);
    }

    #[tokio::test]
    async fn should_apply_puts_and_deletes_in_one_batch() {
        // given
        let storage = InMemoryStorage::new();
        storage.put(vec![record("a", "1")]).await.unwrap();

        // when
        storage
            .apply(vec![
                RecordOp::Delete(Bytes::from("a")),
                RecordOp::Put(record("b", "2")),
            ])
            .await
            .unwrap();

        // then
        assert!(storage.get(Bytes::from("a")).await.unwrap().is_none());
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn should_not_see_writes_after_scan_started() {
        // given
        let storage = InMemoryStorage::new();
        storage.put(vec![record("a", "1")]).await.unwrap();
        let mut iter = storage.scan_iter(BytesRange::unbounded()).await.unwrap();

        // when
        storage.put(vec![record("b", "2")]).await.unwrap();

        // then
        assert_eq!(iter.next().await.unwrap(), Some(record("a", "1")));
        assert!(iter.next().await.unwrap().is_none());
    }
}

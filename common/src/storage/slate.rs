use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use slatedb::{Db, DbIterator, WriteBatch, config::WriteOptions as SlateDbWriteOptions};

use super::{
    BytesRange, Record, RecordOp, Storage, StorageError, StorageIterator, StorageRead,
    StorageResult, WriteOptions,
};

/// SlateDB-backed implementation of the Storage trait.
///
/// SlateDB is an embedded key-value store built on object storage, providing
/// LSM-tree semantics with cloud-native durability.
pub struct SlateDbStorage {
    pub(super) db: Arc<Db>,
}

impl SlateDbStorage {
    /// Creates a new SlateDbStorage instance wrapping the given SlateDB database.
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StorageRead for SlateDbStorage {
    /// Retrieves a single record by key from SlateDB.
    ///
    /// Returns `None` if the key does not exist.
    #[tracing::instrument(level = "trace", skip_all)]
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
        let value = self
            .db
            .get(&key)
            .await
            .map_err(StorageError::from_storage)?;

        match value {
            Some(v) => Ok(Some(Record::new(key, v))),
            None => Ok(None),
        }
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>> {
        let iter = self
            .db
            .scan(range)
            .await
            .map_err(StorageError::from_storage)?;
        Ok(Box::new(SlateDbIterator { iter }))
    }
}

struct SlateDbIterator {
    iter: DbIterator,
}

#[async_trait]
impl StorageIterator for SlateDbIterator {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn next(&mut self) -> StorageResult<Option<Record>> {
        match self.iter.next().await.map_err(StorageError::from_storage)? {
            Some(entry) => Ok(Some(Record::new(entry.key, entry.value))),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Storage for SlateDbStorage {
    /// Writes a batch of operations to SlateDB atomically.
    async fn apply_with_options(
        &self,
        ops: Vec<RecordOp>,
        options: WriteOptions,
    ) -> StorageResult<()> {
        let mut batch = WriteBatch::new();
        for op in ops {
            match op {
                RecordOp::Put(record) => batch.put(record.key, record.value),
                RecordOp::Delete(key) => batch.delete(key),
            }
        }
        let slate_options = SlateDbWriteOptions {
            await_durable: options.await_durable,
        };
        self.db
            .write_with_options(batch, &slate_options)
            .await
            .map_err(StorageError::from_storage)?;
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        self.db.close().await.map_err(StorageError::from_storage)
    }
}

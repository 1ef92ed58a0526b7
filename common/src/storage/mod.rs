//! Storage traits and the backends implementing them.
//!
//! [`StorageRead`] covers point lookups and ordered range scans, [`Storage`]
//! adds atomic batch writes. Keys are ordered lexicographically by bytes in
//! every backend, which is what the event log relies on for offset order.

pub mod config;
pub mod factory;
pub mod in_memory;
pub mod slate;

use std::ops::{Bound, RangeBounds};

use async_trait::async_trait;
use bytes::Bytes;

/// A key/value pair as stored in the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Bytes,
    pub value: Bytes,
}

impl Record {
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }
}

/// A single operation inside an atomic write batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOp {
    Put(Record),
    Delete(Bytes),
}

impl From<Record> for RecordOp {
    fn from(record: Record) -> Self {
        RecordOp::Put(record)
    }
}

/// Options for write operations.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Wait for the batch to reach durable storage before returning.
    pub await_durable: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            await_durable: true,
        }
    }
}

/// Errors raised by storage backends.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The backend rejected or failed the operation.
    #[error("Storage error: {0}")]
    Storage(String),
    /// An invariant inside the storage layer was violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Wraps any backend error as a [`StorageError::Storage`].
    pub fn from_storage(err: impl std::fmt::Display) -> Self {
        StorageError::Storage(err.to_string())
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Owned byte-key range used for scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytesRange {
    start: Bound<Bytes>,
    end: Bound<Bytes>,
}

impl BytesRange {
    pub fn new(start: Bound<Bytes>, end: Bound<Bytes>) -> Self {
        Self { start, end }
    }

    /// Range over every key.
    pub fn unbounded() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }
}

impl RangeBounds<Bytes> for BytesRange {
    fn start_bound(&self) -> Bound<&Bytes> {
        self.start.as_ref()
    }

    fn end_bound(&self) -> Bound<&Bytes> {
        self.end.as_ref()
    }
}

/// Iterator over records returned by a scan, in key order.
#[async_trait]
pub trait StorageIterator {
    async fn next(&mut self) -> StorageResult<Option<Record>>;
}

/// Read operations supported by every backend.
#[async_trait]
pub trait StorageRead: Send + Sync {
    /// Retrieves a single record by key, or `None` if absent.
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>>;

    /// Returns an iterator over records whose keys fall inside `range`.
    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>>;

    /// Collects every record inside `range`.
    async fn scan(&self, range: BytesRange) -> StorageResult<Vec<Record>> {
        let mut iter = self.scan_iter(range).await?;
        let mut records = Vec::new();
        while let Some(record) = iter.next().await? {
            records.push(record);
        }
        Ok(records)
    }
}

/// Read-write storage.
///
/// All operations passed to a single [`apply`](Storage::apply) call become
/// visible atomically.
#[async_trait]
pub trait Storage: StorageRead {
    async fn apply_with_options(
        &self,
        ops: Vec<RecordOp>,
        options: WriteOptions,
    ) -> StorageResult<()>;

    async fn apply(&self, ops: Vec<RecordOp>) -> StorageResult<()> {
        self.apply_with_options(ops, WriteOptions::default()).await
    }

    async fn put(&self, records: Vec<Record>) -> StorageResult<()> {
        self.apply(records.into_iter().map(RecordOp::Put).collect())
            .await
    }

    async fn delete(&self, keys: Vec<Bytes>) -> StorageResult<()> {
        self.apply(keys.into_iter().map(RecordOp::Delete).collect())
            .await
    }

    /// Flushes and releases the backend. Further calls may fail.
    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

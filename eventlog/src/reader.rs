//! Read-only log access and the [`LogRead`] trait.
//!
//! This module provides:
//! - [`LogRead`]: The trait defining read operations on the log.
//! - [`EventLogReader`]: A cloneable read-only view that implements `LogRead`.
//! - [`EventIterator`]: The iterator returned by range reads.

use std::ops::RangeBounds;

use async_trait::async_trait;
use common::StorageIterator;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::TailConfig;
use crate::cursor::TailingCursor;
use crate::error::Result;
use crate::model::{Event, Offset};
use crate::range::{clamp_to_head, normalize_offset};
use crate::storage::EventLogStorageRead;

/// Trait for read operations on the log.
///
/// Implemented by [`EventLog`](crate::EventLog) and [`EventLogReader`], so
/// consumers can be written against either.
///
/// # Example
///
/// ```ignore
/// use eventlog::LogRead;
///
/// async fn replay(reader: &impl LogRead) -> Result<()> {
///     let mut iter = reader.read_from(0).await?;
///     while let Some(event) = iter.next().await? {
///         println!("offset={}: {:?}", event.offset, event.payload);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait LogRead {
    /// Returns the offset the next append will receive.
    ///
    /// This is the most recently published head; it never runs ahead of
    /// durable storage.
    fn head(&self) -> Offset;

    /// Returns the number of committed events.
    async fn count(&self) -> Result<u64>;

    /// Reads committed events within an offset range, in offset order.
    ///
    /// The range is bounded by the head at call time: events appended while
    /// the iterator is open are not returned. Use a [`TailingCursor`] to
    /// follow new appends.
    async fn read_range(&self, range: impl RangeBounds<Offset> + Send) -> Result<EventIterator>;

    /// Reads every committed event at or after `offset`.
    async fn read_from(&self, offset: Offset) -> Result<EventIterator> {
        self.read_range(offset..).await
    }

    /// Creates a cursor that emits every event at or after `offset`,
    /// waiting for new appends once it has caught up.
    fn tail_from(&self, offset: Offset) -> TailingCursor;

    /// Creates a cursor that skips the events already committed and emits
    /// only those appended from now on.
    fn tail(&self) -> TailingCursor {
        self.tail_from(self.head())
    }
}

/// A read-only view of the log.
///
/// Obtained from [`EventLog::reader`](crate::EventLog::reader). Readers share
/// the log's storage and head notifications and can be cloned freely. They
/// observe every append made through the log they were created from and stop
/// tailing when that log is closed or dropped.
#[derive(Clone)]
pub struct EventLogReader {
    storage: EventLogStorageRead,
    head_rx: watch::Receiver<Offset>,
    cancel: CancellationToken,
    tailing: TailConfig,
}

impl EventLogReader {
    pub(crate) fn new(
        storage: EventLogStorageRead,
        head_rx: watch::Receiver<Offset>,
        cancel: CancellationToken,
        tailing: TailConfig,
    ) -> Self {
        Self {
            storage,
            head_rx,
            cancel,
            tailing,
        }
    }

    /// Creates a cursor whose waits end when `cancel` fires.
    pub(crate) fn tail_with_token(&self, offset: Offset, cancel: CancellationToken) -> TailingCursor {
        TailingCursor::new(
            self.storage.clone(),
            self.head_rx.clone(),
            cancel,
            self.tailing.read_batch_size,
            offset,
        )
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn head_receiver(&self) -> watch::Receiver<Offset> {
        self.head_rx.clone()
    }
}

#[async_trait]
impl LogRead for EventLogReader {
    fn head(&self) -> Offset {
        *self.head_rx.borrow()
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.head())
    }

    async fn read_range(&self, range: impl RangeBounds<Offset> + Send) -> Result<EventIterator> {
        let range = clamp_to_head(normalize_offset(&range), self.head());
        self.storage.scan_events(range).await
    }

    fn tail_from(&self, offset: Offset) -> TailingCursor {
        self.tail_with_token(offset, self.cancel.child_token())
    }
}

/// Iterator over events returned by a range read.
pub struct EventIterator {
    inner: Option<Box<dyn StorageIterator + Send>>,
}

impl EventIterator {
    pub(crate) fn new(inner: Box<dyn StorageIterator + Send>) -> Self {
        Self { inner: Some(inner) }
    }

    pub(crate) fn empty() -> Self {
        Self { inner: None }
    }

    /// Returns the next event, or `None` when the range is exhausted.
    pub async fn next(&mut self) -> Result<Option<Event>> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(None);
        };
        match inner.next().await? {
            Some(record) => Ok(Some(Event::from_record(&record)?)),
            None => {
                self.inner = None;
                Ok(None)
            }
        }
    }

    /// Drains the iterator into a vector.
    pub async fn collect(mut self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await? {
            events.push(event);
        }
        Ok(events)
    }
}

//! Core event log implementation with append and read APIs.
//!
//! This module provides the [`EventLog`] struct, the primary entry point for
//! writing events. Read operations are exposed through the [`LogRead`]
//! trait, which `EventLog` implements by delegating to its
//! [`EventLogReader`].

use std::ops::{Range, RangeBounds};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use common::{RecordOp, Storage};
use common::clock::{Clock, SystemClock};
use common::storage::factory::create_storage;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, TailConfig};
use crate::cursor::TailingCursor;
use crate::error::{Error, Result};
use crate::model::{Event, Offset};
use crate::reader::{EventIterator, EventLogReader, LogRead};
use crate::storage::EventLogStorage;

/// The append-only event log.
///
/// Every appended payload receives the next [`Offset`]. The event records
/// and the new head are written in a single durable batch, after which the
/// head is published to every cursor waiting on it.
///
/// # Thread Safety
///
/// `EventLog` is designed to be shared across tasks, typically behind an
/// `Arc`. All methods take `&self`. Appends are serialized by an internal
/// async mutex held across the storage write, so no two appends receive the
/// same offset and offsets are published in order.
///
/// # Example
///
/// ```ignore
/// use eventlog::{Config, EventLog, LogRead};
/// use bytes::Bytes;
///
/// let log = EventLog::open(Config::default()).await?;
/// let offset = log.append(Bytes::from("created")).await?;
///
/// let mut iter = log.read_from(offset).await?;
/// while let Some(event) = iter.next().await? {
///     println!("offset={}: {:?}", event.offset, event.payload);
/// }
/// ```
pub struct EventLog {
    storage: EventLogStorage,
    clock: Arc<dyn Clock>,
    /// Next offset to assign; the lock serializes appends.
    next_offset: Mutex<Offset>,
    head_tx: watch::Sender<Offset>,
    reader: EventLogReader,
    owns_storage: bool,
}

impl EventLog {
    /// Opens or creates a log with the given configuration.
    ///
    /// The storage backend is created from `config.storage` and is closed
    /// together with the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be initialized or the
    /// persisted head cannot be read.
    pub async fn open(config: Config) -> Result<Self> {
        let storage = create_storage(&config.storage)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        let mut log = Self::with_storage(storage, config.tailing).await?;
        log.owns_storage = true;
        Ok(log)
    }

    /// Opens a log on an existing storage instance.
    ///
    /// The storage may be shared with other record types as long as their
    /// keys do not collide with the log's. It is not closed by
    /// [`close`](EventLog::close).
    pub async fn with_storage(storage: Arc<dyn Storage>, tailing: TailConfig) -> Result<Self> {
        tailing.validate()?;
        let storage = EventLogStorage::new(storage);
        let storage_read = storage.as_read();
        let head = storage_read.get_head().await?.unwrap_or(0);
        let (head_tx, head_rx) = watch::channel(head);
        let reader = EventLogReader::new(storage_read, head_rx, CancellationToken::new(), tailing);

        tracing::info!(head, "Opened event log");
        Ok(Self {
            storage,
            clock: Arc::new(SystemClock),
            next_offset: Mutex::new(head),
            head_tx,
            reader,
            owns_storage: false,
        })
    }

    /// Replaces the clock used to timestamp appended events.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Appends one event and returns its offset.
    ///
    /// Returns once the event is durable. Waiting cursors are woken after
    /// the write completes, never before.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the write fails, in which case the head
    /// is not advanced and the offset is reused by the next append. Returns
    /// [`Error::Closed`] after [`close`](EventLog::close).
    pub async fn append(&self, payload: Bytes) -> Result<Offset> {
        let offsets = self.append_batch(vec![payload]).await?;
        Ok(offsets.start)
    }

    /// Appends several events atomically with consecutive offsets.
    ///
    /// Returns the range of offsets assigned. An empty batch writes nothing
    /// and returns an empty range at the current head.
    pub async fn append_batch(&self, payloads: Vec<Bytes>) -> Result<Range<Offset>> {
        self.append_events(payloads, Vec::new()).await
    }

    /// Appends one event together with `extra` storage operations.
    ///
    /// The operations, the event and the new head are written in a single
    /// durable batch: either all of them are committed or none is. Cursors
    /// are woken only after the batch is durable, so a reader woken by the
    /// event can already see the records written alongside it.
    ///
    /// `extra` must not touch the log's own keys.
    pub async fn append_with(&self, payload: Bytes, extra: Vec<RecordOp>) -> Result<Offset> {
        let offsets = self.append_events(vec![payload], extra).await?;
        Ok(offsets.start)
    }

    async fn append_events(
        &self,
        payloads: Vec<Bytes>,
        extra: Vec<RecordOp>,
    ) -> Result<Range<Offset>> {
        let mut next_offset = self.next_offset.lock().await;
        if self.reader.cancel_token().is_cancelled() {
            return Err(Error::Closed);
        }

        let start = *next_offset;
        if payloads.is_empty() {
            return Ok(start..start);
        }

        let timestamp_ms = self.clock.now_millis();
        let events: Vec<Event> = payloads
            .into_iter()
            .enumerate()
            .map(|(i, payload)| Event {
                offset: start + i as u64,
                timestamp_ms,
                payload,
            })
            .collect();
        let end = start + events.len() as u64;

        if let Err(err) = self.storage.write_events(&events, end, extra).await {
            tracing::warn!(offset = start, error = %err, "Failed to append events");
            return Err(err);
        }

        *next_offset = end;
        self.head_tx.send_replace(end);
        Ok(start..end)
    }

    /// Returns a read-only view of this log.
    pub fn reader(&self) -> EventLogReader {
        self.reader.clone()
    }

    /// Returns `true` once [`close`](EventLog::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.reader.cancel_token().is_cancelled()
    }

    /// Closes the log.
    ///
    /// Every cursor created from this log or its readers stops waiting and
    /// ends, and later appends fail with [`Error::Closed`]. Waits for an
    /// in-flight append to finish first. Storage created by
    /// [`open`](EventLog::open) is closed as well.
    pub async fn close(&self) -> Result<()> {
        let _next_offset = self.next_offset.lock().await;
        if self.reader.cancel_token().is_cancelled() {
            return Ok(());
        }
        self.reader.cancel_token().cancel();
        tracing::info!(head = self.head(), "Closed event log");
        if self.owns_storage {
            self.storage.close().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LogRead for EventLog {
    fn head(&self) -> Offset {
        *self.head_tx.borrow()
    }

    async fn count(&self) -> Result<u64> {
        self.reader.count().await
    }

    async fn read_range(&self, range: impl RangeBounds<Offset> + Send) -> Result<EventIterator> {
        self.reader.read_range(range).await
    }

    fn tail_from(&self, offset: Offset) -> TailingCursor {
        self.reader.tail_from(offset)
    }
}

//! Live tailing of the log.
//!
//! A [`TailingCursor`] turns the bounded range reads of the log into an
//! unbounded sequence. It reads committed events in batches and, once caught
//! up, suspends on the log's head watch channel instead of polling storage.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::model::{Event, Offset};
use crate::storage::EventLogStorageRead;

/// A cursor that follows the log from a starting offset.
///
/// Created by [`LogRead::tail`](crate::LogRead::tail) or
/// [`LogRead::tail_from`](crate::LogRead::tail_from). Each call to
/// [`next`](TailingCursor::next) returns the next event in offset order,
/// waiting for an append when the cursor has caught up with the head.
///
/// The sequence ends (`Ok(None)`) only when the cursor is cancelled or the
/// log is closed or dropped. A failed read is returned as an error without
/// moving the cursor, so calling `next` again retries from the same offset.
pub struct TailingCursor {
    storage: EventLogStorageRead,
    head_rx: watch::Receiver<Offset>,
    cancel: CancellationToken,
    read_batch_size: u64,
    /// Offset of the first event not yet read from storage.
    read_offset: Offset,
    /// Events read from storage but not yet returned.
    pending: VecDeque<Arc<Event>>,
}

impl TailingCursor {
    pub(crate) fn new(
        storage: EventLogStorageRead,
        head_rx: watch::Receiver<Offset>,
        cancel: CancellationToken,
        read_batch_size: usize,
        offset: Offset,
    ) -> Self {
        Self {
            storage,
            head_rx,
            cancel,
            read_batch_size: read_batch_size.max(1) as u64,
            read_offset: offset,
            pending: VecDeque::new(),
        }
    }

    /// Returns the offset of the next event this cursor will emit.
    pub fn position(&self) -> Offset {
        self.read_offset - self.pending.len() as u64
    }

    /// Stops the cursor. Pending and future calls to `next` return `None`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns the next event, waiting for one to be appended if necessary.
    pub async fn next(&mut self) -> Result<Option<Arc<Event>>> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(None);
            }
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            let head = *self.head_rx.borrow_and_update();
            if head > self.read_offset {
                self.fill(head).await?;
                continue;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(None),
                changed = self.head_rx.changed() => {
                    if changed.is_err() {
                        // the log was dropped; nothing more will be committed
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Reads the next batch of committed events below `head`.
    async fn fill(&mut self, head: Offset) -> Result<()> {
        let end = head.min(self.read_offset.saturating_add(self.read_batch_size));
        let events = self
            .storage
            .read_contiguous(self.read_offset..end)
            .await?;
        self.read_offset = end;
        self.pending.extend(events.into_iter().map(Arc::new));
        Ok(())
    }

    /// Adapts the cursor into a stream of events.
    ///
    /// The stream ends when the cursor would return `None`. Read errors are
    /// yielded as items and the stream keeps going, retrying from the same
    /// offset on the next poll.
    pub fn into_stream(self) -> impl Stream<Item = Result<Arc<Event>>> {
        futures::stream::unfold(self, |mut cursor| async move {
            match cursor.next().await {
                Ok(Some(event)) => Some((Ok(event), cursor)),
                Ok(None) => None,
                Err(err) => Some((Err(err), cursor)),
            }
        })
    }
}

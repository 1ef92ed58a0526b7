//! Per-subscriber queues and the [`Subscription`] handle.
//!
//! Each subscription owns a bounded queue fed by the broadcaster's dispatch
//! loop. Pushing never blocks the dispatcher: when a queue is full its oldest
//! event is dropped and counted, and the subscriber is told how many events
//! it missed through [`Delivery::Lagged`] before it sees anything newer.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use futures::Stream;
use tokio::sync::Notify;

use crate::broadcast::Shared;
use crate::model::{Event, Offset};

/// Identifier of a subscription, unique within one broadcaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An item received from a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The next event in offset order.
    Event(Arc<Event>),
    /// The subscriber fell behind and `missed` events were dropped from its
    /// queue. Events received afterwards are the newest ones still buffered.
    Lagged { missed: u64 },
}

/// Error returned by [`Subscription::try_recv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TryRecvError {
    /// Nothing is buffered right now.
    #[error("subscription queue is empty")]
    Empty,
    /// The subscription was detached or its broadcaster shut down.
    #[error("subscription is closed")]
    Closed,
}

struct QueueState {
    events: VecDeque<Arc<Event>>,
    missed: u64,
    /// Set while an overflow episode has not been reported to the subscriber.
    lagging: bool,
    closed: bool,
}

/// Bounded single-consumer queue of one subscriber.
pub(crate) struct SubscriberQueue {
    id: SubscriptionId,
    join_offset: Offset,
    capacity: usize,
    state: Mutex<QueueState>,
    notify: Notify,
}

impl SubscriberQueue {
    pub(crate) fn new(id: SubscriptionId, join_offset: Offset, capacity: usize) -> Self {
        Self {
            id,
            join_offset,
            capacity,
            state: Mutex::new(QueueState {
                events: VecDeque::new(),
                missed: 0,
                lagging: false,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    pub(crate) fn id(&self) -> SubscriptionId {
        self.id
    }

    pub(crate) fn join_offset(&self) -> Offset {
        self.join_offset
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        // the state stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueues an event, evicting the oldest one when the queue is full.
    pub(crate) fn push(&self, event: Arc<Event>) {
        {
            let mut state = self.state();
            if state.closed {
                return;
            }
            if state.events.len() >= self.capacity {
                state.events.pop_front();
                state.missed += 1;
                if !state.lagging {
                    state.lagging = true;
                    tracing::warn!(
                        subscription = %self.id,
                        capacity = self.capacity,
                        offset = event.offset,
                        "Subscriber queue full, dropping oldest events"
                    );
                }
            }
            state.events.push_back(event);
        }
        self.notify.notify_one();
    }

    /// Closes the queue and discards anything still buffered.
    pub(crate) fn close(&self) {
        {
            let mut state = self.state();
            if state.closed {
                return;
            }
            state.closed = true;
            state.events.clear();
        }
        self.notify.notify_one();
    }

    fn try_pop(&self) -> Result<Delivery, TryRecvError> {
        let mut state = self.state();
        if state.closed {
            return Err(TryRecvError::Closed);
        }
        if state.missed > 0 {
            let missed = std::mem::take(&mut state.missed);
            state.lagging = false;
            return Ok(Delivery::Lagged { missed });
        }
        match state.events.pop_front() {
            Some(event) => Ok(Delivery::Event(event)),
            None => Err(TryRecvError::Empty),
        }
    }

    async fn pop(&self) -> Option<Delivery> {
        loop {
            match self.try_pop() {
                Ok(delivery) => return Some(delivery),
                Err(TryRecvError::Closed) => return None,
                // a push between try_pop and here leaves a stored permit
                Err(TryRecvError::Empty) => self.notify.notified().await,
            }
        }
    }
}

/// A subscriber's attachment to a [`Broadcaster`](crate::Broadcaster).
///
/// Receives every event committed after [`attach`](crate::Broadcaster::attach)
/// returned, in offset order, unless it falls more than the configured
/// capacity behind, in which case it is told through [`Delivery::Lagged`].
///
/// Dropping the subscription detaches it: it is removed from the broadcaster
/// and its buffered events are discarded immediately.
pub struct Subscription {
    queue: Arc<SubscriberQueue>,
    registry: Weak<Shared>,
}

impl Subscription {
    pub(crate) fn new(queue: Arc<SubscriberQueue>, registry: Weak<Shared>) -> Self {
        Self { queue, registry }
    }

    /// Identifier of this subscription, unique within its broadcaster.
    pub fn id(&self) -> SubscriptionId {
        self.queue.id()
    }

    /// The head of the log when this subscription attached. Every delivered
    /// event has an offset at or above it.
    pub fn join_offset(&self) -> Offset {
        self.queue.join_offset()
    }

    /// Waits for the next delivery.
    ///
    /// Returns `None` once the subscription is detached or the broadcaster
    /// has shut down.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.queue.pop().await
    }

    /// Returns the next delivery if one is buffered, without waiting.
    pub fn try_recv(&mut self) -> Result<Delivery, TryRecvError> {
        self.queue.try_pop()
    }

    /// Detaches from the broadcaster, discarding buffered events.
    pub fn detach(self) {}

    /// Adapts the subscription into a stream of deliveries.
    ///
    /// Dropping the stream detaches the subscription.
    pub fn into_stream(self) -> impl Stream<Item = Delivery> {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .recv()
                .await
                .map(|delivery| (delivery, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.registry.upgrade() {
            shared.remove(self.queue.id());
        }
        self.queue.close();
        tracing::debug!(subscription = %self.queue.id(), "Subscription detached");
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.queue.id())
            .field("join_offset", &self.queue.join_offset())
            .finish()
    }
}

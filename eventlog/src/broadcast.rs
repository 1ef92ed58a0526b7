//! Fan-out of the log to many subscribers.
//!
//! A [`Broadcaster`] owns exactly one [`TailingCursor`] and one dispatch
//! task, however many subscribers are attached. The dispatch task pushes each
//! event into every subscriber's bounded queue; pushing never waits on a
//! subscriber, so a slow or idle subscriber cannot hold up the others or the
//! writers appending to the log.
//!
//! # Join semantics
//!
//! [`Broadcaster::attach`] reads the log head while holding the registry
//! lock and records it as the subscription's join offset. The dispatch task
//! pushes while holding the same lock and skips events below a queue's join
//! offset, so a subscription receives exactly the events committed after it
//! attached, even when the dispatcher is behind the log.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::BroadcastConfig;
use crate::cursor::TailingCursor;
use crate::error::Result;
use crate::log::EventLog;
use crate::model::{Event, Offset};
use crate::subscription::{SubscriberQueue, Subscription, SubscriptionId};

/// State shared between the broadcaster, its dispatch task and subscriptions.
pub(crate) struct Shared {
    registry: Mutex<HashMap<SubscriptionId, Arc<SubscriberQueue>>>,
    head_rx: watch::Receiver<Offset>,
    next_id: AtomicU64,
    position: AtomicU64,
    capacity: usize,
    cancel: CancellationToken,
}

impl Shared {
    fn registry(&self) -> MutexGuard<'_, HashMap<SubscriptionId, Arc<SubscriberQueue>>> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn remove(&self, id: SubscriptionId) {
        self.registry().remove(&id);
    }

    fn dispatch(&self, event: Arc<Event>) {
        let registry = self.registry();
        for queue in registry.values() {
            if event.offset >= queue.join_offset() {
                queue.push(Arc::clone(&event));
            }
        }
    }

    fn close_all(&self) {
        let queues: Vec<_> = self.registry().drain().map(|(_, queue)| queue).collect();
        for queue in queues {
            queue.close();
        }
    }
}

/// Delivers every event appended to a log to any number of subscribers.
///
/// # Example
///
/// ```ignore
/// use eventlog::{BroadcastConfig, Broadcaster, Delivery};
///
/// let broadcaster = Broadcaster::start(&log, BroadcastConfig::default())?;
/// let mut subscription = broadcaster.attach();
/// while let Some(delivery) = subscription.recv().await {
///     match delivery {
///         Delivery::Event(event) => handle(&event),
///         Delivery::Lagged { missed } => warn_client(missed),
///     }
/// }
/// ```
pub struct Broadcaster {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Broadcaster {
    /// Starts broadcasting events appended to `log` from now on.
    ///
    /// Spawns the dispatch task on the current Tokio runtime. The broadcaster
    /// stops when [`shutdown`](Broadcaster::shutdown) is called, when it is
    /// dropped, or when the log is closed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`](crate::Error::InvalidInput) if the
    /// configuration is invalid.
    pub fn start(log: &EventLog, config: BroadcastConfig) -> Result<Self> {
        config.validate()?;
        let reader = log.reader();
        let cancel = reader.cancel_token().child_token();
        let head_rx = reader.head_receiver();
        let cursor = reader.tail_with_token(*head_rx.borrow(), cancel.clone());

        let shared = Arc::new(Shared {
            registry: Mutex::new(HashMap::new()),
            head_rx,
            next_id: AtomicU64::new(0),
            position: AtomicU64::new(cursor.position()),
            capacity: config.subscriber_capacity,
            cancel,
        });

        tracing::info!(
            position = cursor.position(),
            subscriber_capacity = config.subscriber_capacity,
            "Started broadcaster"
        );
        let task = tokio::spawn(run_dispatch(
            cursor,
            Arc::clone(&shared),
            config.retry_backoff,
        ));

        Ok(Self {
            shared,
            task: Mutex::new(Some(task)),
        })
    }

    /// Attaches a new subscriber.
    ///
    /// The subscription receives every event committed after this call, in
    /// offset order. Attaching to a broadcaster that has shut down returns a
    /// subscription that is already closed.
    pub fn attach(&self) -> Subscription {
        let id = SubscriptionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let mut registry = self.shared.registry();
        let join_offset = *self.shared.head_rx.borrow();
        let queue = Arc::new(SubscriberQueue::new(id, join_offset, self.shared.capacity));
        if self.shared.cancel.is_cancelled() {
            queue.close();
        } else {
            registry.insert(id, Arc::clone(&queue));
        }
        drop(registry);

        tracing::debug!(subscription = %id, join_offset, "Subscription attached");
        Subscription::new(queue, Arc::downgrade(&self.shared))
    }

    /// Detaches a subscriber. Equivalent to dropping the subscription.
    pub fn detach(&self, subscription: Subscription) {
        drop(subscription);
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.registry().len()
    }

    /// Offset of the next event the dispatch task will deliver.
    pub fn position(&self) -> Offset {
        self.shared.position.load(Ordering::Acquire)
    }

    /// Stops the dispatch task and closes every subscription.
    pub async fn shutdown(&self) {
        self.shared.cancel.cancel();
        let task = self
            .task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                tracing::error!(error = %err, "Broadcast dispatch task failed");
            }
        }
        self.shared.close_all();
    }
}

impl Drop for Broadcaster {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

async fn run_dispatch(mut cursor: TailingCursor, shared: Arc<Shared>, retry_backoff: Duration) {
    loop {
        match cursor.next().await {
            Ok(Some(event)) => {
                shared.dispatch(event);
                shared.position.store(cursor.position(), Ordering::Release);
            }
            Ok(None) => break,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    position = cursor.position(),
                    "Failed to read events for broadcast, retrying"
                );
                tokio::select! {
                    _ = shared.cancel.cancelled() => break,
                    _ = tokio::time::sleep(retry_backoff) => {}
                }
            }
        }
    }
    shared.close_all();
    tracing::info!(position = cursor.position(), "Stopped broadcaster");
}

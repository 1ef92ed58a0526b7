//! Notification sessions: one subscription bound to one SSE response.

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::Event as SseEvent;
use eventlog::{Delivery, Event, Subscription};
use futures::Stream;

use super::metrics::Metrics;

/// SSE event name of article notifications.
pub const ARTICLE_EVENT: &str = "article";

/// SSE event name of the lag notice sent after dropped events.
pub const LAGGED_EVENT: &str = "lagged";

/// Streams one client's subscription as server-sent events.
///
/// Each [`Delivery::Event`] becomes an `article` message whose `id` is the
/// event offset and whose `data` is the [`ArticleEvent`](crate::ArticleEvent)
/// JSON. A [`Delivery::Lagged`] becomes a `lagged` message carrying the
/// number of missed events.
///
/// Dropping the session (the client disconnected and axum dropped the
/// response body) drops the subscription, which detaches it from the
/// broadcaster.
pub struct NotificationSession {
    subscription: Subscription,
    metrics: Arc<Metrics>,
}

impl NotificationSession {
    pub fn new(subscription: Subscription, metrics: Arc<Metrics>) -> Self {
        metrics.notification_sessions_active.inc();
        tracing::debug!(
            subscription = %subscription.id(),
            join_offset = subscription.join_offset(),
            "Notification session opened"
        );
        Self {
            subscription,
            metrics,
        }
    }

    /// Waits for the next message. Returns `None` when the subscription ends.
    pub async fn next_message(&mut self) -> Option<SseEvent> {
        match self.subscription.recv().await? {
            Delivery::Event(event) => {
                self.metrics.notification_events_sent_total.inc();
                Some(article_message(&event))
            }
            Delivery::Lagged { missed } => {
                self.metrics.notification_events_missed_total.inc_by(missed);
                tracing::warn!(
                    subscription = %self.subscription.id(),
                    missed,
                    "Notification stream lagged"
                );
                Some(lagged_message(missed))
            }
        }
    }

    /// Adapts the session into the stream an [`axum::response::Sse`] body
    /// expects.
    pub fn into_stream(self) -> impl Stream<Item = Result<SseEvent, Infallible>> {
        futures::stream::unfold(self, |mut session| async move {
            session
                .next_message()
                .await
                .map(|message| (Ok(message), session))
        })
    }
}

impl Drop for NotificationSession {
    fn drop(&mut self) {
        self.metrics.notification_sessions_active.dec();
        tracing::debug!(
            subscription = %self.subscription.id(),
            "Notification session closed"
        );
    }
}

fn article_message(event: &Event) -> SseEvent {
    SseEvent::default()
        .event(ARTICLE_EVENT)
        .id(event.offset.to_string())
        .data(String::from_utf8_lossy(&event.payload))
}

fn lagged_message(missed: u64) -> SseEvent {
    SseEvent::default()
        .event(LAGGED_EVENT)
        .data(serde_json::json!({ "missed": missed }).to_string())
}

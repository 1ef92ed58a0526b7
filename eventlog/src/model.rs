//! Core data types for the event log.

use bytes::Bytes;

/// Position of an event in the log.
///
/// An event's offset equals the number of events committed before it, so
/// offsets start at 0 and are contiguous. The log's *head* is the offset the
/// next append will receive.
pub type Offset = u64;

/// An immutable event read from the log.
///
/// Events are produced exactly once per append, in commit order. Cursors and
/// subscriptions hand them out as `Arc<Event>` so that fan-out shares a single
/// allocation between all subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Position assigned at append time.
    pub offset: Offset,

    /// Wall-clock time of the append (ms since epoch).
    pub timestamp_ms: i64,

    /// The opaque event payload.
    pub payload: Bytes,
}

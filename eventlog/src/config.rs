//! Configuration for the event log and the broadcaster.

use std::time::Duration;

use common::StorageConfig;

use crate::error::{Error, Result};

/// Configuration for opening an [`EventLog`](crate::EventLog).
///
/// # Example
///
/// ```ignore
/// use eventlog::{Config, TailConfig};
/// use common::StorageConfig;
///
/// let config = Config {
///     storage: StorageConfig::InMemory,
///     tailing: TailConfig::default(),
/// };
/// let log = EventLog::open(config).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Storage backend configuration.
    pub storage: StorageConfig,

    /// Settings applied to every cursor created by the log.
    pub tailing: TailConfig,
}

/// Settings for [`TailingCursor`](crate::TailingCursor)s.
#[derive(Debug, Clone)]
pub struct TailConfig {
    /// Maximum number of events a cursor reads from storage in one scan.
    ///
    /// A cursor that has fallen far behind catches up in batches of this
    /// size, keeping its buffer bounded.
    pub read_batch_size: usize,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            read_batch_size: 256,
        }
    }
}

impl TailConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.read_batch_size == 0 {
            return Err(Error::InvalidInput(
                "read_batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a [`Broadcaster`](crate::Broadcaster).
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    /// Maximum number of undelivered events buffered per subscription.
    ///
    /// When a subscription's queue is full, its oldest buffered event is
    /// dropped and the subscriber receives a
    /// [`Delivery::Lagged`](crate::Delivery::Lagged) notice.
    pub subscriber_capacity: usize,

    /// Delay before the dispatch loop retries after a failed read.
    pub retry_backoff: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: 1024,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

impl BroadcastConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.subscriber_capacity == 0 {
            return Err(Error::InvalidInput(
                "subscriber_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

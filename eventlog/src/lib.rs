//! Event Log - an append-only event log with live tailing and fan-out.
//!
//! The log stores a single, strictly ordered sequence of events on top of the
//! shared [`common::Storage`] abstraction. Every event receives the next
//! [`Offset`] at append time, and the event record and the new head are
//! written in one atomic batch.
//!
//! # Key Concepts
//!
//! - **EventLog**: The main entry point providing both append and read
//!   operations.
//! - **EventLogReader**: A cloneable read-only view of the log.
//! - **TailingCursor**: Follows the log from an offset, suspending on the
//!   head watch channel until new events are committed.
//! - **Broadcaster**: Owns one tailing cursor and fans every event out to any
//!   number of [`Subscription`]s, each with its own bounded queue.
//!
//! # Example
//!
//! ```ignore
//! use eventlog::{BroadcastConfig, Broadcaster, Config, Delivery, EventLog};
//! use bytes::Bytes;
//!
//! let log = EventLog::open(Config::default()).await?;
//! let broadcaster = Broadcaster::start(&log, BroadcastConfig::default())?;
//!
//! let mut subscription = broadcaster.attach();
//! log.append(Bytes::from("foo")).await?;
//!
//! if let Some(Delivery::Event(event)) = subscription.recv().await {
//!     println!("offset={} payload={:?}", event.offset, event.payload);
//! }
//! ```

mod broadcast;
mod config;
mod cursor;
mod error;
mod log;
mod model;
mod range;
mod reader;
mod serde;
mod storage;
mod subscription;

pub use broadcast::Broadcaster;
pub use config::{BroadcastConfig, Config, TailConfig};
pub use cursor::TailingCursor;
pub use error::{Error, Result};
pub use log::EventLog;
pub use model::{Event, Offset};
pub use reader::{EventIterator, EventLogReader, LogRead};
pub use subscription::{Delivery, Subscription, SubscriptionId, TryRecvError};

//! Storage building blocks shared by the bulletin crates.
//!
//! Every crate in the workspace persists through the [`Storage`] trait so the
//! event log and the content store can share one backend instance (SlateDB in
//! production, an ordered in-memory map in tests and development).

pub mod clock;
pub mod serde;
pub mod storage;

pub use clock::{Clock, MockClock, SystemClock};
pub use storage::config::StorageConfig;
pub use storage::{
    BytesRange, Record, RecordOp, Storage, StorageError, StorageIterator, StorageRead,
    StorageResult, WriteOptions,
};

//! Durable storage for normalized webhook records.
//!
//! One append-mostly `webhooks` table. Records carrying a transaction id are
//! upserted by `(platform, transaction_id)`; everything else is inserted.
//! The Postgres unique constraint on that pair is the only concurrency
//! mechanism: `INSERT ... ON CONFLICT` is atomic per statement.

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod sanitize;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryRecordStore;
pub use sanitize::storable;
pub use store::{PgRecordStore, RecordStore};
pub use types::{EventFilter, StoredEvent, StoredId};

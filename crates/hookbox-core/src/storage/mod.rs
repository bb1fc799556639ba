//! Storage engine for captured webhook records.
//!
//! The contract is append-and-query: `insert` is the only mutation, and a
//! record never changes after it is written. The trait is object-safe so
//! the HTTP layer can hold `Arc<dyn RecordStore>` and run unchanged against
//! the in-memory backend or Postgres.

use std::{future::Future, pin::Pin};

use crate::{
    error::Result,
    models::{ListFilter, NewRecord, Page, RecordId, WebhookRecord},
};

pub mod memory;
pub mod postgres;

/// Boxed future alias keeping the trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Append-and-query contract for captured deliveries.
///
/// Implementations must make `insert` atomic with respect to concurrent
/// `list` calls (a reader sees a record fully or not at all) and must
/// assign `created_at` from a monotonically non-decreasing clock per store
/// instance.
pub trait RecordStore: Send + Sync + 'static {
    /// Assigns identity and timestamp, persists, and returns the
    /// materialized record.
    fn insert(&self, record: NewRecord) -> BoxFuture<'_, Result<WebhookRecord>>;

    /// Lists records in `(created_at, id)` descending order, applying the
    /// filter and resuming from its cursor when present.
    fn list(&self, filter: ListFilter) -> BoxFuture<'_, Result<Page>>;

    /// Fetches a single record by id.
    fn find_by_id(&self, id: RecordId) -> BoxFuture<'_, Result<Option<WebhookRecord>>>;

    /// Total number of stored records.
    fn count(&self) -> BoxFuture<'_, Result<u64>>;

    /// Verifies the backing medium can serve reads.
    fn ping(&self) -> BoxFuture<'_, Result<()>>;
}

//! In-memory append-only record store.
//!
//! The default backend. Everything lives behind a single `RwLock`: the
//! record vector and the `created_at` watermark share one lock, so an
//! insert is atomic with respect to any list and timestamp assignment
//! stays strictly increasing even under concurrent inserts.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::{BoxFuture, RecordStore};
use crate::{
    error::Result,
    models::{ListFilter, NewRecord, Page, RecordId, WebhookRecord},
};

/// Append-only store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: Vec<WebhookRecord>,
    last_created_at: Option<DateTime<Utc>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    /// Next record timestamp: wall clock, nudged forward if the clock
    /// stalled or stepped backwards since the previous insert.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_created_at {
            if now <= last {
                now = last + Duration::nanoseconds(1);
            }
        }
        self.last_created_at = Some(now);
        now
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, record: NewRecord) -> BoxFuture<'_, Result<WebhookRecord>> {
        Box::pin(async move {
            let mut inner = self.inner.write().await;
            let created_at = inner.next_timestamp();
            let record = record.into_record(RecordId::new(), created_at);
            inner.records.push(record.clone());
            Ok(record)
        })
    }

    fn list(&self, filter: ListFilter) -> BoxFuture<'_, Result<Page>> {
        Box::pin(async move {
            filter.validate()?;
            let inner = self.inner.read().await;

            let mut matched: Vec<&WebhookRecord> =
                inner.records.iter().filter(|r| filter.matches(r)).collect();
            matched.sort_by(|a, b| (b.created_at, b.id.0).cmp(&(a.created_at, a.id.0)));

            let start = match &filter.cursor {
                Some(cursor) => matched
                    .iter()
                    .position(|r| (r.created_at, r.id.0) < (cursor.created_at, cursor.id.0))
                    .unwrap_or(matched.len()),
                None => 0,
            };

            let records: Vec<WebhookRecord> =
                matched[start..].iter().take(filter.limit).map(|r| (*r).clone()).collect();
            let has_more = matched.len() - start > records.len();
            let next_cursor = if has_more { records.last().map(WebhookRecord::cursor) } else { None };

            Ok(Page { records, next_cursor })
        })
    }

    fn find_by_id(&self, id: RecordId) -> BoxFuture<'_, Result<Option<WebhookRecord>>> {
        Box::pin(async move {
            let inner = self.inner.read().await;
            Ok(inner.records.iter().find(|r| r.id == id).cloned())
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move {
            let inner = self.inner.read().await;
            Ok(inner.records.len() as u64)
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move { Ok(()) })
    }
}

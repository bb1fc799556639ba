//! Domain models for captured webhook deliveries.

use std::{collections::HashMap, fmt};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    cursor::Cursor,
    error::{CoreError, Result},
};

/// Default page size when the caller does not specify one.
pub const DEFAULT_LIMIT: usize = 20;

/// Largest page size a single list call may request.
pub const MAX_LIMIT: usize = 100;

/// Strongly-typed identifier for a captured record.
///
/// Assigned by the storage engine at insert time and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Creates a new random record ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A captured webhook delivery.
///
/// Records are immutable once created: there is no update path anywhere in
/// the storage contract. `content_length` is always derived from `body`,
/// never taken from a caller-supplied header.
#[derive(Debug, Clone)]
pub struct WebhookRecord {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// HTTP method of the delivery, as received (e.g. "POST").
    pub method: String,
    /// Request path, query string excluded.
    pub pathname: String,
    /// Originating address: forwarded-for entry or transport peer.
    pub source_ip: String,
    /// Status code the capture endpoint responded with.
    pub status_code: u16,
    /// Content-Type header value, if the sender supplied one.
    pub content_type: Option<String>,
    /// Exact byte length of `body`.
    pub content_length: u64,
    /// Decoded query string parameters, if any were present.
    pub query_params: Option<HashMap<String, String>>,
    /// Request headers, names lowercased by the HTTP layer.
    pub headers: HashMap<String, String>,
    /// Raw request body. Opaque: never parsed or re-encoded.
    pub body: Bytes,
    /// Store-assigned timestamp, monotonically non-decreasing per store.
    pub created_at: DateTime<Utc>,
}

impl WebhookRecord {
    /// Pagination key pinning this record's position in the sort order.
    pub fn cursor(&self) -> Cursor {
        Cursor { created_at: self.created_at, id: self.id }
    }
}

/// Input for an insert: everything the store does not assign itself.
#[derive(Debug, Clone)]
pub struct NewRecord {
    /// HTTP method of the delivery.
    pub method: String,
    /// Request path, query string excluded.
    pub pathname: String,
    /// Originating address.
    pub source_ip: String,
    /// Status code the capture endpoint responded with.
    pub status_code: u16,
    /// Content-Type header value, if present.
    pub content_type: Option<String>,
    /// Decoded query string parameters, if any.
    pub query_params: Option<HashMap<String, String>>,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Raw request body.
    pub body: Bytes,
}

impl NewRecord {
    /// Materializes the stored record with store-assigned identity and
    /// timestamp, deriving `content_length` from the actual body.
    pub(crate) fn into_record(self, id: RecordId, created_at: DateTime<Utc>) -> WebhookRecord {
        let content_length = self.body.len() as u64;
        WebhookRecord {
            id,
            method: self.method,
            pathname: self.pathname,
            source_ip: self.source_ip,
            status_code: self.status_code,
            content_type: self.content_type,
            content_length,
            query_params: self.query_params,
            headers: self.headers,
            body: self.body,
            created_at,
        }
    }
}

/// Filter and paging parameters for a list call.
///
/// Time bounds are half-open: `created_after` matches records strictly
/// newer, `created_before` strictly older.
#[derive(Debug, Clone)]
pub struct ListFilter {
    /// Page size, valid in `1..=MAX_LIMIT`.
    pub limit: usize,
    /// Exact method match.
    pub method: Option<String>,
    /// Exact pathname match.
    pub pathname: Option<String>,
    /// Pathname prefix match.
    pub pathname_prefix: Option<String>,
    /// Inclusive lower bound on `status_code`.
    pub status_min: Option<u16>,
    /// Inclusive upper bound on `status_code`.
    pub status_max: Option<u16>,
    /// Records created strictly after this instant.
    pub created_after: Option<DateTime<Utc>>,
    /// Records created strictly before this instant.
    pub created_before: Option<DateTime<Utc>>,
    /// Resume position from a previous page.
    pub cursor: Option<Cursor>,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            method: None,
            pathname: None,
            pathname_prefix: None,
            status_min: None,
            status_max: None,
            created_after: None,
            created_before: None,
            cursor: None,
        }
    }
}

impl ListFilter {
    /// Rejects out-of-domain parameters before they reach a backend.
    pub fn validate(&self) -> Result<()> {
        if self.limit < 1 || self.limit > MAX_LIMIT {
            return Err(CoreError::InvalidFilter(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {}",
                self.limit
            )));
        }
        Ok(())
    }

    /// Whether a record passes the non-paging filter clauses.
    pub fn matches(&self, record: &WebhookRecord) -> bool {
        if let Some(method) = &self.method {
            if record.method != *method {
                return false;
            }
        }
        if let Some(pathname) = &self.pathname {
            if record.pathname != *pathname {
                return false;
            }
        }
        if let Some(prefix) = &self.pathname_prefix {
            if !record.pathname.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(min) = self.status_min {
            if record.status_code < min {
                return false;
            }
        }
        if let Some(max) = self.status_max {
            if record.status_code > max {
                return false;
            }
        }
        if let Some(after) = self.created_after {
            if record.created_at <= after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if record.created_at >= before {
                return false;
            }
        }
        true
    }
}

/// One page of list results.
#[derive(Debug)]
pub struct Page {
    /// Records in `(created_at, id)` descending order.
    pub records: Vec<WebhookRecord>,
    /// Present iff more records remain past this page.
    pub next_cursor: Option<Cursor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(method: &str, pathname: &str, status: u16) -> WebhookRecord {
        NewRecord {
            method: method.to_string(),
            pathname: pathname.to_string(),
            source_ip: "203.0.113.7".to_string(),
            status_code: status,
            content_type: None,
            query_params: None,
            headers: HashMap::new(),
            body: Bytes::from_static(b"{}"),
        }
        .into_record(RecordId::new(), Utc::now())
    }

    #[test]
    fn content_length_is_derived_from_body() {
        let record = NewRecord {
            method: "POST".to_string(),
            pathname: "/webhooks/stripe".to_string(),
            source_ip: "203.0.113.7".to_string(),
            status_code: 200,
            content_type: Some("application/json".to_string()),
            query_params: None,
            headers: HashMap::from([("content-length".to_string(), "9999".to_string())]),
            body: Bytes::from_static(b"hello"),
        }
        .into_record(RecordId::new(), Utc::now());

        assert_eq!(record.content_length, 5);
    }

    #[test]
    fn default_filter_uses_default_limit() {
        let filter = ListFilter::default();
        assert_eq!(filter.limit, DEFAULT_LIMIT);
        assert!(filter.validate().is_ok());
    }

    #[test]
    fn limit_bounds_are_enforced() {
        let zero = ListFilter { limit: 0, ..ListFilter::default() };
        let over = ListFilter { limit: MAX_LIMIT + 1, ..ListFilter::default() };
        let max = ListFilter { limit: MAX_LIMIT, ..ListFilter::default() };

        assert!(matches!(zero.validate(), Err(CoreError::InvalidFilter(_))));
        assert!(matches!(over.validate(), Err(CoreError::InvalidFilter(_))));
        assert!(max.validate().is_ok());
    }

    #[test]
    fn filter_clauses_compose() {
        let filter = ListFilter {
            method: Some("POST".to_string()),
            pathname_prefix: Some("/webhooks".to_string()),
            status_min: Some(200),
            status_max: Some(299),
            ..ListFilter::default()
        };

        assert!(filter.matches(&record("POST", "/webhooks/stripe", 200)));
        assert!(!filter.matches(&record("GET", "/webhooks/stripe", 200)));
        assert!(!filter.matches(&record("POST", "/other", 200)));
        assert!(!filter.matches(&record("POST", "/webhooks/stripe", 500)));
    }

    #[test]
    fn record_id_displays_as_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(RecordId(uuid).to_string(), uuid.to_string());
    }
}

//! Query endpoint: validated listing and record detail views.

use std::collections::HashMap;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use hookbox_core::{
    models::{DEFAULT_LIMIT, MAX_LIMIT},
    Cursor, ListFilter, RecordId, WebhookRecord,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{error::ApiError, AppState};

/// Raw, string-typed list parameters.
///
/// Everything arrives as text and is validated here at the boundary, so a
/// bad value produces the `invalid_request` envelope and never reaches the
/// store.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    limit: Option<String>,
    method: Option<String>,
    pathname: Option<String>,
    pathname_prefix: Option<String>,
    status_min: Option<String>,
    status_max: Option<String>,
    created_after: Option<String>,
    created_before: Option<String>,
    cursor: Option<String>,
}

impl ListParams {
    fn into_filter(self) -> Result<ListFilter, ApiError> {
        let limit = match self.limit {
            None => DEFAULT_LIMIT,
            Some(raw) => {
                let value: i64 = raw
                    .parse()
                    .map_err(|_| invalid(format!("limit must be an integer, got {raw:?}")))?;
                if !(1..=MAX_LIMIT as i64).contains(&value) {
                    return Err(invalid(format!(
                        "limit must be between 1 and {MAX_LIMIT}, got {value}"
                    )));
                }
                value as usize
            },
        };

        let cursor = match self.cursor {
            None => None,
            Some(raw) => Some(Cursor::decode(&raw)?),
        };

        Ok(ListFilter {
            limit,
            method: self.method,
            pathname: self.pathname,
            pathname_prefix: self.pathname_prefix,
            status_min: parse_status(self.status_min, "status_min")?,
            status_max: parse_status(self.status_max, "status_max")?,
            created_after: parse_instant(self.created_after, "created_after")?,
            created_before: parse_instant(self.created_before, "created_before")?,
            cursor,
        })
    }
}

fn parse_status(raw: Option<String>, name: &str) -> Result<Option<u16>, ApiError> {
    raw.map(|raw| {
        raw.parse::<u16>()
            .map_err(|_| invalid(format!("{name} must be a status code, got {raw:?}")))
    })
    .transpose()
}

fn parse_instant(raw: Option<String>, name: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|instant| instant.with_timezone(&Utc))
            .map_err(|_| invalid(format!("{name} must be an RFC 3339 timestamp, got {raw:?}")))
    })
    .transpose()
}

fn invalid(message: String) -> ApiError {
    ApiError::InvalidRequest(message)
}

/// Lossless scalar projection of a record: every field except the payload
/// fields (`headers`, `query_params`, `body`).
#[derive(Debug, Serialize)]
pub struct RecordSummary {
    /// Record identifier.
    pub id: String,
    /// HTTP method of the delivery.
    pub method: String,
    /// Request path.
    pub pathname: String,
    /// Originating address.
    pub source_ip: String,
    /// Status code answered to the sender.
    pub status_code: u16,
    /// Content-Type of the delivery, if any.
    pub content_type: Option<String>,
    /// Exact body size in bytes.
    pub content_length: u64,
    /// Store-assigned timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&WebhookRecord> for RecordSummary {
    fn from(record: &WebhookRecord) -> Self {
        Self {
            id: record.id.to_string(),
            method: record.method.clone(),
            pathname: record.pathname.clone(),
            source_ip: record.source_ip.clone(),
            status_code: record.status_code,
            content_type: record.content_type.clone(),
            content_length: record.content_length,
            created_at: record.created_at,
        }
    }
}

/// Full record view, payload included.
#[derive(Debug, Serialize)]
pub struct RecordDetail {
    /// Scalar fields of the record.
    #[serde(flatten)]
    pub summary: RecordSummary,
    /// Decoded query string parameters, if any were present.
    pub query_params: Option<HashMap<String, String>>,
    /// Request headers as captured.
    pub headers: HashMap<String, String>,
    /// Body rendered as text; invalid UTF-8 is replaced, never dropped.
    pub body: String,
}

impl From<&WebhookRecord> for RecordDetail {
    fn from(record: &WebhookRecord) -> Self {
        Self {
            summary: RecordSummary::from(record),
            query_params: record.query_params.clone(),
            headers: record.headers.clone(),
            body: String::from_utf8_lossy(&record.body).into_owned(),
        }
    }
}

/// List response: ordered summaries plus pagination state.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    /// Record summaries, newest first.
    pub items: Vec<RecordSummary>,
    /// Token for the next page, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Lists captured records, newest first, with cursor pagination.
///
/// The `Query` extractor is taken as a `Result` so that input it cannot
/// deserialize (a repeated key, for instance) still answers with the
/// `invalid_request` envelope instead of a bare rejection.
#[instrument(name = "list_records", skip_all)]
pub async fn list_records(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(params) =
        params.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
    let filter = params.into_filter()?;
    let page = state.store.list(filter).await?;

    debug!(returned = page.records.len(), has_more = page.next_cursor.is_some(), "records listed");

    Ok(Json(ListResponse {
        items: page.records.iter().map(RecordSummary::from).collect(),
        next_cursor: page.next_cursor.map(|cursor| cursor.encode()),
    }))
}

/// Fetches one record in full, body and headers included.
#[instrument(name = "get_record", skip(state))]
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecordDetail>, ApiError> {
    let uuid: Uuid = id
        .parse()
        .map_err(|_| ApiError::InvalidRequest(format!("record id must be a UUID, got {id:?}")))?;

    let record = state
        .store
        .find_by_id(RecordId(uuid))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no record with id {uuid}")))?;

    Ok(Json(RecordDetail::from(&record)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<&str>) -> ListParams {
        ListParams { limit: limit.map(str::to_string), ..ListParams::default() }
    }

    #[test]
    fn missing_limit_defaults_to_twenty() {
        let filter = params(None).into_filter().unwrap();
        assert_eq!(filter.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn out_of_domain_limits_are_rejected() {
        for raw in ["0", "-1", "101", "abc", "1.5", ""] {
            let result = params(Some(raw)).into_filter();
            assert!(
                matches!(result, Err(ApiError::InvalidRequest(_))),
                "limit {raw:?} should be rejected"
            );
        }
        assert_eq!(params(Some("100")).into_filter().unwrap().limit, 100);
    }

    #[test]
    fn timestamps_parse_as_rfc3339() {
        let params = ListParams {
            created_after: Some("2026-08-01T12:00:00Z".to_string()),
            ..ListParams::default()
        };
        let filter = params.into_filter().unwrap();
        assert!(filter.created_after.is_some());

        let bad = ListParams {
            created_before: Some("yesterday".to_string()),
            ..ListParams::default()
        };
        assert!(bad.into_filter().is_err());
    }

    #[test]
    fn malformed_cursor_is_invalid_request() {
        let params = ListParams { cursor: Some("!!!".to_string()), ..ListParams::default() };
        assert!(matches!(params.into_filter(), Err(ApiError::InvalidRequest(_))));
    }
}

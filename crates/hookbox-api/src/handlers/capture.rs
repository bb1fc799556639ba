//! Capture endpoint: turns any inbound HTTP delivery into a stored record.
//!
//! The endpoint is deliberately permissive. Any method, any content type,
//! any body (including none) is structurally acceptable; the only
//! rejections are an oversized payload and a storage failure. Nothing
//! about the body is parsed or validated.

use std::{collections::HashMap, net::SocketAddr};

use axum::{
    extract::{rejection::BytesRejection, ConnectInfo, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    Json,
};
use bytes::Bytes;
use hookbox_core::NewRecord;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{error::ApiError, AppState};

/// Status recorded and returned for every accepted delivery. The stored
/// `status_code` always equals the value the sender saw.
const ACCEPTED_STATUS: StatusCode = StatusCode::OK;

/// Acknowledgment returned to the delivering party.
#[derive(Debug, Serialize)]
pub struct CaptureAck {
    /// Identifier of the stored record.
    pub id: String,
    /// Status code this delivery was answered and recorded with.
    pub status_code: u16,
}

/// Captures one inbound delivery.
///
/// The insert is awaited before the acknowledgment is produced: once the
/// sender sees 200, the record is durable in the configured backend. The
/// wait is bounded by the configured capture timeout.
#[instrument(
    name = "capture_delivery",
    skip_all,
    fields(method = %method, pathname = %uri.path())
)]
pub async fn capture_delivery(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<CaptureAck>), ApiError> {
    // The body limit is enforced while buffering; mapping the rejection
    // here keeps the 413 in the same envelope as every other error.
    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!(limit = state.max_body_bytes, "delivery exceeds body ceiling, nothing stored");
            return Err(ApiError::PayloadTooLarge { limit_bytes: state.max_body_bytes });
        },
        Err(rejection) => {
            return Err(ApiError::InvalidRequest(rejection.body_text()));
        },
    };

    let record = NewRecord {
        method: method.to_string(),
        pathname: uri.path().to_string(),
        source_ip: resolve_source_ip(&headers, peer),
        status_code: ACCEPTED_STATUS.as_u16(),
        content_type: header_value(&headers, "content-type"),
        query_params: uri.query().and_then(parse_query),
        headers: extract_headers(&headers),
        body,
    };

    let insert = state.store.insert(record);
    let stored = match tokio::time::timeout(state.capture_timeout, insert).await {
        Ok(result) => result?,
        Err(_) => {
            let timeout_ms = u64::try_from(state.capture_timeout.as_millis()).unwrap_or(u64::MAX);
            return Err(ApiError::CaptureTimeout { timeout_ms });
        },
    };

    info!(
        record_id = %stored.id,
        content_length = stored.content_length,
        source_ip = %stored.source_ip,
        "delivery captured"
    );

    Ok((
        ACCEPTED_STATUS,
        Json(CaptureAck { id: stored.id.to_string(), status_code: stored.status_code }),
    ))
}

/// First entry of `x-forwarded-for` when present, else the transport peer.
fn resolve_source_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

/// Headers as stored: names lowercased by the HTTP layer, non-UTF-8 values
/// skipped, duplicate names keep the last value.
fn extract_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

/// Decoded query parameters. A string that fails decoding is kept under a
/// `_raw` key rather than dropped; capture never loses what was sent.
fn parse_query(query: &str) -> Option<HashMap<String, String>> {
    match serde_urlencoded::from_str::<HashMap<String, String>>(query) {
        Ok(params) => (!params.is_empty()).then_some(params),
        Err(error) => {
            warn!(%error, raw = query, "query string failed to decode, keeping raw form");
            Some(HashMap::from([("_raw".to_string(), query.to_string())]))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "192.0.2.1:9000".parse().unwrap()
    }

    #[test]
    fn forwarded_header_wins_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "198.51.100.9, 10.0.0.1".parse().unwrap());
        assert_eq!(resolve_source_ip(&headers, peer()), "198.51.100.9");
    }

    #[test]
    fn peer_address_is_the_fallback() {
        assert_eq!(resolve_source_ip(&HeaderMap::new(), peer()), "192.0.2.1");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "".parse().unwrap());
        assert_eq!(resolve_source_ip(&headers, peer()), "192.0.2.1");
    }

    #[test]
    fn empty_query_string_stores_nothing() {
        assert_eq!(parse_query(""), None);
        let params = parse_query("a=1&b=two").unwrap();
        assert_eq!(params.get("a").map(String::as_str), Some("1"));
        assert_eq!(params.get("b").map(String::as_str), Some("two"));
    }

    #[test]
    fn bare_keys_are_kept_with_empty_values() {
        let params = parse_query("flag&a=1").unwrap();
        assert_eq!(params.get("flag").map(String::as_str), Some(""));
        assert_eq!(params.get("a").map(String::as_str), Some("1"));
    }
}

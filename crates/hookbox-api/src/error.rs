//! Caller-facing error taxonomy for the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hookbox_core::CoreError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Errors a request can terminate with.
///
/// Every variant maps to exactly one status code and one stable machine
/// code; none is retried or recovered from within a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed query or list parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown record id.
    #[error("not found: {0}")]
    NotFound(String),

    /// Captured body exceeds the configured ceiling.
    #[error("payload exceeds the {limit_bytes} byte limit")]
    PayloadTooLarge {
        /// Configured ceiling.
        limit_bytes: usize,
    },

    /// The record store cannot complete the operation. The cause is
    /// logged, never leaked to the caller.
    #[error("storage unavailable")]
    StorageUnavailable(#[source] CoreError),

    /// The durability wait on a capture exceeded its bound.
    #[error("capture timed out after {timeout_ms}ms")]
    CaptureTimeout {
        /// Configured bound in milliseconds.
        timeout_ms: u64,
    },
}

impl ApiError {
    /// Stable machine-readable code for the response envelope.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::NotFound(_) => "not_found",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::CaptureTimeout { .. } => "capture_timeout",
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::CaptureTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidFilter(message) => Self::InvalidRequest(message),
            CoreError::NotFound(message) => Self::NotFound(message),
            unavailable @ CoreError::Unavailable(_) => Self::StorageUnavailable(unavailable),
        }
    }
}

/// JSON error envelope: `{ "error": { "code": ..., "message": ... } }`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::StorageUnavailable(source) => {
                error!(error = %source, "storage operation failed");
            },
            Self::CaptureTimeout { timeout_ms } => {
                error!(timeout_ms, "capture durability wait timed out");
            },
            other => {
                warn!(code = other.code(), error = %other, "request rejected");
            },
        }

        let body = ErrorBody {
            error: ErrorDetail { code: self.code(), message: self.to_string() },
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_stable_code_and_status() {
        let cases = [
            (ApiError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST, "invalid_request"),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND, "not_found"),
            (
                ApiError::PayloadTooLarge { limit_bytes: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
            ),
            (
                ApiError::StorageUnavailable(CoreError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
                "storage_unavailable",
            ),
            (
                ApiError::CaptureTimeout { timeout_ms: 5000 },
                StatusCode::GATEWAY_TIMEOUT,
                "capture_timeout",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn storage_errors_do_not_leak_internals() {
        let err: ApiError = CoreError::Unavailable("connection refused to 10.0.0.3".into()).into();
        assert_eq!(err.to_string(), "storage unavailable");
    }

    #[test]
    fn filter_errors_become_invalid_request() {
        let err: ApiError = CoreError::InvalidFilter("limit must be between 1 and 100".into()).into();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}

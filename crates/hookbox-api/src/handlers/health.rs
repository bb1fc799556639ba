//! Health and liveness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    store: &'static str,
    timestamp: DateTime<Utc>,
}

/// Readiness probe: verifies the record store can serve reads.
pub async fn health_check(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse { status: "healthy", store: "up", timestamp: Utc::now() }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse { status: "unhealthy", store: "down", timestamp: Utc::now() }),
            )
                .into_response()
        },
    }
}

/// Liveness probe: answers as long as the process is running.
pub async fn liveness_check() -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "status": "alive" }))).into_response()
}

//! Health check endpoints.
//!
//! Wired outside the policy pipeline: probes must answer even when the
//! session store or directory is down.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::debug;

use crate::state::PlatformState;

/// Builds the health check router.
///
/// # Routes
///
/// - `GET /health` - Health status with environment
/// - `GET /_liveness` - Bare liveness probe
/// - `GET /_readiness` - Readiness probe (acquires and releases a data handle)
pub fn health_routes(state: PlatformState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/_liveness", get(liveness_handler))
        .route("/_readiness", get(readiness_handler))
        .with_state(state)
}

/// Handler for the health check endpoint.
async fn health_handler(State(state): State<PlatformState>) -> Response {
    debug!("Processing health check request");

    let body = serde_json::json!({
        "status": "healthy",
        "environment": state.environment(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    (StatusCode::OK, Json(body)).into_response()
}

/// Handler for the liveness probe.
async fn liveness_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Handler for the readiness probe.
///
/// Verifies the data resource is reachable by acquiring and immediately
/// releasing a handle.
async fn readiness_handler(State(state): State<PlatformState>) -> Response {
    debug!("Processing readiness check request");

    match state.resources_arc().acquire().await {
        Ok(handle) => {
            handle.release().await;
            let body = serde_json::json!({
                "status": "ready",
                "checks": { "resources": "ok" }
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            let body = serde_json::json!({
                "status": "not-ready",
                "checks": { "resources": err.to_string() }
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

use crate::GatewayState;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use serde_json::json;

/// GET /health - Gateway status with key store and route counts
pub async fn health_check(State(state): State<GatewayState>) -> Response {
    let health = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "components": {
            "key_store": {
                "keys": state.key_store.len(),
            },
            "routes": state.guards.len(),
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(health)).into_response()
}

/// GET /live - Kubernetes liveness probe
pub async fn liveness_check() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// GET /ready - Kubernetes readiness probe.
///
/// Not ready while authenticated routes exist but no keys are loaded: every
/// request to them would be denied.
pub async fn readiness_check(State(state): State<GatewayState>) -> Response {
    if state.requires_keys() && state.key_store.is_empty() {
        return (StatusCode::SERVICE_UNAVAILABLE, "No keys loaded").into_response();
    }

    (StatusCode::OK, "Ready").into_response()
}

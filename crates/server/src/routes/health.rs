use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "civic-ai-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

/// Readiness check endpoint
///
/// Always 200; `status` is `ready` when every model loaded and `degraded` otherwise, with the
/// per-model outcome under `models`.
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let models: Map<String, Value> = state
        .capability_statuses()
        .into_iter()
        .map(|(name, status)| (name.to_lowercase(), Value::String(status.to_string())))
        .collect();

    Json(json!({
        "status": if state.is_ready() { "ready" } else { "degraded" },
        "service": "civic-ai-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "models": models,
    }))
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    if !state.config.metrics_enabled {
        return Err(ServerError::NotFound);
    }
    let handle = state.metrics.as_ref().ok_or(ServerError::NotFound)?;
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], handle.render()))
}

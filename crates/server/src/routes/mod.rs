//! API route handlers
//!
//! Routes are organized by capability:
//!
//! - `health`: liveness, per-model readiness, and metrics
//! - `embedding`: text embedding and label classification
//! - `issue`: structured triage of issue reports
//! - `media`: audio transcription and image safety uploads

pub mod embedding;
pub mod health;
pub mod issue;
pub mod media;

use crate::error::ServerError;
use axum::extract::FromRequest;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// JSON request body whose rejections render as [`ServerError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);

/// Service name, version and available endpoints (GET /)
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "Civic AI Service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/analyze",
            "/classify",
            "/analyze-issue",
            "/transcribe",
            "/classify-image",
            "/health",
            "/ready",
            "/metrics"
        ]
    }))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

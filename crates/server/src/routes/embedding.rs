use crate::error::ServerResult;
use crate::routes::ApiJson;
use crate::state::ServerState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Request to embed a single text
#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub input_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub embedding: Vec<f32>,
}

/// Request to rank candidate labels against a text
#[derive(Debug, Deserialize)]
pub struct ClassificationRequest {
    pub text: String,
    pub candidate_labels: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassificationResponse {
    pub best_label: String,
    pub score: f32,
    pub scores: HashMap<String, f32>,
}

/// POST /analyze
pub async fn analyze_text(
    State(state): State<Arc<ServerState>>,
    ApiJson(request): ApiJson<AnalysisRequest>,
) -> ServerResult<Json<AnalysisResponse>> {
    let encoder = state.embedding.get()?;
    let embedding = civic_ai::embed_text(encoder, request.input_text).await?;
    Ok(Json(AnalysisResponse { embedding }))
}

/// POST /classify
pub async fn classify_text(
    State(state): State<Arc<ServerState>>,
    ApiJson(request): ApiJson<ClassificationRequest>,
) -> ServerResult<Json<ClassificationResponse>> {
    let encoder = state.embedding.get()?;
    let ranking =
        civic_ai::classify_text(encoder, request.text, request.candidate_labels).await?;
    Ok(Json(ClassificationResponse {
        best_label: ranking.best_label,
        score: ranking.best_score,
        scores: ranking.scores,
    }))
}

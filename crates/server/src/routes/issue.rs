use crate::error::ServerResult;
use crate::routes::ApiJson;
use crate::state::ServerState;
use axum::extract::State;
use axum::Json;
use civic_ai::IssueAnalysis;
use serde::Deserialize;
use std::sync::Arc;

/// Request to triage an issue report
#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    pub description: String,
    /// Comma-separated category list; the built-in list is used when absent
    #[serde(default)]
    pub categories: Option<String>,
}

/// POST /analyze-issue
pub async fn analyze_issue(
    State(state): State<Arc<ServerState>>,
    ApiJson(request): ApiJson<IssueRequest>,
) -> ServerResult<Json<IssueAnalysis>> {
    let model = state.generator.get()?;
    let analysis = civic_ai::analyze_issue(
        model.as_ref(),
        &request.description,
        request.categories.as_deref(),
    )
    .await?;
    Ok(Json(analysis))
}

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::{Multipart, State};
use axum::Json;
use civic_ai::{SafetyReport, Transcript, Upload};
use std::sync::Arc;

/// Pulls the file part named `field` out of a multipart body.
async fn read_upload(mut multipart: Multipart, field: &str) -> ServerResult<Upload> {
    while let Some(part) = multipart.next_field().await? {
        if part.name() != Some(field) {
            continue;
        }
        let filename = part.file_name().unwrap_or_default().to_string();
        let bytes = part.bytes().await?;
        return Ok(Upload::new(filename, bytes));
    }
    Err(ServerError::BadRequest(format!(
        "multipart field '{field}' is required"
    )))
}

/// POST /transcribe (multipart field `file`)
pub async fn transcribe_audio(
    State(state): State<Arc<ServerState>>,
    multipart: Multipart,
) -> ServerResult<Json<Transcript>> {
    let transcriber = state.transcription.get()?;
    let upload = read_upload(multipart, "file").await?;
    let transcript = civic_ai::transcribe_upload(transcriber.as_ref(), upload).await?;
    Ok(Json(transcript))
}

/// POST /classify-image (multipart field `image`)
pub async fn classify_image(
    State(state): State<Arc<ServerState>>,
    multipart: Multipart,
) -> ServerResult<Json<SafetyReport>> {
    let detector = state.safety.get()?;
    let upload = read_upload(multipart, "image").await?;
    let report = civic_ai::inspect_image_upload(detector, upload).await?;
    Ok(Json(report))
}

//! Workspace umbrella crate for the civic AI service.
//!
//! This crate stitches the model-facing crates together so callers (the HTTP server, tests,
//! batch tools) get one entry point per capability:
//!
//! - [`embed_text`] / [`classify_text`]: encoder + masked mean pooling + ranking,
//! - [`analyze_issue`]: prompt the generative model and extract a structured triage,
//! - [`transcribe_upload`] / [`inspect_image_upload`]: stage an upload and run a media model.
//!
//! Model calls that block (ONNX inference) run on tokio's blocking pool.

pub use media::{
    Detection, MediaError, NudeNetDetector, SafetyConfig, SafetyDetector, SafetyReport,
    SafetyStatus, StagedUpload, Transcriber, Transcript, TranscriptionConfig, WhisperHttpClient,
    DEFAULT_AUDIO_EXT, DEFAULT_IMAGE_EXT,
};
pub use semantic::{
    embed_texts, load_encoder, Candidate, OnnxEncoder, Ranking, SemanticConfig, SemanticError,
    StubEncoder, TextEncoder, TokenEmbeddings,
};
pub use triage::{
    ChatConfig, ChatMessage, ChatModel, IssueAnalysis, OpenAiChatClient, TriageError, Urgency,
    DEFAULT_CATEGORIES,
};

use bytes::Bytes;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Errors that can occur while running a request through one of the capabilities.
#[derive(Debug)]
pub enum PipelineError {
    Semantic(SemanticError),
    Triage(TriageError),
    Media(MediaError),
    /// A blocking worker panicked or was cancelled.
    Worker(String),
}

impl PipelineError {
    /// True when the caller sent something the capability cannot work with.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, PipelineError::Semantic(SemanticError::InvalidArgument(_)))
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Semantic(err) => write!(f, "embedding failure: {err}"),
            PipelineError::Triage(err) => write!(f, "issue analysis failure: {err}"),
            PipelineError::Media(err) => write!(f, "media processing failure: {err}"),
            PipelineError::Worker(msg) => write!(f, "worker failure: {msg}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Semantic(err) => Some(err),
            PipelineError::Triage(err) => Some(err),
            PipelineError::Media(err) => Some(err),
            PipelineError::Worker(_) => None,
        }
    }
}

impl From<SemanticError> for PipelineError {
    fn from(value: SemanticError) -> Self {
        PipelineError::Semantic(value)
    }
}

impl From<TriageError> for PipelineError {
    fn from(value: TriageError) -> Self {
        PipelineError::Triage(value)
    }
}

impl From<MediaError> for PipelineError {
    fn from(value: MediaError) -> Self {
        PipelineError::Media(value)
    }
}

/// A file received from a client, not yet written to disk.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T, PipelineError>
where
    F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| PipelineError::Worker(err.to_string()))?
}

/// Embeds a single text into a unit-length vector (a zero vector when it has no tokens).
pub async fn embed_text(
    encoder: Arc<dyn TextEncoder>,
    text: String,
) -> Result<Vec<f32>, PipelineError> {
    run_blocking(move || {
        let mut vectors = embed_texts(encoder.as_ref(), &[text.as_str()])?;
        vectors
            .pop()
            .ok_or_else(|| SemanticError::Inference("encoder returned no outputs".into()).into())
    })
    .await
}

/// Ranks `labels` by similarity to `text`. An empty or blank label is an invalid argument.
pub async fn classify_text(
    encoder: Arc<dyn TextEncoder>,
    text: String,
    labels: Vec<String>,
) -> Result<Ranking, PipelineError> {
    run_blocking(move || {
        let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        Ok(semantic::classify_text(encoder.as_ref(), &text, &label_refs)?)
    })
    .await
}

/// Structured triage of an issue report. Malformed model output degrades to fallback values.
pub async fn analyze_issue(
    model: &dyn ChatModel,
    description: &str,
    categories: Option<&str>,
) -> Result<IssueAnalysis, PipelineError> {
    Ok(triage::analyze_issue(model, description, categories).await?)
}

/// Stages `upload` (default extension `.ogg`) and transcribes it. The temp file is removed
/// before this returns.
pub async fn transcribe_upload(
    transcriber: &dyn Transcriber,
    upload: Upload,
) -> Result<Transcript, PipelineError> {
    let staged = run_blocking(move || {
        Ok(StagedUpload::stage(&upload.filename, &upload.bytes, DEFAULT_AUDIO_EXT)?)
    })
    .await?;
    let transcript = transcriber.transcribe(&staged).await?;
    tracing::debug!(filename = staged.filename(), chars = transcript.text.len(), "upload transcribed");
    Ok(transcript)
}

/// Stages `upload` (default extension `.jpg`) and runs the safety detector on it.
pub async fn inspect_image_upload(
    detector: Arc<dyn SafetyDetector>,
    upload: Upload,
) -> Result<SafetyReport, PipelineError> {
    run_blocking(move || {
        let staged = StagedUpload::stage(&upload.filename, &upload.bytes, DEFAULT_IMAGE_EXT)?;
        let report = detector.inspect(staged.path())?;
        tracing::debug!(
            filename = staged.filename(),
            detections = report.detections.len(),
            status = ?report.status,
            "image inspected"
        );
        Ok(report)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_is_detected() {
        let err = PipelineError::from(SemanticError::InvalidArgument("no labels".into()));
        assert!(err.is_invalid_argument());
        let err = PipelineError::from(SemanticError::Inference("boom".into()));
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn display_names_the_stage() {
        let err = PipelineError::from(TriageError::Request("refused".into()));
        assert_eq!(err.to_string(), "issue analysis failure: chat request failed: refused");
        assert!(err.source().is_some());
        assert!(PipelineError::Worker("panicked".into()).source().is_none());
    }

    #[test]
    fn upload_accepts_vec_and_static_bytes() {
        let a = Upload::new("a.jpg", vec![1u8, 2, 3]);
        let b = Upload::new("b.jpg", Bytes::from_static(b"xyz"));
        assert_eq!(a.bytes.len(), 3);
        assert_eq!(b.filename, "b.jpg");
    }
}

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{MediaError, StagedUpload};

/// Settings for the OpenAI-compatible speech-to-text endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub enabled: bool,
    /// Base URL up to and including the version segment, e.g. `http://localhost:8080/v1`.
    pub base_url: String,
    /// Whisper checkpoint requested from the endpoint.
    pub model: String,
    pub api_key: Option<String>,
    /// ISO-639-1 hint, English by default. `None` lets the model detect the language.
    pub language: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:8080/v1".into(),
            model: "openai/whisper-base".into(),
            api_key: None,
            language: Some("en".into()),
            timeout_secs: 300,
        }
    }
}

/// Text recognised in one audio upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub filename: String,
    pub text: String,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    fn model_name(&self) -> &str;

    async fn transcribe(&self, upload: &StagedUpload) -> Result<Transcript, MediaError>;
}

/// Sends staged audio to `{base_url}/audio/transcriptions` (whisper.cpp server, faster-whisper,
/// vLLM and friends all speak this API).
#[derive(Debug, Clone)]
pub struct WhisperHttpClient {
    http: reqwest::Client,
    cfg: TranscriptionConfig,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl WhisperHttpClient {
    pub fn new(cfg: TranscriptionConfig) -> Result<Self, MediaError> {
        if cfg.base_url.trim().is_empty() {
            return Err(MediaError::InvalidConfig("base_url must be set".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .map_err(|e| MediaError::InvalidConfig(e.to_string()))?;
        Ok(Self { http, cfg })
    }

    /// Builds the client and checks that the endpoint answers `GET {base_url}/models`.
    pub async fn connect(cfg: TranscriptionConfig) -> Result<Self, MediaError> {
        let client = Self::new(cfg)?;
        let response = client
            .authorized(client.http.get(client.endpoint("models")))
            .send()
            .await
            .map_err(|e| MediaError::Transcription(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Transcription(format!(
                "model listing returned status {status}"
            )));
        }
        tracing::info!(model = %client.cfg.model, base_url = %client.cfg.base_url, "transcription endpoint reachable");
        Ok(client)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.cfg.base_url.trim_end_matches('/'))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.cfg.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperHttpClient {
    fn model_name(&self) -> &str {
        &self.cfg.model
    }

    async fn transcribe(&self, upload: &StagedUpload) -> Result<Transcript, MediaError> {
        let bytes = tokio::fs::read(upload.path()).await?;
        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(upload.filename().to_string()))
            .text("model", self.cfg.model.clone())
            .text("response_format", "json");
        if let Some(language) = &self.cfg.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .authorized(self.http.post(self.endpoint("audio/transcriptions")))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Transcription(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MediaError::Transcription(format!(
                "endpoint returned status {status}: {detail}"
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Transcription(e.to_string()))?;

        Ok(Transcript {
            filename: upload.filename().to_string(),
            text: parsed.text.trim().to_string(),
        })
    }
}

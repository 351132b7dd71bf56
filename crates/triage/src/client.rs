use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ChatConfig, ChatMessage, TriageError};

/// Anything that turns a chat-style prompt into a text completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, TriageError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint (Ollama, vLLM, llama.cpp, ...).
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    http: reqwest::Client,
    cfg: ChatConfig,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChatClient {
    pub fn new(cfg: ChatConfig) -> Result<Self, TriageError> {
        if cfg.base_url.trim().is_empty() {
            return Err(TriageError::InvalidConfig("base_url must be set".into()));
        }
        if cfg.model.trim().is_empty() {
            return Err(TriageError::InvalidConfig("model must be set".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .map_err(|e| TriageError::InvalidConfig(e.to_string()))?;
        Ok(Self { http, cfg })
    }

    /// Builds the client and checks that the endpoint answers `GET {base_url}/models`.
    pub async fn connect(cfg: ChatConfig) -> Result<Self, TriageError> {
        let client = Self::new(cfg)?;
        client.probe().await?;
        tracing::info!(
            model = %client.cfg.model,
            base_url = %client.cfg.base_url,
            "chat model endpoint reachable"
        );
        Ok(client)
    }

    async fn probe(&self) -> Result<(), TriageError> {
        let response = self
            .authorized(self.http.get(self.endpoint("models")))
            .send()
            .await
            .map_err(|e| TriageError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TriageError::Request(format!(
                "model listing returned status {status}"
            )));
        }
        Ok(())
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
impl ChatModel for OpenAiChatClient {
    fn model_name(&self) -> &str {
        &self.cfg.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, TriageError> {
        let body = CompletionRequest {
            model: &self.cfg.model,
            messages,
            temperature: self.cfg.temperature,
            max_tokens: self.cfg.max_tokens,
        };

        let response = self
            .authorized(self.http.post(self.endpoint("chat/completions")))
            .json(&body)
            .send()
            .await
            .map_err(|e| TriageError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TriageError::Request(format!(
                "chat completion returned status {status}: {detail}"
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| TriageError::Inference(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TriageError::Inference("completion contained no message".into()))
    }
}

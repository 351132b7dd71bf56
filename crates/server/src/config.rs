use media::{SafetyConfig, TranscriptionConfig};
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use triage::ChatConfig;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum request body size in MB (uploads included)
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Text encoder behind `/analyze` and `/classify`
    #[serde(default)]
    pub embedding: SemanticConfig,

    /// Chat model behind `/analyze-issue`
    #[serde(default)]
    pub generator: ChatConfig,

    /// Speech-to-text endpoint behind `/transcribe`
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Image-safety model behind `/classify-image`
    #[serde(default)]
    pub safety: SafetyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            embedding: SemanticConfig::default(),
            generator: ChatConfig::default(),
            transcription: TranscriptionConfig::default(),
            safety: SafetyConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server.*` file and `CIVIC_AI__*` variables
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("CIVIC_AI").separator("__"));

        let mut config: ServerConfig = builder.build()?.try_deserialize()?;
        config.apply_conventional_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Honour the variables model tooling usually reads: `HF_TOKEN` / `HUGGINGFACE_API_KEY`
    /// for gated downloads and `WHISPER_MODEL` for the transcription checkpoint.
    fn apply_conventional_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let token = lookup("HF_TOKEN")
            .or_else(|| lookup("HUGGINGFACE_API_KEY"))
            .filter(|t| !t.trim().is_empty());
        if let Some(token) = token {
            let header = format!("Bearer {}", token.trim());
            self.embedding.auth_header.get_or_insert_with(|| header.clone());
            self.safety.auth_header.get_or_insert(header);
        }

        if lookup("CIVIC_AI__TRANSCRIPTION__MODEL").is_none() {
            if let Some(model) = lookup("WHISPER_MODEL").filter(|m| !m.trim().is_empty()) {
                self.transcription.model = model;
            }
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_body_size_mb() -> usize {
    25
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.max_body_size_mb, 25);
        assert_eq!(cfg.max_body_size(), 25 * 1024 * 1024);
        assert!(cfg.enable_cors);
        assert!(cfg.metrics_enabled);
        assert_eq!(cfg.transcription.model, "openai/whisper-base");
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn hf_token_becomes_download_header() {
        let mut cfg = ServerConfig::default();
        cfg.apply_conventional_env(env(&[("HUGGINGFACE_API_KEY", "hf_abc")]));
        assert_eq!(cfg.embedding.auth_header.as_deref(), Some("Bearer hf_abc"));
        assert_eq!(cfg.safety.auth_header.as_deref(), Some("Bearer hf_abc"));
    }

    #[test]
    fn explicit_header_wins_over_hf_token() {
        let mut cfg = ServerConfig::default();
        cfg.embedding.auth_header = Some("Bearer mine".into());
        cfg.apply_conventional_env(env(&[("HF_TOKEN", "hf_abc")]));
        assert_eq!(cfg.embedding.auth_header.as_deref(), Some("Bearer mine"));
    }

    #[test]
    fn whisper_model_selects_transcription_model() {
        let mut cfg = ServerConfig::default();
        cfg.apply_conventional_env(env(&[("WHISPER_MODEL", "openai/whisper-small")]));
        assert_eq!(cfg.transcription.model, "openai/whisper-small");

        let mut cfg = ServerConfig::default();
        cfg.apply_conventional_env(env(&[
            ("WHISPER_MODEL", "openai/whisper-small"),
            ("CIVIC_AI__TRANSCRIPTION__MODEL", "large"),
        ]));
        assert_eq!(cfg.transcription.model, "openai/whisper-base");
    }

    #[test]
    fn nested_sections_deserialize_with_defaults() {
        let cfg: ServerConfig = serde_json::from_str(
            r#"{"port": 9000, "embedding": {"mode": "fast"}, "safety": {"enabled": false}}"#,
        )
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.embedding.mode, "fast");
        assert_eq!(cfg.embedding.stub_dim, 768);
        assert!(!cfg.safety.enabled);
        assert!(cfg.generator.enabled);
    }
}

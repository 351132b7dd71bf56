use serde::{Deserialize, Serialize};

/// Settings for the OpenAI-compatible chat endpoint used for issue analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// When false the generator capability is never loaded.
    pub enabled: bool,
    /// Base URL up to and including the version segment, e.g. `http://localhost:11434/v1`.
    pub base_url: String,
    pub model: String,
    /// Sent as `Authorization: Bearer <key>` when present.
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434/v1".into(),
            model: "qwen3:1.7b".into(),
            api_key: None,
            temperature: 0.2,
            max_tokens: 512,
            timeout_secs: 120,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime configuration describing which encoder to build and where its assets live.
///
/// # Example
/// ```no_run
/// use semantic::{load_encoder, SemanticConfig};
/// use std::path::PathBuf;
///
/// # async fn run() -> Result<(), semantic::SemanticError> {
/// let cfg = SemanticConfig {
///     model_path: PathBuf::from("./models/embeddinggemma-300m/onnx/model.onnx"),
///     tokenizer_path: Some(PathBuf::from("./models/embeddinggemma-300m/tokenizer.json")),
///     ..Default::default()
/// };
/// let encoder = load_encoder(&cfg).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// When false the embedding capability is never loaded.
    pub enabled: bool,
    /// Encoder selector: `"onnx"` (local model) or `"fast"` (deterministic stub).
    pub mode: String,
    /// Friendly label reported by the encoder.
    pub model_name: String,
    /// Local path where the ONNX file should live (also the download target when
    /// [`model_url`](Self::model_url) is provided).
    pub model_path: PathBuf,
    /// Optional HTTPS URL downloaded when [`model_path`](Self::model_path) is missing.
    pub model_url: Option<String>,
    /// Path to `tokenizer.json`. When absent and [`tokenizer_url`](Self::tokenizer_url) is provided we
    /// infer the filename from the URL and place it next to the model file.
    pub tokenizer_path: Option<PathBuf>,
    /// Optional HTTPS URL for fetching the tokenizer on-demand.
    pub tokenizer_url: Option<String>,
    /// Authorization header sent with asset downloads (e.g. `"Bearer hf_xxx"` for gated models).
    pub auth_header: Option<String>,
    /// Tokens beyond this length are truncated before inference.
    pub max_sequence_length: usize,
    /// Per-token vector width produced by the stub encoder.
    pub stub_dim: usize,
    /// Requested compute device. Only `"cpu"` is backed by the bundled runtime; anything else
    /// logs a warning and runs on CPU.
    pub device: String,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: "onnx".into(),
            model_name: "embeddinggemma-300m".into(),
            model_path: PathBuf::from("./models/embeddinggemma-300m/onnx/model.onnx"),
            model_url: None,
            tokenizer_path: Some(PathBuf::from("./models/embeddinggemma-300m/tokenizer.json")),
            tokenizer_url: None,
            auth_header: None,
            max_sequence_length: 512,
            stub_dim: 768,
            device: "cpu".into(),
        }
    }
}

use std::io;
use thiserror::Error;

/// Errors surfaced by the encoder, the aggregator and the ranker.
#[derive(Debug, Error)]
pub enum SemanticError {
    /// The ONNX model could not be located locally and no download URL was provided.
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    /// The tokenizer JSON is missing and there was no remote URL to fetch it from.
    #[error("tokenizer missing: {0}")]
    TokenizerMissing(String),
    /// Configuration is inconsistent (unknown mode, zero dimensions, ...).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// Unable to download remote assets.
    #[error("download failed: {0}")]
    Download(String),
    /// Low-level IO failures while touching the filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// ONNX Runtime, tokenizer, or shape errors raised while running the model.
    #[error("inference failure: {0}")]
    Inference(String),
    /// The caller supplied arguments the operation cannot work with.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

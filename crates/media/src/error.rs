use semantic::SemanticError;
use std::io;
use thiserror::Error;

/// Errors raised by the transcription and image-safety adapters.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Model file missing locally with no URL to fetch it from.
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("invalid media config: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The upload could not be decoded as an image.
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("download failed: {0}")]
    Download(String),
    #[error("inference failure: {0}")]
    Inference(String),
    /// The speech-to-text endpoint failed or answered with something unreadable.
    #[error("transcription failed: {0}")]
    Transcription(String),
}

impl From<SemanticError> for MediaError {
    fn from(err: SemanticError) -> Self {
        match err {
            SemanticError::ModelNotFound(path) => MediaError::ModelNotFound(path),
            SemanticError::Download(msg) => MediaError::Download(msg),
            SemanticError::Io(err) => MediaError::Io(err),
            SemanticError::InvalidConfig(msg) => MediaError::InvalidConfig(msg),
            other => MediaError::Inference(other.to_string()),
        }
    }
}

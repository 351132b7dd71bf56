use thiserror::Error;

/// Errors raised while asking the generative model for an analysis.
///
/// Malformed model output is never an error; see [`crate::extract_issue_analysis`].
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("invalid generator config: {0}")]
    InvalidConfig(String),
    /// Transport failure or non-success status from the chat endpoint.
    #[error("chat request failed: {0}")]
    Request(String),
    /// The endpoint answered but the completion could not be read.
    #[error("generation failure: {0}")]
    Inference(String),
}

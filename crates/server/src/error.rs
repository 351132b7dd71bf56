use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use civic_ai::PipelineError;
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The capability failed to load at startup or is disabled.
    #[error("{0} model is not loaded")]
    ModelUnavailable(&'static str),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("Not found")]
    NotFound,
}

/// Body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Pipeline(err) if err.is_invalid_argument() => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::NotFound => "NOT_FOUND",
            ServerError::Pipeline(err) if err.is_invalid_argument() => "INVALID_ARGUMENT",
            ServerError::Pipeline(PipelineError::Semantic(_)) => "EMBEDDING_ERROR",
            ServerError::Pipeline(PipelineError::Triage(_)) => "GENERATION_ERROR",
            ServerError::Pipeline(PipelineError::Media(_)) => "MEDIA_ERROR",
            ServerError::Pipeline(PipelineError::Worker(_)) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        }

        let body = Json(ErrorResponse {
            detail: self.to_string(),
            code: self.error_code().to_string(),
        });

        (status, body).into_response()
    }
}

impl From<MultipartError> for ServerError {
    fn from(err: MultipartError) -> Self {
        ServerError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

impl From<JsonRejection> for ServerError {
    fn from(err: JsonRejection) -> Self {
        ServerError::BadRequest(format!("Invalid JSON body: {}", err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_ai::{MediaError, SemanticError, TriageError};

    #[test]
    fn unavailable_model_is_503() {
        let err = ServerError::ModelUnavailable("Embedding");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "Embedding model is not loaded");
    }

    #[test]
    fn invalid_argument_is_400() {
        let err = ServerError::from(PipelineError::from(SemanticError::InvalidArgument(
            "no labels".into(),
        )));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn inference_failures_are_500() {
        let cases = [
            PipelineError::from(SemanticError::Inference("shape".into())),
            PipelineError::from(TriageError::Request("refused".into())),
            PipelineError::from(MediaError::Transcription("bad audio".into())),
            PipelineError::Worker("panicked".into()),
        ];
        for err in cases {
            assert_eq!(
                ServerError::from(err).status_code(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }

    #[test]
    fn detail_carries_underlying_message() {
        let err = ServerError::from(PipelineError::from(SemanticError::Inference(
            "ONNX session failed".into(),
        )));
        assert!(err.to_string().contains("ONNX session failed"));
        assert_eq!(err.error_code(), "EMBEDDING_ERROR");
    }
}

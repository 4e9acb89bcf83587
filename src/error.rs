use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Every failure surfaced to an HTTP caller, with the status and
/// message wording the frontend already depends on.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No video uploaded")]
    NoVideo,
    #[error("Model not loaded")]
    ModelNotLoaded,
    #[error("Frame extraction failed")]
    FrameExtraction,
    #[error("File not found")]
    NotFound,
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NoVideo | ApiError::FrameExtraction => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::ModelNotLoaded | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<crate::pipeline::PipelineError> for ApiError {
    fn from(err: crate::pipeline::PipelineError) -> Self {
        match err {
            crate::pipeline::PipelineError::FrameExtraction => ApiError::FrameExtraction,
            crate::pipeline::PipelineError::Internal(e) => ApiError::Internal(e.to_string()),
        }
    }
}

//! API Error Responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use data_validator::ValidationError;
use inference_engine::InferenceError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Errors surfaced by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body missing, not JSON, or not a JSON object
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    /// Metric label for the error class
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidBody(_) => "invalid_body",
            ApiError::Validation(_) => "validation",
            ApiError::Inference(e) if e.is_not_found() => "model_not_found",
            ApiError::Inference(_) => "internal",
        }
    }

    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        match self {
            ApiError::InvalidBody(_) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Invalid request. JSON body required.".to_string(),
                    message: None,
                },
            ),
            ApiError::Validation(e @ ValidationError::MissingFields(_)) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: e.to_string(),
                    message: None,
                },
            ),
            ApiError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Preprocessing error".to_string(),
                    message: Some(e.to_string()),
                },
            ),
            ApiError::Inference(e) if e.is_not_found() => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Model not found".to_string(),
                    message: None,
                },
            ),
            ApiError::Inference(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Internal Server Error".to_string(),
                    message: Some(e.to_string()),
                },
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        if status.is_server_error() {
            error!("Prediction failed: {}", self);
        } else {
            warn!("Rejected prediction request: {}", self);
        }
        metrics::counter!("prediction_errors_total", "kind" => self.kind()).increment(1);
        (status, Json(body)).into_response()
    }
}

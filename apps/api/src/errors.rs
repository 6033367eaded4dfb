use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::imaging::ImageError;
use crate::llm_client::LlmError;
use crate::stylist::quiz::QuizError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Image decode failure: {0}")]
    DecodeFailure(String),

    #[error("Model response did not match the schema: {0}")]
    SchemaParseFailure(String),

    #[error("Remote model failure: {message}")]
    RemoteFailure { message: String, exhausted: bool },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        if err.is_schema_failure() {
            return AppError::SchemaParseFailure(err.to_string());
        }
        let exhausted = matches!(err, LlmError::RetriesExhausted { .. });
        AppError::RemoteFailure {
            message: err.to_string(),
            exhausted,
        }
    }
}

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Decode(_) => AppError::DecodeFailure(err.to_string()),
            ImageError::UnsupportedMediaType(_) => AppError::UnsupportedMediaType(err.to_string()),
            ImageError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            ImageError::InvalidDataUrl(_)
            | ImageError::Base64(_)
            | ImageError::InvalidQuality(_)
            | ImageError::InvalidMaxWidth => AppError::Validation(err.to_string()),
            ImageError::Encode(_) | ImageError::Worker(_) => AppError::Internal(err.into()),
        }
    }
}

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge(err.body_text());
        }
        AppError::Validation(format!("Malformed multipart body: {}", err.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                msg.clone(),
            ),
            AppError::DecodeFailure(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "DECODE_FAILURE",
                msg.clone(),
            ),
            AppError::SchemaParseFailure(msg) => {
                tracing::error!("Schema parse failure: {msg}");
                (StatusCode::BAD_GATEWAY, "SCHEMA_PARSE_FAILURE", msg.clone())
            }
            AppError::RemoteFailure { message, exhausted } => {
                tracing::error!("Remote model failure (exhausted={exhausted}): {message}");
                let status = if *exhausted {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::BAD_GATEWAY
                };
                (status, "REMOTE_FAILURE", message.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

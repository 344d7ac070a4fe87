//! Universal error handling for the API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::media_storage::StorageError;
use crate::thumbnails::ThumbnailError;

/// API error response envelope that matches client expectations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(status: StatusCode, code: &str, msg: &str, retry: bool) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody {
                    code: code.to_string(),
                    message: msg.to_string(),
                },
            },
        }
    }

    /// Create a 400 validation error carrying the failing field's error
    /// code
    #[must_use]
    pub fn validation_from_str(code: &str, msg: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, msg, false)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert storage errors to application errors
impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::NotFound(key) => {
                tracing::debug!("Object not found: {key}");
                Self::new(
                    StatusCode::NOT_FOUND,
                    "not_found",
                    "Requested asset does not exist",
                    false,
                )
            }
            StorageError::Upstream(msg) => {
                tracing::error!("Storage upstream error: {msg}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "upstream_error",
                    "Storage service temporarily unavailable",
                    true,
                )
            }
            StorageError::Transport(msg) => {
                tracing::error!("Storage transport error: {msg}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                    true,
                )
            }
            StorageError::Config(msg) => {
                tracing::error!("Storage configuration error: {msg}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                    false,
                )
            }
        }
    }
}

/// Convert thumbnail errors to application errors
impl From<ThumbnailError> for AppError {
    fn from(err: ThumbnailError) -> Self {
        match err {
            ThumbnailError::Decode { key, reason } => {
                tracing::warn!("Undecodable image at {key}: {reason}");
                Self::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "invalid_image",
                    "Uploaded file could not be decoded as an image",
                    false,
                )
            }
            ThumbnailError::Encode { key, reason } => {
                tracing::error!("Thumbnail encode failed for {key}: {reason}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                    true,
                )
            }
            ThumbnailError::Unsupported(category) => {
                tracing::warn!("No thumbnail variant for category {category}");
                Self::new(
                    StatusCode::BAD_REQUEST,
                    "invalid_input",
                    "Category has no thumbnail variant",
                    false,
                )
            }
            ThumbnailError::Storage(storage) => storage.into(),
        }
    }
}

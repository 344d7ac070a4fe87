//! Custom extractors for request validation

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use validator::Validate;

use crate::types::error::AppError;

/// Custom JSON extractor that validates the payload
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // First extract JSON
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| match err {
                JsonRejection::MissingJsonContentType(_) => AppError::new(
                    axum::http::StatusCode::BAD_REQUEST,
                    "invalid_content_type",
                    "Missing Content-Type: application/json header",
                    false,
                ),
                _ => AppError::new(
                    axum::http::StatusCode::BAD_REQUEST,
                    "invalid_json",
                    "Invalid JSON payload",
                    false,
                ),
            })?;

        // Then validate
        payload.validate().map_err(|errors| {
            // Surface the first field error's message as the error code
            for (_field, field_errors) in errors.field_errors() {
                if let Some(error) = field_errors.first() {
                    if let Some(message) = &error.message {
                        return AppError::validation_from_str(
                            message.as_ref(),
                            "Request validation failed",
                        );
                    }
                }
            }
            AppError::validation_from_str("validation_error", "Request validation failed")
        })?;

        Ok(Self(payload))
    }
}

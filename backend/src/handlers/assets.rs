//! Asset upload, refresh, and deletion handlers

use std::collections::HashMap;

use asset_keys::{build_key, derive_thumbnail_key, is_thumbnail_key, AssetCategory};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::{Validate, ValidationError};

use crate::state::AppState;
use crate::types::{AppError, ValidatedJson};

/// Maximum accepted upload size, 15 MiB.
pub const MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Shape of every key this service issues: category prefix, entity id,
/// filename.
static KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]+/[A-Za-z0-9_-]+/[A-Za-z0-9_.-]+$").expect("key regex must compile")
});

/// Response for a successful upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Storage key of the uploaded asset
    pub key: String,
    /// Signed URL for immediate access
    pub url: String,
    /// Stored size in bytes
    pub size: usize,
    /// Content type as stored
    pub content_type: String,
    /// Client-supplied filename before sanitization
    pub original_name: String,
}

/// Request to refresh a signed URL
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    /// Bare storage key or previously issued URL
    #[validate(custom(function = validate_refresh_input))]
    pub key: String,
}

/// Response carrying a refreshed URL
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Signed URL, or the input unchanged when re-signing was not
    /// possible
    pub url: String,
}

fn validate_refresh_input(value: &str) -> Result<(), ValidationError> {
    if value.contains("://") || KEY_REGEX.is_match(value) {
        return Ok(());
    }
    Err(ValidationError::new("invalid_key"))
}

/// Content types accepted for a category.
fn allowed_content_types(category: AssetCategory) -> &'static [&'static str] {
    const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
    const LICENSE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "application/pdf"];
    const DOCUMENT_TYPES: &[&str] = &[
        "application/pdf",
        "image/jpeg",
        "image/png",
        "image/webp",
        "text/plain",
    ];

    match category {
        AssetCategory::Logo | AssetCategory::Cover | AssetCategory::Gallery => IMAGE_TYPES,
        AssetCategory::License => LICENSE_TYPES,
        AssetCategory::Document | AssetCategory::Temp => DOCUMENT_TYPES,
    }
}

struct UploadFields {
    category: Option<String>,
    entity_id: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Option<Bytes>,
}

async fn collect_fields(mut multipart: Multipart) -> Result<UploadFields, AppError> {
    let mut fields = UploadFields {
        category: None,
        entity_id: None,
        file_name: None,
        content_type: None,
        bytes: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed multipart body: {e}");
        AppError::new(
            StatusCode::BAD_REQUEST,
            "invalid_multipart",
            "Malformed multipart body",
            false,
        )
    })? {
        match field.name() {
            Some("category") => {
                fields.category = Some(field.text().await.map_err(bad_field)?);
            }
            Some("entity_id") => {
                fields.entity_id = Some(field.text().await.map_err(bad_field)?);
            }
            Some("file") => {
                fields.file_name = field.file_name().map(ToString::to_string);
                fields.content_type = field.content_type().map(ToString::to_string);
                fields.bytes = Some(field.bytes().await.map_err(bad_field)?);
            }
            _ => {}
        }
    }

    Ok(fields)
}

fn bad_field(err: axum::extract::multipart::MultipartError) -> AppError {
    warn!("Failed to read multipart field: {err}");
    AppError::new(
        StatusCode::BAD_REQUEST,
        "invalid_multipart",
        "Failed to read multipart field",
        false,
    )
}

fn missing_field(name: &str) -> AppError {
    AppError::new(
        StatusCode::BAD_REQUEST,
        "missing_field",
        &format!("Missing required field: {name}"),
        false,
    )
}

/// `POST /v1/assets`
///
/// Accepts a multipart form with `category`, `entity_id`, and `file`
/// fields. All validation happens before any storage call. Image
/// categories get a thumbnail generated inline; a thumbnail failure is
/// logged and never fails the upload.
#[instrument(skip(state, multipart))]
pub async fn upload_asset(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let fields = collect_fields(multipart).await?;

    let category_raw = fields.category.ok_or_else(|| missing_field("category"))?;
    let entity_id = fields.entity_id.ok_or_else(|| missing_field("entity_id"))?;
    let bytes = fields.bytes.ok_or_else(|| missing_field("file"))?;
    let file_name = fields.file_name.ok_or_else(|| missing_field("file"))?;

    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "Uploaded file exceeds the 15 MiB limit",
            false,
        ));
    }

    let category: AssetCategory = category_raw.parse().map_err(|_| {
        AppError::new(
            StatusCode::BAD_REQUEST,
            "unknown_category",
            "Unknown asset category",
            false,
        )
    })?;

    let content_type = fields
        .content_type
        .as_deref()
        .and_then(|raw| raw.parse::<mime::Mime>().ok())
        .ok_or_else(|| {
            AppError::new(
                StatusCode::BAD_REQUEST,
                "missing_content_type",
                "File part must declare a content type",
                false,
            )
        })?;
    let essence = content_type.essence_str().to_string();
    if !allowed_content_types(category).contains(&essence.as_str()) {
        return Err(AppError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "unsupported_media_type",
            "Content type not allowed for this category",
            false,
        ));
    }

    let key = build_key(category, &entity_id, &file_name).map_err(|e| {
        warn!("Key construction rejected upload: {e}");
        AppError::new(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            "Invalid entity id or filename",
            false,
        )
    })?;

    let size = bytes.len();
    let metadata = HashMap::from([("original-name".to_string(), file_name.clone())]);
    state.store.put(&key, bytes.clone(), &essence, metadata).await?;

    if category.is_image() {
        // Thumbnail failures degrade the listing experience but must
        // never lose an accepted upload.
        if let Err(e) = state.thumbnails.ensure_thumbnail(&key, &bytes, category).await {
            warn!(key = %key, error = %e, "thumbnail generation failed, keeping original");
        }
    }

    let url = state.signed_urls.issue(&key).await?;
    info!(key = %key, size, "asset uploaded");

    Ok(Json(UploadResponse {
        key,
        url,
        size,
        content_type: essence,
        original_name: file_name,
    }))
}

/// `POST /v1/assets/refresh`
///
/// Exchanges a bare key or stale signed URL for a fresh signed URL.
/// Never fails on signing problems; the input is echoed back instead.
pub async fn refresh_url(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> Json<RefreshResponse> {
    let url = state.signed_urls.refresh(&request.key).await;
    Json(RefreshResponse { url })
}

/// `DELETE /v1/assets/{key}`
///
/// Removes the asset and, for originals, its derived thumbnail.
/// Deleting an absent key still answers 204.
#[instrument(skip(state))]
pub async fn delete_asset(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    if !KEY_REGEX.is_match(&key) {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "invalid_key",
            "Key does not match the expected shape",
            false,
        ));
    }

    state.store.delete(&key).await?;
    if !is_thumbnail_key(&key) {
        state.store.delete(&derive_thumbnail_key(&key)).await?;
    }

    info!(key = %key, "asset deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_regex_accepts_issued_keys() {
        for key in [
            "logos/42/logo.png",
            "covers/school-7/cover.jpg",
            "galleries/42/image_1734248840123.webp",
            "documents/42/handbook_2025.pdf",
        ] {
            assert!(KEY_REGEX.is_match(key), "{key}");
        }
    }

    #[test]
    fn key_regex_rejects_traversal_and_urls() {
        for key in [
            "logos/../secrets",
            "logos/42",
            "https://bucket.s3.amazonaws.com/logos/42/logo.png",
            "logos/42/",
            "",
        ] {
            assert!(!KEY_REGEX.is_match(key), "{key}");
        }
    }

    #[test]
    fn refresh_input_accepts_keys_and_urls() {
        assert!(validate_refresh_input("logos/42/logo.png").is_ok());
        assert!(validate_refresh_input("https://x.example/b/logos/42/logo.png").is_ok());
        assert!(validate_refresh_input("not a key").is_err());
    }
}

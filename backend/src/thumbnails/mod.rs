//! Thumbnail generation pipeline
//!
//! Thumbnails are derived lazily and exactly once per original: the
//! pipeline checks for the derived key before doing any work, so repeated
//! runs are cheap no-ops. Output is always re-encoded to one canonical
//! lossy format regardless of the input format.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use asset_keys::{derive_thumbnail_key, AssetCategory};
use bytes::Bytes;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ImageReader};
use thiserror::Error;
use tracing::{debug, info};

use crate::media_storage::{ObjectStore, StorageError};

/// Canonical content type of every thumbnail variant.
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

/// Fixed quality for the canonical JPEG re-encode.
const JPEG_QUALITY: u8 = 80;

/// Errors from thumbnail generation.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// Original bytes could not be decoded as an image; nothing was
    /// uploaded
    #[error("failed to decode image for {key}: {reason}")]
    Decode {
        /// Key of the original asset
        key: String,
        /// Decoder message
        reason: String,
    },

    /// Re-encoding the resized image failed; nothing was uploaded
    #[error("failed to encode thumbnail for {key}: {reason}")]
    Encode {
        /// Key of the original asset
        key: String,
        /// Encoder message
        reason: String,
    },

    /// Category has no thumbnail variant; this is a caller error, not a
    /// fallback path
    #[error("category {0} has no thumbnail variant")]
    Unsupported(AssetCategory),

    /// Object-store failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Fixed output dimensions per image category; `None` for categories
/// without thumbnails.
#[must_use]
pub const fn dimensions(category: AssetCategory) -> Option<(u32, u32)> {
    match category {
        AssetCategory::Logo => Some((128, 128)),
        AssetCategory::Cover => Some((640, 360)),
        AssetCategory::Gallery => Some((400, 400)),
        AssetCategory::License | AssetCategory::Document | AssetCategory::Temp => None,
    }
}

/// Idempotent thumbnail generation over an object store.
pub struct ThumbnailPipeline {
    store: Arc<dyn ObjectStore>,
}

impl ThumbnailPipeline {
    /// Creates a pipeline over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Ensures the thumbnail variant of `original_key` exists and
    /// returns its key.
    ///
    /// Skips all work when the derived key already exists. Decode and
    /// encode failures abort before any upload, leaving the original
    /// untouched.
    ///
    /// # Errors
    ///
    /// [`ThumbnailError::Unsupported`] for non-image categories,
    /// [`ThumbnailError::Decode`]/[`ThumbnailError::Encode`] for
    /// unusable image bytes, and [`ThumbnailError::Storage`] for store
    /// failures.
    pub async fn ensure_thumbnail(
        &self,
        original_key: &str,
        original_bytes: &[u8],
        category: AssetCategory,
    ) -> Result<String, ThumbnailError> {
        let (width, height) =
            dimensions(category).ok_or(ThumbnailError::Unsupported(category))?;
        let thumbnail_key = derive_thumbnail_key(original_key);

        if let Some(info) = self.store.head_info(&thumbnail_key).await? {
            debug!(key = %thumbnail_key, size = info.size, "thumbnail already present, skipping");
            return Ok(thumbnail_key);
        }

        let encoded = render_thumbnail(original_key, original_bytes, width, height)?;

        let metadata = HashMap::from([
            ("is-thumbnail".to_string(), "true".to_string()),
            ("original-key".to_string(), original_key.to_string()),
            ("thumbnail-type".to_string(), category.to_string()),
        ]);
        self.store
            .put(
                &thumbnail_key,
                Bytes::from(encoded),
                THUMBNAIL_CONTENT_TYPE,
                metadata,
            )
            .await?;

        info!(original = %original_key, thumbnail = %thumbnail_key, "thumbnail generated");
        Ok(thumbnail_key)
    }
}

/// Decodes, center-crops to fill `width`×`height`, and re-encodes as
/// JPEG.
fn render_thumbnail(
    key: &str,
    bytes: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, ThumbnailError> {
    let decoded = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ThumbnailError::Decode {
            key: key.to_string(),
            reason: e.to_string(),
        })?
        .decode()
        .map_err(|e| ThumbnailError::Decode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

    // resize_to_fill scales to cover the target box and crops centered,
    // so the output always fills the requested dimensions.
    let resized = decoded.resize_to_fill(width, height, FilterType::Lanczos3);
    let rgb = resized.to_rgb8();

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder
        .encode_image(&rgb)
        .map_err(|e| ThumbnailError::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
    Ok(out)
}

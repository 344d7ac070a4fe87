//! Storage-key construction and thumbnail-key derivation for media assets
//!
//! Keys are hierarchical path strings of the form
//! `<category>/<entityId>/<filename>.<ext>` and are the only identity an
//! asset has. Everything in this crate is pure; no I/O.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Marker inserted before the extension of a thumbnail variant key.
///
/// Inherited convention: filenames are assumed to never legitimately end
/// in `_thumb` before their extension. The mapping below is a bijection
/// only under that assumption.
pub const THUMBNAIL_MARKER: &str = "_thumb";

/// Errors for malformed key-construction input
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Entity id is empty or contains disallowed characters
    #[error("invalid entity id: {0:?}")]
    InvalidEntityId(String),
    /// Filename is empty or sanitizes to nothing usable
    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),
    /// Category tag does not name a known category
    #[error("unknown asset category: {0:?}")]
    UnknownCategory(String),
}

/// Closed set of asset categories.
///
/// Every category has a fixed key template; an unrecognized category is
/// unrepresentable rather than a silent fallback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    /// Organization/school logo, one per entity
    Logo,
    /// Page cover image, one per entity
    Cover,
    /// Gallery image, many per entity
    Gallery,
    /// License scan, one per entity
    License,
    /// Free-form document attachment
    Document,
    /// Staging area for multi-step uploads
    Temp,
}

impl AssetCategory {
    /// Leading path segment of keys in this category.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Logo => "logos",
            Self::Cover => "covers",
            Self::Gallery => "galleries",
            Self::License => "licenses",
            Self::Document => "documents",
            Self::Temp => "temp",
        }
    }

    /// Whether assets in this category get thumbnail variants.
    #[must_use]
    pub const fn is_image(self) -> bool {
        matches!(self, Self::Logo | Self::Cover | Self::Gallery)
    }

    /// Resolves a category from the leading path segment of `key`.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let segment = key.split('/').next()?;
        [
            Self::Logo,
            Self::Cover,
            Self::Gallery,
            Self::License,
            Self::Document,
            Self::Temp,
        ]
        .into_iter()
        .find(|category| category.prefix() == segment)
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for AssetCategory {
    type Err = KeyError;

    /// Parses the category tag used by the upload boundary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logo" => Ok(Self::Logo),
            "cover" => Ok(Self::Cover),
            "gallery" => Ok(Self::Gallery),
            "license" => Ok(Self::License),
            "document" => Ok(Self::Document),
            "temp" => Ok(Self::Temp),
            other => Err(KeyError::UnknownCategory(other.to_string())),
        }
    }
}

/// Restricts a filename to `[A-Za-z0-9._-]`, collapsing everything else
/// to `_` and stripping leading dots (no hidden files).
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .trim()
        .trim_start_matches('.')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Extension of `filename` (after the last dot), when one is present.
fn extension(filename: &str) -> Option<&str> {
    match filename.rsplit_once('.') {
        Some((name, ext)) if !name.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

fn validate_entity_id(entity_id: &str) -> Result<&str, KeyError> {
    let trimmed = entity_id.trim();
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
    {
        return Err(KeyError::InvalidEntityId(entity_id.to_string()));
    }
    Ok(trimmed)
}

/// Builds the storage key for an upload, using the current time for
/// timestamped templates.
///
/// # Errors
///
/// Returns `KeyError` when the entity id or filename is malformed.
pub fn build_key(
    category: AssetCategory,
    entity_id: &str,
    filename: &str,
) -> Result<String, KeyError> {
    build_key_at(category, entity_id, filename, Utc::now())
}

/// Builds the storage key for an upload with an explicit timestamp.
///
/// Templates per category:
///
/// | category   | template                                 |
/// |------------|------------------------------------------|
/// | `Logo`     | `logos/{id}/logo.{ext}`                  |
/// | `Cover`    | `covers/{id}/cover.{ext}`                |
/// | `Gallery`  | `galleries/{id}/image_{millis}.{ext}`    |
/// | `License`  | `licenses/{id}/license.{ext}`            |
/// | `Document` | `documents/{id}/{sanitized_name}`        |
/// | `Temp`     | `temp/{upload_id}/{sanitized_filename}`  |
///
/// Extensions are lowercased. Only the `Gallery` template consumes `at`.
///
/// # Errors
///
/// Returns `KeyError` when the entity id is malformed, the filename
/// sanitizes to nothing, or a fixed-name category gets a filename
/// without an extension.
pub fn build_key_at(
    category: AssetCategory,
    entity_id: &str,
    filename: &str,
    at: DateTime<Utc>,
) -> Result<String, KeyError> {
    let entity_id = validate_entity_id(entity_id)?;
    let sanitized = sanitize_filename(filename);
    if sanitized.is_empty() {
        return Err(KeyError::InvalidFilename(filename.to_string()));
    }
    let prefix = category.prefix();

    let key = match category {
        AssetCategory::Logo | AssetCategory::Cover | AssetCategory::License => {
            let ext = extension(&sanitized)
                .ok_or_else(|| KeyError::InvalidFilename(filename.to_string()))?
                .to_ascii_lowercase();
            let stem = match category {
                AssetCategory::Logo => "logo",
                AssetCategory::Cover => "cover",
                _ => "license",
            };
            format!("{prefix}/{entity_id}/{stem}.{ext}")
        }
        AssetCategory::Gallery => {
            let ext = extension(&sanitized)
                .ok_or_else(|| KeyError::InvalidFilename(filename.to_string()))?
                .to_ascii_lowercase();
            format!("{prefix}/{entity_id}/image_{}.{ext}", at.timestamp_millis())
        }
        AssetCategory::Document | AssetCategory::Temp => {
            format!("{prefix}/{entity_id}/{sanitized}")
        }
    };
    Ok(key)
}

fn split_key(key: &str) -> (&str, &str) {
    key.rsplit_once('/').map_or(("", key), |(dir, file)| (dir, file))
}

/// Derives the thumbnail variant key by inserting the marker before the
/// extension, or appending it when the filename has none.
#[must_use]
pub fn derive_thumbnail_key(key: &str) -> String {
    let (dir, filename) = split_key(key);
    let marked = match filename.rsplit_once('.') {
        Some((name, ext)) if !name.is_empty() && !ext.is_empty() => {
            format!("{name}{THUMBNAIL_MARKER}.{ext}")
        }
        _ => format!("{filename}{THUMBNAIL_MARKER}"),
    };
    if dir.is_empty() {
        marked
    } else {
        format!("{dir}/{marked}")
    }
}

/// Whether `key` addresses a thumbnail variant.
#[must_use]
pub fn is_thumbnail_key(key: &str) -> bool {
    let (_, filename) = split_key(key);
    match filename.rsplit_once('.') {
        Some((name, ext)) if !name.is_empty() && !ext.is_empty() => {
            name.ends_with(THUMBNAIL_MARKER)
        }
        _ => filename.ends_with(THUMBNAIL_MARKER),
    }
}

/// Inverse of [`derive_thumbnail_key`]; keys without the marker come
/// back unchanged.
#[must_use]
pub fn original_key_from_thumbnail(key: &str) -> String {
    let (dir, filename) = split_key(key);
    let unmarked = match filename.rsplit_once('.') {
        Some((name, ext)) if !name.is_empty() && !ext.is_empty() => name
            .strip_suffix(THUMBNAIL_MARKER)
            .map(|stem| format!("{stem}.{ext}")),
        _ => filename
            .strip_suffix(THUMBNAIL_MARKER)
            .map(ToString::to_string),
    };
    let Some(unmarked) = unmarked else {
        return key.to_string();
    };
    if dir.is_empty() {
        unmarked
    } else {
        format!("{dir}/{unmarked}")
    }
}

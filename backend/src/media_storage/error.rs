//! Error types for object-store operations

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from the object-store gateway.
///
/// `NotFound` is a distinct kind so call sites never have to inspect
/// error strings to tell "absent" from "unreachable". `exists` and
/// `head_info` absorb it locally; everything else is re-thrown.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object absent (404-class response)
    #[error("object not found: {0}")]
    NotFound(String),

    /// Upstream service error (5xx from the object store)
    #[error("upstream storage error: {0}")]
    Upstream(String),

    /// Network, auth, or other transport failure
    #[error("storage transport error: {0}")]
    Transport(String),

    /// Invalid gateway configuration
    #[error("storage configuration error: {0}")]
    Config(String),
}

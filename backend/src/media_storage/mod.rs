//! S3-compatible object storage for media assets

mod error;
#[cfg(any(test, feature = "test-utils"))]
mod memory;
mod s3;

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

pub use error::{StorageError, StorageResult};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::InMemoryStore;
pub use s3::MediaStorage;

/// Object attributes returned by head requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    /// Object size in bytes
    pub size: i64,
    /// MIME content type, when the store recorded one
    pub content_type: Option<String>,
    /// Last modification time
    pub last_modified: Option<DateTime<Utc>>,
    /// Entity tag
    pub etag: Option<String>,
}

/// Key-addressed object store operations.
///
/// Every call is a network round trip; there is no caching at this
/// layer. `exists` and `head_info` absorb not-found responses into
/// `false`/`None` so callers can tell "absent" from "unreachable";
/// every other failure propagates as a [`StorageError`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads `bytes` at `key`, overwriting any existing object.
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> StorageResult<()>;

    /// Downloads the object at `key`; [`StorageError::NotFound`] when
    /// absent.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Produces a time-limited GET URL for `key` without checking that
    /// the object exists.
    async fn get_signed_url(&self, key: &str, ttl_secs: u64) -> StorageResult<String>;

    /// Removes the object at `key`; removing an absent object is not an
    /// error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Whether an object exists at `key`. `Ok(false)` only on a
    /// not-found response.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Attributes of the object at `key`, `None` when absent.
    async fn head_info(&self, key: &str) -> StorageResult<Option<AssetInfo>>;

    /// Lists all keys under `prefix`.
    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>>;
}

//! In-memory object store double for tests

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::{AssetInfo, ObjectStore, StorageError, StorageResult};

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Bytes,
    content_type: String,
    metadata: HashMap<String, String>,
    last_modified: DateTime<Utc>,
    etag: String,
}

/// In-memory [`ObjectStore`] with operation counters and fault
/// injection, standing in for a live bucket in tests.
pub struct InMemoryStore {
    bucket: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    put_calls: AtomicUsize,
    signed_url_calls: AtomicUsize,
    fail_signing: AtomicBool,
}

impl InMemoryStore {
    /// Creates an empty store scoped to `bucket`.
    #[must_use]
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Mutex::new(BTreeMap::new()),
            put_calls: AtomicUsize::new(0),
            signed_url_calls: AtomicUsize::new(0),
            fail_signing: AtomicBool::new(false),
        }
    }

    /// Number of `put` calls observed.
    #[must_use]
    pub fn put_count(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_signed_url` calls observed.
    #[must_use]
    pub fn signed_url_count(&self) -> usize {
        self.signed_url_calls.load(Ordering::SeqCst)
    }

    /// Makes subsequent `get_signed_url` calls fail with an upstream
    /// error.
    pub fn set_fail_signing(&self, fail: bool) {
        self.fail_signing.store(fail, Ordering::SeqCst);
    }

    /// Whether an object is stored at `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    /// Stored bytes at `key`.
    #[must_use]
    pub fn object_bytes(&self, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|object| object.bytes.clone())
    }

    /// Stored content type at `key`.
    #[must_use]
    pub fn object_content_type(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|object| object.content_type.clone())
    }

    /// Stored metadata map at `key`.
    #[must_use]
    pub fn object_metadata(&self, key: &str) -> Option<HashMap<String, String>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|object| object.metadata.clone())
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> StorageResult<()> {
        let serial = self.put_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
                metadata,
                last_modified: Utc::now(),
                etag: format!("\"etag-{serial}\""),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|object| object.bytes.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn get_signed_url(&self, key: &str, ttl_secs: u64) -> StorageResult<String> {
        let serial = self.signed_url_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(StorageError::Upstream(
                "injected signing failure".to_string(),
            ));
        }
        Ok(format!(
            "https://s3.local/{}/{key}?X-Amz-Algorithm=AWS4-HMAC-SHA256\
             &X-Amz-Date={}&X-Amz-Expires={ttl_secs}&X-Amz-Signature=mem{serial}",
            self.bucket,
            Utc::now().format("%Y%m%dT%H%M%SZ"),
        ))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn head_info(&self, key: &str) -> StorageResult<Option<AssetInfo>> {
        Ok(self.objects.lock().unwrap().get(key).map(|object| {
            AssetInfo {
                size: i64::try_from(object.bytes.len()).unwrap_or(i64::MAX),
                content_type: Some(object.content_type.clone()),
                last_modified: Some(object.last_modified),
                etag: Some(object.etag.clone()),
            }
        }))
    }

    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

//! Signed URL issuance and refresh

use std::sync::Arc;

use tracing::warn;

use crate::media_storage::{ObjectStore, StorageResult};

/// Issues and refreshes time-limited access URLs for stored assets.
pub struct SignedUrlService {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    ttl_secs: u64,
}

impl SignedUrlService {
    /// Creates a service over `store`, scoped to `bucket` for key
    /// extraction, signing with `ttl_secs` per URL.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String, ttl_secs: u64) -> Self {
        Self {
            store,
            bucket,
            ttl_secs,
        }
    }

    /// Issues a fresh signed URL for `key`.
    ///
    /// # Errors
    ///
    /// Propagates any [`crate::media_storage::StorageError`] from the
    /// underlying store.
    pub async fn issue(&self, key: &str) -> StorageResult<String> {
        self.store.get_signed_url(key, self.ttl_secs).await
    }

    /// Re-signs `url_or_key`, accepting either a bare key or a full URL
    /// whose key can be extracted.
    ///
    /// Degrades instead of failing: when the key cannot be extracted or
    /// the store refuses to sign, the input comes back unchanged so the
    /// caller keeps whatever access it already had.
    pub async fn refresh(&self, url_or_key: &str) -> String {
        let key = if url_or_key.contains("://") {
            match signed_url::extract_key(url_or_key, &self.bucket) {
                Some(key) => key,
                None => {
                    warn!(input = %url_or_key, "could not extract key from url, returning input");
                    return url_or_key.to_string();
                }
            }
        } else {
            url_or_key.to_string()
        };

        match self.issue(&key).await {
            Ok(url) => url,
            Err(e) => {
                warn!(key = %key, error = %e, "signing failed, returning input unchanged");
                url_or_key.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_storage::InMemoryStore;

    fn service() -> (SignedUrlService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new("test-media"));
        (
            SignedUrlService::new(store.clone(), "test-media".to_string(), 3600),
            store,
        )
    }

    #[tokio::test]
    async fn refresh_accepts_a_bare_key() {
        let (service, store) = service();

        let url = service.refresh("logos/42/logo.png").await;
        assert!(url.contains("logos/42/logo.png"));
        assert!(url.contains("X-Amz-Signature="));
        assert_eq!(store.signed_url_count(), 1);
    }

    #[tokio::test]
    async fn refresh_extracts_the_key_from_a_full_url() {
        let (service, _store) = service();

        let stale = "https://s3.local/test-media/covers/7/cover.jpg?\
                     X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Signature=old";
        let url = service.refresh(stale).await;
        assert!(url.contains("covers/7/cover.jpg"));
        assert!(!url.contains("X-Amz-Signature=old"));
    }

    #[tokio::test]
    async fn unextractable_url_comes_back_unchanged() {
        let (service, store) = service();

        let foreign = "https://elsewhere.example/other-bucket/a.png";
        assert_eq!(service.refresh(foreign).await, foreign);
        assert_eq!(store.signed_url_count(), 0);
    }

    #[tokio::test]
    async fn issued_urls_carry_the_configured_ttl() {
        let store = Arc::new(InMemoryStore::new("test-media"));
        let service = SignedUrlService::new(store, "test-media".to_string(), 120);

        let url = service.refresh("logos/42/logo.png").await;
        assert!(url.contains("X-Amz-Expires=120"), "{url}");
    }

    #[tokio::test]
    async fn signing_failure_degrades_to_the_input() {
        let (service, store) = service();
        store.set_fail_signing(true);

        assert_eq!(service.refresh("logos/42/logo.png").await, "logos/42/logo.png");
    }
}

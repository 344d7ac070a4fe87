//! Shared server state

use std::sync::Arc;

use crate::media_storage::ObjectStore;
use crate::signed_urls::SignedUrlService;
use crate::thumbnails::ThumbnailPipeline;

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Object-store gateway
    pub store: Arc<dyn ObjectStore>,
    /// Thumbnail generation pipeline
    pub thumbnails: Arc<ThumbnailPipeline>,
    /// Signed URL issuance and refresh
    pub signed_urls: Arc<SignedUrlService>,
}

impl AppState {
    /// Wires up the handler state over one object store, signing URLs
    /// with `signed_url_ttl_secs`.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String, signed_url_ttl_secs: u64) -> Self {
        Self {
            thumbnails: Arc::new(ThumbnailPipeline::new(store.clone())),
            signed_urls: Arc::new(SignedUrlService::new(
                store.clone(),
                bucket,
                signed_url_ttl_secs,
            )),
            store,
        }
    }
}

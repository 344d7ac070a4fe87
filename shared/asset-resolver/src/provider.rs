//! The URL-refresh boundary consumed by the resolver.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for URL providers.
pub type ProviderResult = Result<String, ProviderError>;

/// Errors from the URL-refresh boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure reaching the refresh endpoint
    #[error("refresh request failed: {0}")]
    Transport(String),
    /// Refresh endpoint answered with a non-success status
    #[error("refresh request rejected with status {0}")]
    Rejected(u16),
}

/// Boundary that exchanges a storage key for a fresh signed URL.
#[async_trait]
pub trait UrlProvider: Send + Sync {
    /// Requests a fresh signed URL for `key`.
    async fn fresh_url(&self, key: &str) -> ProviderResult;
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    key: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    url: String,
}

/// [`UrlProvider`] backed by the backend's `POST /v1/assets/refresh`
/// route.
pub struct HttpUrlProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUrlProvider {
    /// Creates a provider posting to `<base_url>/v1/assets/refresh`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/v1/assets/refresh", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl UrlProvider for HttpUrlProvider {
    async fn fresh_url(&self, key: &str) -> ProviderResult {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RefreshRequest { key })
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Rejected(response.status().as_u16()));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(body.url)
    }
}

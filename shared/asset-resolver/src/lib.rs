//! Client-side asset URL resolution
//!
//! Page components hand the resolver whatever value they hold — a bare
//! storage key, a plain URL, or a signed URL — and get back a renderable
//! URL (or nothing, rather than a broken image). Resolutions for the same
//! key are coalesced into one in-flight request, resolved values land in a
//! bounded LRU cache, and render-time load failures trigger at most two
//! refreshes before the resolver gives up and keeps the last URL.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

mod provider;
mod state;

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use tokio::sync::broadcast;
use tracing::{debug, warn};

pub use provider::{HttpUrlProvider, ProviderError, ProviderResult, UrlProvider};
pub use state::{ResolveState, MAX_LOAD_RETRIES};

/// Default capacity of the per-key state cache.
const DEFAULT_CACHE_CAPACITY: usize = 256;
/// Channel capacity for waiters coalesced onto one in-flight request.
const WAITER_CAPACITY: usize = 16;

/// How an input value held by a component is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Bare storage key: no scheme, has a path separator or an extension
    BareKey,
    /// Ordinary absolute or root-relative URL, used as-is
    PlainUrl,
    /// Signed URL with SigV4 query parameters
    SignedUrl,
    /// Neither a key nor a usable URL; nothing is rendered
    Unusable,
}

/// Classifies an input value.
#[must_use]
pub fn classify(input: &str) -> InputKind {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return InputKind::Unusable;
    }
    if signed_url::is_signed_url(trimmed) {
        return InputKind::SignedUrl;
    }
    if trimmed.contains("://") || trimmed.starts_with('/') {
        return InputKind::PlainUrl;
    }
    let has_extension = trimmed
        .rsplit_once('.')
        .is_some_and(|(name, ext)| !name.is_empty() && !ext.is_empty());
    if trimmed.contains('/') || has_extension {
        return InputKind::BareKey;
    }
    InputKind::Unusable
}

/// What a caller should do after the locked state inspection.
enum Plan {
    /// Answer straight from cache.
    Done(Option<String>),
    /// Attach to the request already in flight for this key.
    Wait(broadcast::Receiver<Option<String>>),
    /// This caller leads the request; peers attach to `tx`.
    Lead {
        tx: broadcast::Sender<Option<String>>,
        fallback: Option<String>,
    },
}

/// Resolves keys and stale URLs to renderable URLs through a
/// [`UrlProvider`].
///
/// Explicitly constructed and owned by the embedding component's
/// lifecycle; the cache is bounded rather than a process-global map.
pub struct AssetResolver<P> {
    provider: P,
    bucket: String,
    entries: Mutex<LruCache<String, ResolveState>>,
}

impl<P: UrlProvider> AssetResolver<P> {
    /// Creates a resolver for `bucket` with the default cache capacity.
    ///
    /// # Panics
    ///
    /// Never; the default capacity is non-zero.
    #[must_use]
    pub fn new(provider: P, bucket: impl Into<String>) -> Self {
        Self::with_capacity(
            provider,
            bucket,
            NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).expect("capacity is non-zero"),
        )
    }

    /// Creates a resolver with an explicit cache capacity.
    #[must_use]
    pub fn with_capacity(provider: P, bucket: impl Into<String>, capacity: NonZeroUsize) -> Self {
        Self {
            provider,
            bucket: bucket.into(),
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Resolves whatever value a component holds into a renderable URL.
    ///
    /// `None` means "render nothing": the input cannot produce a usable
    /// URL. A near-expiry signed URL degrades to itself when no better
    /// URL can be obtained, so callers keep working with a stale value.
    pub async fn resolve(&self, input: &str) -> Option<String> {
        match classify(input) {
            InputKind::Unusable => None,
            InputKind::PlainUrl => Some(input.to_string()),
            InputKind::SignedUrl => {
                if !signed_url::is_expiring_soon(input) {
                    return Some(input.to_string());
                }
                let Some(key) = signed_url::extract_key(input, &self.bucket) else {
                    return Some(input.to_string());
                };
                debug!(key = %key, "signed url expiring soon, refreshing");
                Some(
                    self.fetch(&key, Some(input))
                        .await
                        .unwrap_or_else(|| input.to_string()),
                )
            }
            InputKind::BareKey => self.fetch(input, None).await,
        }
    }

    /// Reports that the resolved URL failed to load at render time.
    ///
    /// While the failing URL is signed and retries remain, a replacement
    /// URL is fetched and returned; `None` means "keep the last URL and
    /// stop" — either retries are exhausted or a refresh could not help.
    /// Never panics or errors into the rendering path.
    pub async fn report_load_failure(&self, input: &str, current_url: &str) -> Option<String> {
        if !signed_url::is_signed_url(current_url) {
            return None;
        }
        let key = match classify(input) {
            InputKind::BareKey => input.to_string(),
            _ => signed_url::extract_key(current_url, &self.bucket)
                .or_else(|| signed_url::extract_key(input, &self.bucket))?,
        };

        let attempts = {
            let mut entries = self.entries.lock().expect("resolver lock poisoned");
            match entries.get(&key).cloned() {
                Some(ResolveState::GaveUp(_)) => return None,
                Some(ResolveState::Retrying { last, attempts }) => {
                    if attempts >= MAX_LOAD_RETRIES {
                        debug!(key = %key, "load retries exhausted, giving up");
                        entries.put(key.clone(), ResolveState::GaveUp(last));
                        return None;
                    }
                    entries.put(
                        key.clone(),
                        ResolveState::Retrying {
                            last,
                            attempts: attempts + 1,
                        },
                    );
                    attempts + 1
                }
                _ => {
                    entries.put(
                        key.clone(),
                        ResolveState::Retrying {
                            last: current_url.to_string(),
                            attempts: 1,
                        },
                    );
                    1
                }
            }
        };

        match self.provider.fresh_url(&key).await {
            Ok(url) => {
                debug!(key = %key, attempt = attempts, "load-failure refresh succeeded");
                let mut entries = self.entries.lock().expect("resolver lock poisoned");
                entries.put(
                    key,
                    ResolveState::Retrying {
                        last: url.clone(),
                        attempts,
                    },
                );
                Some(url)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "load-failure refresh failed, keeping last url");
                None
            }
        }
    }

    /// Resolves `key` through the provider, coalescing concurrent callers
    /// onto one in-flight request and answering repeats from the cache.
    async fn fetch(&self, key: &str, stale: Option<&str>) -> Option<String> {
        let plan = {
            let mut entries = self.entries.lock().expect("resolver lock poisoned");
            match entries.get(key).cloned() {
                None => {
                    let (tx, _) = broadcast::channel(WAITER_CAPACITY);
                    entries.put(key.to_string(), ResolveState::Resolving(tx.clone()));
                    Plan::Lead {
                        tx,
                        fallback: stale.map(ToString::to_string),
                    }
                }
                Some(
                    ResolveState::Resolving(tx) | ResolveState::Refreshing { tx, .. },
                ) => Plan::Wait(tx.subscribe()),
                Some(ResolveState::Resolved(url)) => {
                    if signed_url::is_expiring_soon(&url) {
                        let (tx, _) = broadcast::channel(WAITER_CAPACITY);
                        entries.put(
                            key.to_string(),
                            ResolveState::Refreshing {
                                stale: url.clone(),
                                tx: tx.clone(),
                            },
                        );
                        Plan::Lead {
                            tx,
                            fallback: Some(url),
                        }
                    } else {
                        Plan::Done(Some(url))
                    }
                }
                Some(
                    ResolveState::Retrying { last, .. } | ResolveState::GaveUp(last),
                ) => Plan::Done(Some(last)),
            }
        };

        match plan {
            Plan::Done(result) => result,
            Plan::Wait(mut rx) => rx.recv().await.ok().flatten(),
            Plan::Lead { tx, fallback } => {
                let resolved = match self.provider.fresh_url(key).await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!(key = %key, error = %e, "resolution failed");
                        fallback
                    }
                };
                {
                    let mut entries = self.entries.lock().expect("resolver lock poisoned");
                    match &resolved {
                        Some(url) => {
                            entries.put(key.to_string(), ResolveState::Resolved(url.clone()));
                        }
                        // A failed first resolution leaves no entry, so a
                        // later render attempt can try again.
                        None => {
                            entries.pop(key);
                        }
                    }
                }
                let _ = tx.send(resolved.clone());
                resolved
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_inputs() {
        assert_eq!(classify("logos/42/logo.webp"), InputKind::BareKey);
        assert_eq!(classify("logo.webp"), InputKind::BareKey);
        assert_eq!(classify("/static/placeholder.png"), InputKind::PlainUrl);
        assert_eq!(
            classify("https://cdn.example.test/logo.png"),
            InputKind::PlainUrl
        );
        assert_eq!(
            classify(
                "https://s3.example.test/b/k.png?X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Signature=ff"
            ),
            InputKind::SignedUrl
        );
        assert_eq!(classify(""), InputKind::Unusable);
        assert_eq!(classify("just-words"), InputKind::Unusable);
    }
}

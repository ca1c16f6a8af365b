//! Caching module
//!
//! Memoizes raw provider responses for a fixed freshness window.

use crate::config::CacheSettings;
use crate::providers::{ProviderError, ProviderKind, ProviderRequest};
use moka::future::Cache;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Where a cached lookup was answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

/// Cache for raw provider responses
///
/// Entries expire `ttl` after insertion; the entry count is bounded, and
/// failed fetches are never stored.
#[derive(Clone)]
pub struct ResultCache {
    cache: Cache<String, Arc<Value>>,
    ttl: Duration,
}

impl ResultCache {
    /// Create a new result cache with specified TTL
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();

        Self { cache, ttl }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(Duration::from_secs(settings.ttl_seconds), settings.max_capacity)
    }

    /// Get a cached response
    pub async fn get(&self, key: &str) -> Option<Arc<Value>> {
        self.cache.get(key).await
    }

    /// Return the cached response for `key`, or run `fetch` and store its
    /// result. Concurrent misses on the same key share one fetch.
    pub async fn get_or_fetch<F>(
        &self,
        key: String,
        fetch: F,
    ) -> Result<(Arc<Value>, CacheStatus), ProviderError>
    where
        F: Future<Output = Result<Value, ProviderError>>,
    {
        if let Some(value) = self.get(&key).await {
            return Ok((value, CacheStatus::Hit));
        }

        self.cache
            .try_get_with(key, async move { fetch.await.map(Arc::new) })
            .await
            .map(|value| (value, CacheStatus::Miss))
            .map_err(|e| (*e).clone())
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::default())
    }
}

/// Generate a cache key for a provider request
///
/// Covers the provider, method, URL, query parameters and body. Headers are
/// left out so API keys never end up in key material.
pub fn request_cache_key(provider: ProviderKind, request: &ProviderRequest) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(provider.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(request.method.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(request.url.as_bytes());
    for (key, value) in &request.params {
        hasher.update([0u8]);
        hasher.update(key.as_bytes());
        hasher.update([b'=']);
        hasher.update(value.as_bytes());
    }
    if let Some(ref body) = request.body {
        hasher.update([0u8]);
        hasher.update(body.to_string().as_bytes());
    }

    format!("{:x}", hasher.finalize())
}

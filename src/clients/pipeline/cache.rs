use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{Next, Policy};
use crate::clients::errors::ApiError;
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;

#[derive(Debug)]
struct CacheEntry {
    response: HttpResponse,
    created_at: Instant,
}

/// In-memory store of successful GET responses.
///
/// Entries are keyed by `METHOD:url-with-query`, expire after a fixed TTL,
/// and are evicted when read stale. Each pipeline owns its own cache.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    /// Creates an empty cache with the given time-to-live.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the cache key for a request.
    #[must_use]
    pub fn key_for(request: &HttpRequest) -> String {
        format!("{}:{}", request.method, request.url_with_params())
    }

    /// Returns a clone of a fresh entry, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<HttpResponse> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => Some(entry.response.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores a response, replacing any previous entry for the key.
    pub fn insert(&self, key: String, response: HttpResponse) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key,
                CacheEntry {
                    response,
                    created_at: Instant::now(),
                },
            );
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the number of entries that have not expired.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| entry.created_at.elapsed() < self.ttl)
            .count()
    }

    /// Returns `true` if no live entry is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serves fresh GET responses from a [`ResponseCache`].
///
/// Requests carrying `Cache-Control: no-cache` bypass the cache entirely.
/// Only 2xx responses are stored.
#[derive(Clone, Debug)]
pub struct CachePolicy {
    cache: Arc<ResponseCache>,
}

impl CachePolicy {
    /// Creates the policy over a shared cache.
    #[must_use]
    pub const fn new(cache: Arc<ResponseCache>) -> Self {
        Self { cache }
    }
}

fn is_no_cache(request: &HttpRequest) -> bool {
    request.header("cache-control").is_some_and(|value| {
        value
            .split(',')
            .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
    })
}

#[async_trait]
impl Policy for CachePolicy {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn handle(&self, request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, ApiError> {
        if request.method != HttpMethod::Get || is_no_cache(&request) {
            return next.run(request).await;
        }

        let key = ResponseCache::key_for(&request);
        if let Some(response) = self.cache.get(&key) {
            tracing::debug!(key = %key, "Cache hit");
            return Ok(response);
        }
        tracing::debug!(key = %key, "Cache miss");

        let response = next.run(request).await?;
        if response.is_ok() {
            self.cache.insert(key, response.clone());
        }
        Ok(response)
    }
}

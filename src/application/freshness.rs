//! Cache-or-fetch decisions shared by every sports resource.

use std::{future::Future, sync::Arc, time::Duration};

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::application::{repos::CacheRepo, upstream::UpstreamError};
use crate::domain::entities::{CacheEntry, version_tag};

/// Values the coordinator can persist as JSON blobs.
pub trait CachePayload: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Empty results are never written to the cache.
    fn is_empty_result(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Served from a live cache entry.
    Fresh,
    /// Fetched from upstream and written back.
    Refreshed,
    /// Upstream failed; an expired entry was served instead.
    Stale,
    /// Fetched from upstream but not persisted.
    Uncached,
}

impl Freshness {
    pub fn as_str(self) -> &'static str {
        match self {
            Freshness::Fresh => "fresh",
            Freshness::Refreshed => "refreshed",
            Freshness::Stale => "stale",
            Freshness::Uncached => "uncached",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedValue<T> {
    pub value: T,
    pub etag: String,
    pub last_modified: OffsetDateTime,
    pub freshness: Freshness,
}

impl<T> CachedValue<T> {
    fn uncached(value: T) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            value,
            etag: version_tag(now),
            last_modified: now,
            freshness: Freshness::Uncached,
        }
    }
}

#[derive(Debug, Error)]
pub enum FreshnessError {
    #[error("`{key}` is not cached and the upstream refresh failed")]
    Unavailable {
        key: String,
        #[source]
        source: UpstreamError,
    },
}

#[derive(Clone)]
pub struct FreshnessCoordinator {
    cache: Arc<dyn CacheRepo>,
}

impl FreshnessCoordinator {
    pub fn new(cache: Arc<dyn CacheRepo>) -> Self {
        Self { cache }
    }

    /// Serve `key` from cache while fresh, otherwise refresh it through `fetch`.
    pub async fn cached_fetch<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<CachedValue<T>, FreshnessError>
    where
        T: CachePayload,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, UpstreamError>> + Send,
    {
        match self.cache.get(key).await {
            Ok(Some(entry)) => {
                if let Some(value) = decode::<T>(&entry) {
                    counter!("libero_cache_fresh_total").increment(1);
                    return Ok(CachedValue {
                        value,
                        etag: entry.etag,
                        last_modified: entry.last_modified,
                        freshness: Freshness::Fresh,
                    });
                }
            }
            Ok(None) => {}
            Err(err) => warn!(
                target = "libero::freshness",
                key,
                error = %err,
                "cache read failed, treating as miss"
            ),
        }

        self.refresh(key, ttl, fetch).await
    }

    /// Fetch `key` from upstream regardless of what is cached.
    ///
    /// Falls back to the stored entry, even an expired one, when the fetch
    /// fails or comes back empty.
    pub async fn refresh<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<CachedValue<T>, FreshnessError>
    where
        T: CachePayload,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, UpstreamError>> + Send,
    {
        match fetch().await {
            Ok(value) if value.is_empty_result() => {
                counter!("libero_cache_empty_skipped_total").increment(1);
                debug!(
                    target = "libero::freshness",
                    key, "upstream returned an empty result, not caching it"
                );
                match self.fallback::<T>(key).await {
                    Some(previous) => Ok(previous),
                    None => Ok(CachedValue::uncached(value)),
                }
            }
            Ok(value) => Ok(self.store(key, ttl, value).await),
            Err(err) => {
                warn!(
                    target = "libero::freshness",
                    key,
                    kind = err.kind(),
                    error = %err,
                    "upstream refresh failed"
                );
                match self.fallback::<T>(key).await {
                    Some(previous) => Ok(previous),
                    None => Err(FreshnessError::Unavailable {
                        key: key.to_string(),
                        source: err,
                    }),
                }
            }
        }
    }

    /// Fresh entry whose etag matches one of `candidates`; `*` matches any.
    pub async fn current_version(&self, key: &str, candidates: &[String]) -> Option<CacheEntry> {
        for candidate in candidates {
            let lookup = if candidate == "*" {
                self.cache.get(key).await
            } else {
                self.cache.get_if_version_matches(key, candidate).await
            };
            match lookup {
                Ok(Some(entry)) => return Some(entry),
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        target = "libero::freshness",
                        key,
                        error = %err,
                        "version lookup failed"
                    );
                    return None;
                }
            }
        }
        None
    }

    async fn store<T: CachePayload>(&self, key: &str, ttl: Duration, value: T) -> CachedValue<T> {
        let bytes = match serde_json::to_vec(&value) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(
                    target = "libero::freshness",
                    key,
                    error = %err,
                    "failed to encode payload for caching"
                );
                return CachedValue::uncached(value);
            }
        };

        match self.cache.set(key, bytes, ttl).await {
            Ok(entry) => {
                counter!("libero_cache_refreshed_total").increment(1);
                CachedValue {
                    value,
                    etag: entry.etag,
                    last_modified: entry.last_modified,
                    freshness: Freshness::Refreshed,
                }
            }
            Err(err) => {
                warn!(
                    target = "libero::freshness",
                    key,
                    error = %err,
                    "cache write failed, serving uncached value"
                );
                CachedValue::uncached(value)
            }
        }
    }

    async fn fallback<T: CachePayload>(&self, key: &str) -> Option<CachedValue<T>> {
        let entry = match self.cache.get_ignoring_expiry(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(err) => {
                warn!(
                    target = "libero::freshness",
                    key,
                    error = %err,
                    "stale cache read failed"
                );
                return None;
            }
        };

        let value = decode::<T>(&entry)?;
        let freshness = if entry.is_fresh_at(OffsetDateTime::now_utc()) {
            Freshness::Fresh
        } else {
            counter!("libero_cache_stale_total").increment(1);
            Freshness::Stale
        };

        Some(CachedValue {
            value,
            etag: entry.etag,
            last_modified: entry.last_modified,
            freshness,
        })
    }
}

fn decode<T: CachePayload>(entry: &CacheEntry) -> Option<T> {
    match serde_json::from_slice(&entry.value) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                target = "libero::freshness",
                key = entry.key.as_str(),
                error = %err,
                "cached payload could not be decoded"
            );
            None
        }
    }
}

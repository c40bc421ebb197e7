//! Repository traits describing persistence adapters.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{CacheEntry, CachedFixturesRecord};
use crate::domain::types::DataKind;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Generic blob cache with per-entry TTL and version metadata.
///
/// Misses are `Ok(None)`; storage failures are always surfaced as `Err`.
#[async_trait]
pub trait CacheRepo: Send + Sync {
    /// Entry for `key` only while `expires_at > now`.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, RepoError>;

    /// Most recent entry for `key`, fresh or not.
    async fn get_ignoring_expiry(&self, key: &str) -> Result<Option<CacheEntry>, RepoError>;

    /// Fresh entry for `key` whose stored etag equals `etag`.
    async fn get_if_version_matches(
        &self,
        key: &str,
        etag: &str,
    ) -> Result<Option<CacheEntry>, RepoError>;

    /// Upsert `value` under a newly generated version token.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration)
    -> Result<CacheEntry, RepoError>;

    /// Upsert every field of `entry`; `created_at` survives an overwrite.
    async fn set_with_metadata(&self, entry: &CacheEntry) -> Result<(), RepoError>;

    /// Replace only the version token and last-modified stamp. An empty
    /// `etag` is replaced by a generated one. `NotFound` when `key` is absent.
    async fn update_version(&self, key: &str, etag: &str) -> Result<(), RepoError>;

    /// Delete entries with `expires_at < cutoff`, returning how many went.
    async fn sweep_expired_entries(&self, cutoff: OffsetDateTime) -> Result<u64, RepoError>;
}

/// Typed cache keyed by `(competition_code, data_kind)`.
#[async_trait]
pub trait FixturesCacheRepo: Send + Sync {
    async fn get_cached_fixtures(
        &self,
        competition_code: &str,
        kind: DataKind,
    ) -> Result<Option<CachedFixturesRecord>, RepoError>;

    async fn get_cached_fixtures_ignoring_expiry(
        &self,
        competition_code: &str,
        kind: DataKind,
    ) -> Result<Option<CachedFixturesRecord>, RepoError>;

    async fn store_cached_fixtures(
        &self,
        competition_code: &str,
        kind: DataKind,
        data: serde_json::Value,
        ttl: Duration,
    ) -> Result<(), RepoError>;

    /// Every kind stored for one competition regardless of freshness.
    async fn list_competition_fixtures(
        &self,
        competition_code: &str,
    ) -> Result<Vec<CachedFixturesRecord>, RepoError>;

    async fn sweep_expired_fixtures(&self, cutoff: OffsetDateTime) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}

//! Domain entities mirrored from persistent storage.

use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;

use super::types::DataKind;

/// Opaque version token derived from the write instant.
pub fn version_tag(at: OffsetDateTime) -> String {
    at.unix_timestamp_nanos().to_string()
}

/// Row of the generic key/value cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub etag: String,
    pub expires_at: OffsetDateTime,
    pub last_modified: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl CacheEntry {
    /// Entry written at `now` that stays fresh for `ttl`.
    pub fn fresh(key: impl Into<String>, value: Vec<u8>, ttl: Duration, now: OffsetDateTime) -> Self {
        Self {
            key: key.into(),
            value,
            etag: version_tag(now),
            expires_at: now + ttl,
            last_modified: now,
            created_at: now,
        }
    }

    pub fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at > now
    }
}

/// Row of the typed per-competition cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedFixturesRecord {
    pub competition_code: String,
    pub data_kind: DataKind,
    pub data: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl CachedFixturesRecord {
    pub fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at > now
    }
}

use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{CacheRepo, RepoError},
    domain::entities::{CacheEntry, version_tag},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CacheEntryRow {
    key: String,
    value: Vec<u8>,
    etag: String,
    expires_at: OffsetDateTime,
    last_modified: OffsetDateTime,
    created_at: OffsetDateTime,
}

impl From<CacheEntryRow> for CacheEntry {
    fn from(row: CacheEntryRow) -> Self {
        Self {
            key: row.key,
            value: row.value,
            etag: row.etag,
            expires_at: row.expires_at,
            last_modified: row.last_modified,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CacheRepo for PostgresRepositories {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, RepoError> {
        let row = sqlx::query_as::<_, CacheEntryRow>(
            r#"
            SELECT key, value, etag, expires_at, last_modified, created_at
            FROM cache_entries
            WHERE key = $1 AND expires_at > $2
            "#,
        )
        .bind(key)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CacheEntry::from))
    }

    async fn get_ignoring_expiry(&self, key: &str) -> Result<Option<CacheEntry>, RepoError> {
        let row = sqlx::query_as::<_, CacheEntryRow>(
            r#"
            SELECT key, value, etag, expires_at, last_modified, created_at
            FROM cache_entries
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CacheEntry::from))
    }

    async fn get_if_version_matches(
        &self,
        key: &str,
        etag: &str,
    ) -> Result<Option<CacheEntry>, RepoError> {
        let row = sqlx::query_as::<_, CacheEntryRow>(
            r#"
            SELECT key, value, etag, expires_at, last_modified, created_at
            FROM cache_entries
            WHERE key = $1 AND etag = $2 AND expires_at > $3
            "#,
        )
        .bind(key)
        .bind(etag)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CacheEntry::from))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<CacheEntry, RepoError> {
        let entry = CacheEntry::fresh(key, value, ttl, OffsetDateTime::now_utc());

        let row = sqlx::query_as::<_, CacheEntryRow>(
            r#"
            INSERT INTO cache_entries (key, value, etag, expires_at, last_modified, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                etag = EXCLUDED.etag,
                expires_at = EXCLUDED.expires_at,
                last_modified = EXCLUDED.last_modified
            RETURNING key, value, etag, expires_at, last_modified, created_at
            "#,
        )
        .bind(&entry.key)
        .bind(entry.value.as_slice())
        .bind(&entry.etag)
        .bind(entry.expires_at)
        .bind(entry.last_modified)
        .bind(entry.created_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(CacheEntry::from(row))
    }

    async fn set_with_metadata(&self, entry: &CacheEntry) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, value, etag, expires_at, last_modified, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                etag = EXCLUDED.etag,
                expires_at = EXCLUDED.expires_at,
                last_modified = EXCLUDED.last_modified
            "#,
        )
        .bind(&entry.key)
        .bind(entry.value.as_slice())
        .bind(&entry.etag)
        .bind(entry.expires_at)
        .bind(entry.last_modified)
        .bind(entry.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update_version(&self, key: &str, etag: &str) -> Result<(), RepoError> {
        let now = OffsetDateTime::now_utc();
        let etag = if etag.is_empty() {
            version_tag(now)
        } else {
            etag.to_string()
        };

        let result = sqlx::query(
            r#"
            UPDATE cache_entries
            SET etag = $2, last_modified = $3
            WHERE key = $1
            "#,
        )
        .bind(key)
        .bind(&etag)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn sweep_expired_entries(&self, cutoff: OffsetDateTime) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at < $1")
            .bind(cutoff)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

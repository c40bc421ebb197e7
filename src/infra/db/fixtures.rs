use std::time::Duration;

use async_trait::async_trait;
use sqlx::types::Json;
use time::OffsetDateTime;

use crate::{
    application::repos::{FixturesCacheRepo, RepoError},
    domain::{entities::CachedFixturesRecord, types::DataKind},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CachedFixturesRow {
    competition_code: String,
    data_kind: String,
    data: Json<serde_json::Value>,
    expires_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<CachedFixturesRow> for CachedFixturesRecord {
    type Error = RepoError;

    fn try_from(row: CachedFixturesRow) -> Result<Self, Self::Error> {
        let data_kind = row
            .data_kind
            .parse::<DataKind>()
            .map_err(|err| RepoError::Integrity {
                message: err.to_string(),
            })?;

        Ok(Self {
            competition_code: row.competition_code,
            data_kind,
            data: row.data.0,
            expires_at: row.expires_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl FixturesCacheRepo for PostgresRepositories {
    async fn get_cached_fixtures(
        &self,
        competition_code: &str,
        kind: DataKind,
    ) -> Result<Option<CachedFixturesRecord>, RepoError> {
        let row = sqlx::query_as::<_, CachedFixturesRow>(
            r#"
            SELECT competition_code, data_kind, data, expires_at, updated_at
            FROM competition_fixtures_cache
            WHERE competition_code = $1 AND data_kind = $2 AND expires_at > $3
            "#,
        )
        .bind(competition_code)
        .bind(kind.as_str())
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(CachedFixturesRecord::try_from).transpose()
    }

    async fn get_cached_fixtures_ignoring_expiry(
        &self,
        competition_code: &str,
        kind: DataKind,
    ) -> Result<Option<CachedFixturesRecord>, RepoError> {
        let row = sqlx::query_as::<_, CachedFixturesRow>(
            r#"
            SELECT competition_code, data_kind, data, expires_at, updated_at
            FROM competition_fixtures_cache
            WHERE competition_code = $1 AND data_kind = $2
            "#,
        )
        .bind(competition_code)
        .bind(kind.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(CachedFixturesRecord::try_from).transpose()
    }

    async fn store_cached_fixtures(
        &self,
        competition_code: &str,
        kind: DataKind,
        data: serde_json::Value,
        ttl: Duration,
    ) -> Result<(), RepoError> {
        let now = OffsetDateTime::now_utc();

        sqlx::query(
            r#"
            INSERT INTO competition_fixtures_cache
                (competition_code, data_kind, data, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (competition_code, data_kind) DO UPDATE SET
                data = EXCLUDED.data,
                expires_at = EXCLUDED.expires_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(competition_code)
        .bind(kind.as_str())
        .bind(Json(data))
        .bind(now + ttl)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list_competition_fixtures(
        &self,
        competition_code: &str,
    ) -> Result<Vec<CachedFixturesRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CachedFixturesRow>(
            r#"
            SELECT competition_code, data_kind, data, expires_at, updated_at
            FROM competition_fixtures_cache
            WHERE competition_code = $1
            ORDER BY data_kind
            "#,
        )
        .bind(competition_code)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(CachedFixturesRecord::try_from).collect()
    }

    async fn sweep_expired_fixtures(&self, cutoff: OffsetDateTime) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM competition_fixtures_cache WHERE expires_at < $1")
            .bind(cutoff)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

//! Expiry sweep across both cache tables.

use std::{sync::Arc, time::Duration};

use metrics::counter;
use time::OffsetDateTime;
use tracing::info;

use crate::application::repos::{CacheRepo, FixturesCacheRepo, RepoError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub entries: u64,
    pub fixtures: u64,
}

impl SweepReport {
    pub fn total(&self) -> u64 {
        self.entries + self.fixtures
    }
}

#[derive(Clone)]
pub struct CacheSweeper {
    cache: Arc<dyn CacheRepo>,
    fixtures: Arc<dyn FixturesCacheRepo>,
    retention: Duration,
}

impl CacheSweeper {
    /// Rows expired for less than `retention` survive the sweep.
    pub fn new(
        cache: Arc<dyn CacheRepo>,
        fixtures: Arc<dyn FixturesCacheRepo>,
        retention: Duration,
    ) -> Self {
        Self {
            cache,
            fixtures,
            retention,
        }
    }

    pub async fn sweep_expired(&self) -> Result<SweepReport, RepoError> {
        self.sweep_expired_at(OffsetDateTime::now_utc()).await
    }

    pub async fn sweep_expired_at(&self, now: OffsetDateTime) -> Result<SweepReport, RepoError> {
        let cutoff = now - self.retention;
        let entries = self.cache.sweep_expired_entries(cutoff).await?;
        let fixtures = self.fixtures.sweep_expired_fixtures(cutoff).await?;
        let report = SweepReport { entries, fixtures };

        counter!("libero_cache_swept_total").increment(report.total());
        info!(
            target = "libero::maintenance",
            entries = report.entries,
            fixtures = report.fixtures,
            cutoff = %cutoff,
            "expired cache rows swept"
        );

        Ok(report)
    }
}

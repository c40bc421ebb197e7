//! Sports resources bound to their cache keys, TTLs and typed mirrors.

use std::{future::Future, sync::Arc, time::Duration};

use time::{Date, OffsetDateTime};
use tracing::{debug, warn};

use crate::application::{
    freshness::{CachePayload, CachedValue, Freshness, FreshnessCoordinator, FreshnessError},
    repos::{FixturesCacheRepo, RepoError},
    upstream::{SportsProvider, UpstreamError},
};
use crate::domain::{
    competitions::CompetitionCode,
    entities::{CacheEntry, CachedFixturesRecord},
    fixtures::{CompetitionFixtures, FixturesSummary},
    keys::SportsResource,
    standings::{CompetitionScorers, CompetitionStandings},
};

const DEFAULT_TODAY_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_SUMMARY_TTL: Duration = Duration::from_secs(2 * 60 * 60);
const DEFAULT_STANDINGS_TTL: Duration = Duration::from_secs(60 * 60);
const DEFAULT_SCORERS_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub today: Duration,
    pub summary: Duration,
    pub standings: Duration,
    pub scorers: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            today: DEFAULT_TODAY_TTL,
            summary: DEFAULT_SUMMARY_TTL,
            standings: DEFAULT_STANDINGS_TTL,
            scorers: DEFAULT_SCORERS_TTL,
        }
    }
}

impl CachePayload for Vec<CompetitionFixtures> {
    fn is_empty_result(&self) -> bool {
        self.iter().all(|group| group.matches.is_empty())
    }
}

impl CachePayload for FixturesSummary {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

impl CachePayload for CompetitionStandings {
    fn is_empty_result(&self) -> bool {
        self.standings.is_empty()
    }
}

impl CachePayload for CompetitionScorers {
    fn is_empty_result(&self) -> bool {
        self.scorers.is_empty()
    }
}

/// Rows to mirror into the typed competition cache after a refresh.
trait TypedMirror: CachePayload {
    fn mirror_rows(
        &self,
        resource: &SportsResource,
    ) -> Result<Vec<(String, serde_json::Value)>, serde_json::Error> {
        match resource.competition() {
            Some(code) => Ok(vec![(code.to_string(), serde_json::to_value(self)?)]),
            None => Ok(Vec::new()),
        }
    }
}

impl TypedMirror for Vec<CompetitionFixtures> {
    fn mirror_rows(
        &self,
        _resource: &SportsResource,
    ) -> Result<Vec<(String, serde_json::Value)>, serde_json::Error> {
        self.iter()
            .filter(|group| !group.matches.is_empty())
            .map(|group| Ok((group.competition_code.clone(), serde_json::to_value(group)?)))
            .collect()
    }
}

impl TypedMirror for FixturesSummary {}
impl TypedMirror for CompetitionStandings {}
impl TypedMirror for CompetitionScorers {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    /// Serve a fresh entry when present.
    CacheFirst,
    /// Always go upstream; used by the scheduler.
    Refresh,
}

#[derive(Clone)]
pub struct SportsDataService {
    provider: Arc<dyn SportsProvider>,
    coordinator: FreshnessCoordinator,
    fixtures: Arc<dyn FixturesCacheRepo>,
    ttls: CacheTtls,
}

impl SportsDataService {
    pub fn new(
        provider: Arc<dyn SportsProvider>,
        coordinator: FreshnessCoordinator,
        fixtures: Arc<dyn FixturesCacheRepo>,
        ttls: CacheTtls,
    ) -> Self {
        Self {
            provider,
            coordinator,
            fixtures,
            ttls,
        }
    }

    pub async fn todays_fixtures(
        &self,
    ) -> Result<CachedValue<Vec<CompetitionFixtures>>, FreshnessError> {
        self.load_todays_fixtures(today(), Lookup::CacheFirst).await
    }

    pub async fn fixtures_summary(
        &self,
        code: &CompetitionCode,
    ) -> Result<CachedValue<FixturesSummary>, FreshnessError> {
        self.load_fixtures_summary(code, Lookup::CacheFirst).await
    }

    pub async fn standings(
        &self,
        code: &CompetitionCode,
    ) -> Result<CachedValue<CompetitionStandings>, FreshnessError> {
        let provider = self.provider.clone();
        let fetch_code = code.clone();
        self.resolve(
            SportsResource::Standings(code.clone()),
            self.ttls.standings,
            Lookup::CacheFirst,
            move || async move { provider.fetch_standings(&fetch_code).await },
        )
        .await
    }

    pub async fn top_scorers(
        &self,
        code: &CompetitionCode,
    ) -> Result<CachedValue<CompetitionScorers>, FreshnessError> {
        let provider = self.provider.clone();
        let fetch_code = code.clone();
        self.resolve(
            SportsResource::Scorers(code.clone()),
            self.ttls.scorers,
            Lookup::CacheFirst,
            move || async move { provider.fetch_top_scorers(&fetch_code).await },
        )
        .await
    }

    /// Unconditionally refresh today's fixtures.
    pub async fn refresh_todays_fixtures(
        &self,
    ) -> Result<CachedValue<Vec<CompetitionFixtures>>, FreshnessError> {
        self.load_todays_fixtures(today(), Lookup::Refresh).await
    }

    /// Unconditionally refresh the fixtures summary for `code`.
    pub async fn refresh_fixtures_summary(
        &self,
        code: &CompetitionCode,
    ) -> Result<CachedValue<FixturesSummary>, FreshnessError> {
        self.load_fixtures_summary(code, Lookup::Refresh).await
    }

    /// Fresh cache entry for `resource` matching one of the presented etags.
    pub async fn current_version(
        &self,
        resource: &SportsResource,
        candidates: &[String],
    ) -> Option<CacheEntry> {
        if candidates.is_empty() {
            return None;
        }
        self.coordinator
            .current_version(&resource.cache_key(), candidates)
            .await
    }

    /// Everything the typed cache holds for one competition.
    pub async fn competition_cache(
        &self,
        code: &CompetitionCode,
    ) -> Result<Vec<CachedFixturesRecord>, RepoError> {
        self.fixtures.list_competition_fixtures(code.as_str()).await
    }

    async fn load_todays_fixtures(
        &self,
        date: Date,
        lookup: Lookup,
    ) -> Result<CachedValue<Vec<CompetitionFixtures>>, FreshnessError> {
        let provider = self.provider.clone();
        self.resolve(
            SportsResource::TodayFixtures { date },
            self.ttls.today,
            lookup,
            move || async move { provider.fetch_today_fixtures(date).await },
        )
        .await
    }

    async fn load_fixtures_summary(
        &self,
        code: &CompetitionCode,
        lookup: Lookup,
    ) -> Result<CachedValue<FixturesSummary>, FreshnessError> {
        let provider = self.provider.clone();
        let fetch_code = code.clone();
        let date = today();
        self.resolve(
            SportsResource::FixturesSummary(code.clone()),
            self.ttls.summary,
            lookup,
            move || async move { provider.fetch_fixtures_summary(&fetch_code, date).await },
        )
        .await
    }

    async fn resolve<T, F, Fut>(
        &self,
        resource: SportsResource,
        ttl: Duration,
        lookup: Lookup,
        fetch: F,
    ) -> Result<CachedValue<T>, FreshnessError>
    where
        T: TypedMirror,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, UpstreamError>> + Send,
    {
        let key = resource.cache_key();
        let value = match lookup {
            Lookup::CacheFirst => self.coordinator.cached_fetch(&key, ttl, fetch).await?,
            Lookup::Refresh => self.coordinator.refresh(&key, ttl, fetch).await?,
        };

        if value.freshness == Freshness::Refreshed {
            self.mirror(&resource, &value.value, ttl).await;
        }

        Ok(value)
    }

    async fn mirror<T: TypedMirror>(&self, resource: &SportsResource, value: &T, ttl: Duration) {
        let kind = resource.data_kind();
        let rows = match value.mirror_rows(resource) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(
                    target = "libero::sports",
                    data_kind = kind.as_str(),
                    error = %err,
                    "failed to encode typed cache rows"
                );
                return;
            }
        };

        for (competition_code, data) in rows {
            if let Err(err) = self
                .fixtures
                .store_cached_fixtures(&competition_code, kind, data, ttl)
                .await
            {
                warn!(
                    target = "libero::sports",
                    competition = competition_code.as_str(),
                    data_kind = kind.as_str(),
                    error = %err,
                    "failed to store typed cache row"
                );
            } else {
                debug!(
                    target = "libero::sports",
                    competition = competition_code.as_str(),
                    data_kind = kind.as_str(),
                    "typed cache row stored"
                );
            }
        }
    }
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

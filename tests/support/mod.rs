#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex as StdMutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::Router;
use libero::{
    application::{
        freshness::FreshnessCoordinator,
        repos::{CacheRepo, FixturesCacheRepo, HealthRepo, RepoError},
        sports::{CacheTtls, SportsDataService},
        upstream::{SportsProvider, UpstreamError},
    },
    domain::{
        competitions::CompetitionCode,
        entities::{CacheEntry, CachedFixturesRecord, version_tag},
        fixtures::{CompetitionFixtures, FixtureMatch, FixturesSummary},
        standings::{CompetitionScorers, CompetitionStandings, ScorerStats, StandingsRow},
        types::{DataKind, MatchStatus},
    },
    infra::http::{HttpState, build_router},
};
use serde::Serialize;
use time::{Date, OffsetDateTime};
use tokio::{sync::Mutex, time::Instant};

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub async fn insert(&self, entry: CacheEntry) {
        self.entries.lock().await.insert(entry.key.clone(), entry);
    }

    pub async fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl CacheRepo for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, RepoError> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .entries
            .lock()
            .await
            .get(key)
            .filter(|entry| entry.is_fresh_at(now))
            .cloned())
    }

    async fn get_ignoring_expiry(&self, key: &str) -> Result<Option<CacheEntry>, RepoError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn get_if_version_matches(
        &self,
        key: &str,
        etag: &str,
    ) -> Result<Option<CacheEntry>, RepoError> {
        Ok(self.get(key).await?.filter(|entry| entry.etag == etag))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<CacheEntry, RepoError> {
        let mut entry = CacheEntry::fresh(key, value, ttl, OffsetDateTime::now_utc());
        let mut entries = self.entries.lock().await;
        if let Some(previous) = entries.get(key) {
            entry.created_at = previous.created_at;
        }
        entries.insert(key.to_string(), entry.clone());
        Ok(entry)
    }

    async fn set_with_metadata(&self, entry: &CacheEntry) -> Result<(), RepoError> {
        let mut entry = entry.clone();
        let mut entries = self.entries.lock().await;
        if let Some(previous) = entries.get(&entry.key) {
            entry.created_at = previous.created_at;
        }
        entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn update_version(&self, key: &str, etag: &str) -> Result<(), RepoError> {
        let now = OffsetDateTime::now_utc();
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(key).ok_or(RepoError::NotFound)?;
        entry.etag = if etag.is_empty() {
            version_tag(now)
        } else {
            etag.to_string()
        };
        entry.last_modified = now;
        Ok(())
    }

    async fn sweep_expired_entries(&self, cutoff: OffsetDateTime) -> Result<u64, RepoError> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryFixtures {
    rows: Mutex<HashMap<(String, DataKind), CachedFixturesRecord>>,
}

impl MemoryFixtures {
    pub async fn row(&self, code: &str, kind: DataKind) -> Option<CachedFixturesRecord> {
        self.rows
            .lock()
            .await
            .get(&(code.to_string(), kind))
            .cloned()
    }

    pub async fn insert(&self, record: CachedFixturesRecord) {
        self.rows.lock().await.insert(
            (record.competition_code.clone(), record.data_kind),
            record,
        );
    }
}

#[async_trait]
impl FixturesCacheRepo for MemoryFixtures {
    async fn get_cached_fixtures(
        &self,
        competition_code: &str,
        kind: DataKind,
    ) -> Result<Option<CachedFixturesRecord>, RepoError> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .row(competition_code, kind)
            .await
            .filter(|record| record.is_fresh_at(now)))
    }

    async fn get_cached_fixtures_ignoring_expiry(
        &self,
        competition_code: &str,
        kind: DataKind,
    ) -> Result<Option<CachedFixturesRecord>, RepoError> {
        Ok(self.row(competition_code, kind).await)
    }

    async fn store_cached_fixtures(
        &self,
        competition_code: &str,
        kind: DataKind,
        data: serde_json::Value,
        ttl: Duration,
    ) -> Result<(), RepoError> {
        let now = OffsetDateTime::now_utc();
        self.insert(CachedFixturesRecord {
            competition_code: competition_code.to_string(),
            data_kind: kind,
            data,
            expires_at: now + ttl,
            updated_at: now,
        })
        .await;
        Ok(())
    }

    async fn list_competition_fixtures(
        &self,
        competition_code: &str,
    ) -> Result<Vec<CachedFixturesRecord>, RepoError> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .await
            .values()
            .filter(|record| record.competition_code == competition_code)
            .cloned()
            .collect();
        rows.sort_by_key(|record| record.data_kind.as_str());
        Ok(rows)
    }

    async fn sweep_expired_fixtures(&self, cutoff: OffsetDateTime) -> Result<u64, RepoError> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|_, record| record.expires_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryHealth {
    pub down: AtomicBool,
}

#[async_trait]
impl HealthRepo for MemoryHealth {
    async fn health_check(&self) -> Result<(), RepoError> {
        if self.down.load(Ordering::SeqCst) {
            Err(RepoError::Timeout)
        } else {
            Ok(())
        }
    }
}

/// What a scripted provider call answers with.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Value(T),
    Unavailable,
    RateLimited,
}

impl<T: Clone> Reply<T> {
    fn produce(&self, resource: &str) -> Result<T, UpstreamError> {
        match self {
            Reply::Value(value) => Ok(value.clone()),
            Reply::Unavailable => Err(UpstreamError::unavailable(
                format!("fake://{resource}"),
                None,
                "simulated timeout",
            )),
            Reply::RateLimited => Err(UpstreamError::RateLimited {
                url: format!("fake://{resource}"),
                retry_after: Some(Duration::from_secs(30)),
            }),
        }
    }
}

pub struct FakeProvider {
    pub today: StdMutex<Reply<Vec<CompetitionFixtures>>>,
    pub summary: StdMutex<Reply<FixturesSummary>>,
    pub standings: StdMutex<Reply<CompetitionStandings>>,
    pub scorers: StdMutex<Reply<CompetitionScorers>>,
    today_calls: AtomicUsize,
    standings_calls: AtomicUsize,
    scorers_calls: AtomicUsize,
    summary_calls: StdMutex<Vec<(String, Instant)>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            today: StdMutex::new(Reply::Unavailable),
            summary: StdMutex::new(Reply::Unavailable),
            standings: StdMutex::new(Reply::Unavailable),
            scorers: StdMutex::new(Reply::Unavailable),
            today_calls: AtomicUsize::new(0),
            standings_calls: AtomicUsize::new(0),
            scorers_calls: AtomicUsize::new(0),
            summary_calls: StdMutex::new(Vec::new()),
        }
    }
}

impl FakeProvider {
    pub fn set_today(&self, reply: Reply<Vec<CompetitionFixtures>>) {
        *self.today.lock().unwrap() = reply;
    }

    pub fn set_summary(&self, reply: Reply<FixturesSummary>) {
        *self.summary.lock().unwrap() = reply;
    }

    pub fn set_standings(&self, reply: Reply<CompetitionStandings>) {
        *self.standings.lock().unwrap() = reply;
    }

    pub fn set_scorers(&self, reply: Reply<CompetitionScorers>) {
        *self.scorers.lock().unwrap() = reply;
    }

    pub fn today_calls(&self) -> usize {
        self.today_calls.load(Ordering::SeqCst)
    }

    pub fn standings_calls(&self) -> usize {
        self.standings_calls.load(Ordering::SeqCst)
    }

    pub fn scorers_calls(&self) -> usize {
        self.scorers_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.today_calls() + self.standings_calls() + self.scorers_calls() + self.summary_calls().len()
    }

    pub fn summary_calls(&self) -> Vec<(String, Instant)> {
        self.summary_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SportsProvider for FakeProvider {
    async fn fetch_today_fixtures(
        &self,
        _today: Date,
    ) -> Result<Vec<CompetitionFixtures>, UpstreamError> {
        self.today_calls.fetch_add(1, Ordering::SeqCst);
        self.today.lock().unwrap().produce("matches")
    }

    async fn fetch_fixtures_summary(
        &self,
        code: &CompetitionCode,
        _today: Date,
    ) -> Result<FixturesSummary, UpstreamError> {
        self.summary_calls
            .lock()
            .unwrap()
            .push((code.to_string(), Instant::now()));
        let mut summary = self.summary.lock().unwrap().produce("summary")?;
        summary.competition_code = code.to_string();
        Ok(summary)
    }

    async fn fetch_standings(
        &self,
        _code: &CompetitionCode,
    ) -> Result<CompetitionStandings, UpstreamError> {
        self.standings_calls.fetch_add(1, Ordering::SeqCst);
        self.standings.lock().unwrap().produce("standings")
    }

    async fn fetch_top_scorers(
        &self,
        _code: &CompetitionCode,
    ) -> Result<CompetitionScorers, UpstreamError> {
        self.scorers_calls.fetch_add(1, Ordering::SeqCst);
        self.scorers.lock().unwrap().produce("scorers")
    }
}

pub struct Harness {
    pub provider: Arc<FakeProvider>,
    pub cache: Arc<MemoryCache>,
    pub fixtures: Arc<MemoryFixtures>,
    pub health: Arc<MemoryHealth>,
    pub service: SportsDataService,
}

impl Harness {
    pub fn new() -> Self {
        let provider = Arc::new(FakeProvider::default());
        let cache = Arc::new(MemoryCache::default());
        let fixtures = Arc::new(MemoryFixtures::default());
        let health = Arc::new(MemoryHealth::default());
        let service = SportsDataService::new(
            provider.clone(),
            FreshnessCoordinator::new(cache.clone()),
            fixtures.clone(),
            CacheTtls::default(),
        );
        Self {
            provider,
            cache,
            fixtures,
            health,
            service,
        }
    }

    pub fn router(&self) -> Router {
        build_router(HttpState {
            sports: self.service.clone(),
            health: self.health.clone(),
        })
    }
}

pub fn code(raw: &str) -> CompetitionCode {
    CompetitionCode::parse(raw).expect("valid competition code")
}

/// Cache entry holding `value` that expires `ttl_from_now` seconds from now
/// (negative for an already-expired entry).
pub fn entry<T: Serialize>(key: &str, value: &T, etag: &str, ttl_from_now: i64) -> CacheEntry {
    let now = OffsetDateTime::now_utc();
    CacheEntry {
        key: key.to_string(),
        value: serde_json::to_vec(value).expect("encode cache value"),
        etag: etag.to_string(),
        expires_at: now + time::Duration::seconds(ttl_from_now),
        last_modified: now - time::Duration::minutes(5),
        created_at: now - time::Duration::minutes(5),
    }
}

pub fn fixture(home: &str, away: &str, kickoff: OffsetDateTime) -> FixtureMatch {
    FixtureMatch {
        match_date: kickoff,
        home_team_name: home.to_string(),
        away_team_name: away.to_string(),
        home_score: None,
        away_score: None,
        match_status: MatchStatus::Scheduled,
        venue: None,
        home_logo_url: None,
        away_logo_url: None,
    }
}

pub fn todays_fixtures(code: &str, count: usize) -> Vec<CompetitionFixtures> {
    let kickoff = OffsetDateTime::now_utc();
    vec![CompetitionFixtures {
        competition_name: format!("Competition {code}"),
        competition_code: code.to_string(),
        logo_url: None,
        matches: (0..count)
            .map(|index| fixture(&format!("Home {index}"), &format!("Away {index}"), kickoff))
            .collect(),
    }]
}

pub fn summary_with_two_today(code: &str) -> FixturesSummary {
    let now = OffsetDateTime::now_utc();
    let matches = vec![
        fixture("Arsenal FC", "Chelsea FC", now),
        fixture("Liverpool FC", "Everton FC", now),
    ];
    FixturesSummary {
        competition_name: "Premier League".to_string(),
        competition_code: code.to_string(),
        logo_url: None,
        today: matches,
        tomorrow: Vec::new(),
        upcoming: Vec::new(),
    }
}

pub fn standings(code: &str) -> CompetitionStandings {
    CompetitionStandings {
        competition_name: "Premier League".to_string(),
        competition_code: code.to_string(),
        season: Some("2025/2026".to_string()),
        standings: vec![StandingsRow {
            position: 1,
            team_name: "Arsenal FC".to_string(),
            team_crest: None,
            played: 28,
            won: 20,
            drawn: 5,
            lost: 3,
            goals_for: 60,
            goals_against: 22,
            goal_difference: 38,
            points: 65,
        }],
    }
}

pub fn scorers(code: &str) -> CompetitionScorers {
    CompetitionScorers {
        competition_name: "Serie A".to_string(),
        competition_code: code.to_string(),
        season: Some("2025/2026".to_string()),
        scorers: vec![ScorerStats {
            player_name: "Lautaro Martínez".to_string(),
            team_name: "FC Internazionale Milano".to_string(),
            team_crest: None,
            goals: 18,
            assists: Some(4),
            penalties: Some(2),
        }],
    }
}

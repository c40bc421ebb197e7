//! Port for the third-party sports data provider.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use time::Date;

use crate::domain::{
    competitions::CompetitionCode,
    fixtures::{CompetitionFixtures, FixturesSummary},
    standings::{CompetitionScorers, CompetitionStandings},
};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream rate limited request to `{url}`")]
    RateLimited {
        url: String,
        retry_after: Option<Duration>,
    },
    #[error("upstream request to `{url}` failed: {message}")]
    Unavailable {
        url: String,
        status: Option<u16>,
        message: String,
    },
    #[error("failed to decode upstream response from `{url}`: {message}")]
    Decode { url: String, message: String },
}

impl UpstreamError {
    pub fn unavailable(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::RateLimited { .. } => "rate_limited",
            UpstreamError::Unavailable { .. } => "unavailable",
            UpstreamError::Decode { .. } => "decode",
        }
    }
}

/// Fetches and normalizes provider data. Implementations share one rate limiter
/// across every call.
#[async_trait]
pub trait SportsProvider: Send + Sync {
    /// Fixtures on `today` for the configured competitions, grouped per competition.
    async fn fetch_today_fixtures(
        &self,
        today: Date,
    ) -> Result<Vec<CompetitionFixtures>, UpstreamError>;

    /// Today/tomorrow/upcoming buckets for one competition. A 429 is surfaced
    /// as [`UpstreamError::RateLimited`] instead of being retried.
    async fn fetch_fixtures_summary(
        &self,
        code: &CompetitionCode,
        today: Date,
    ) -> Result<FixturesSummary, UpstreamError>;

    async fn fetch_standings(
        &self,
        code: &CompetitionCode,
    ) -> Result<CompetitionStandings, UpstreamError>;

    async fn fetch_top_scorers(
        &self,
        code: &CompetitionCode,
    ) -> Result<CompetitionScorers, UpstreamError>;
}

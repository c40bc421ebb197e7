//! football-data.org client behind the [`SportsProvider`] port.

mod models;
mod normalize;
mod rate_limit;

use std::{num::NonZeroU32, sync::Arc, time::Duration};

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{Client, StatusCode, Url, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use time::Date;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::application::upstream::{SportsProvider, UpstreamError};
use crate::domain::{
    competitions::CompetitionCode,
    fixtures::{CompetitionFixtures, FixturesSummary},
    standings::{CompetitionScorers, CompetitionStandings},
};

use super::error::InfraError;

pub use normalize::UNDECIDED_TEAM;
pub use rate_limit::UpstreamRateLimiter;

use models::{CompetitionResource, MatchesResponse, ScorersResponse, StandingsResponse};

const AUTH_HEADER: &str = "X-Auth-Token";
const SUMMARY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct FootballDataConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub requests_per_minute: NonZeroU32,
    /// Pause before retrying a 429 that carried no usable `Retry-After`.
    pub default_retry_after: Duration,
    /// Longest `Retry-After` worth sleeping out; anything longer fails the call.
    pub max_retry_after: Duration,
    /// Competitions included in today's fixtures.
    pub competitions: Vec<CompetitionCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryPolicy {
    /// Sleep out a 429 once, then give up.
    RetryOnce,
    /// Hand a 429 straight back to the caller.
    Surface,
}

enum Attempt {
    Body(Vec<u8>),
    RateLimited(Option<Duration>),
}

#[derive(Clone)]
pub struct FootballDataClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
    limiter: Arc<UpstreamRateLimiter>,
    default_retry_after: Duration,
    max_retry_after: Duration,
    competitions: Vec<CompetitionCode>,
}

impl FootballDataClient {
    pub fn new(config: FootballDataConfig) -> Result<Self, InfraError> {
        if config.base_url.cannot_be_a_base() {
            return Err(InfraError::configuration(format!(
                "upstream base url `{}` cannot carry a path",
                config.base_url
            )));
        }

        let http = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(config.timeout)
            .build()
            .map_err(|err| InfraError::upstream_client(err.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url,
            api_key: config.api_key.filter(|key| !key.trim().is_empty()),
            limiter: Arc::new(UpstreamRateLimiter::per_minute(config.requests_per_minute)),
            default_retry_after: config.default_retry_after,
            max_retry_after: config.max_retry_after,
            competitions: config.competitions,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("libero/", env!("CARGO_PKG_VERSION"))
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                UpstreamError::unavailable(self.base_url.as_str(), None, "base url cannot carry a path")
            })?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            url.set_query(None);
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        endpoint: &'static str,
        policy: RetryPolicy,
    ) -> Result<T, UpstreamError> {
        let mut retried = false;
        loop {
            let retry_after = match self.send(&url, endpoint).await? {
                Attempt::Body(bytes) => return decode(&url, &bytes),
                Attempt::RateLimited(retry_after) => retry_after,
            };

            match policy {
                RetryPolicy::Surface => {
                    return Err(UpstreamError::RateLimited {
                        url: url.to_string(),
                        retry_after,
                    });
                }
                RetryPolicy::RetryOnce if retried => {
                    return Err(UpstreamError::unavailable(
                        url.as_str(),
                        Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
                        "still rate limited after retry",
                    ));
                }
                RetryPolicy::RetryOnce => {
                    let pause = retry_after.unwrap_or(self.default_retry_after);
                    if pause > self.max_retry_after {
                        warn!(
                            target = "libero::upstream",
                            endpoint,
                            retry_after_ms = pause.as_millis() as u64,
                            max_retry_after_ms = self.max_retry_after.as_millis() as u64,
                            "upstream retry-after exceeds the limit, not retrying"
                        );
                        return Err(UpstreamError::unavailable(
                            url.as_str(),
                            Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
                            format!("retry-after of {}s exceeds limit", pause.as_secs()),
                        ));
                    }
                    warn!(
                        target = "libero::upstream",
                        endpoint,
                        retry_after_ms = pause.as_millis() as u64,
                        "upstream rate limited, retrying once"
                    );
                    sleep(pause).await;
                    retried = true;
                }
            }
        }
    }

    async fn send(&self, url: &Url, endpoint: &'static str) -> Result<Attempt, UpstreamError> {
        self.limiter.wait().await;
        let started_at = Instant::now();

        let mut request = self.http.get(url.clone());
        if let Some(key) = &self.api_key {
            request = request.header(AUTH_HEADER, key);
        }

        let result = request.send().await;
        histogram!("libero_upstream_request_ms", "endpoint" => endpoint)
            .record(started_at.elapsed().as_secs_f64() * 1000.0);

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                record_outcome(endpoint, "error");
                let message = if err.is_timeout() {
                    "request timed out".to_string()
                } else {
                    err.to_string()
                };
                return Err(UpstreamError::unavailable(url.as_str(), None, message));
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            record_outcome(endpoint, "rate_limited");
            counter!("libero_upstream_rate_limited_total", "endpoint" => endpoint).increment(1);
            return Ok(Attempt::RateLimited(parse_retry_after(&response)));
        }

        let bytes = response.bytes().await.map_err(|err| {
            record_outcome(endpoint, "error");
            UpstreamError::unavailable(url.as_str(), Some(status.as_u16()), err.to_string())
        })?;

        if !status.is_success() {
            record_outcome(endpoint, "error");
            let body = String::from_utf8_lossy(&bytes);
            return Err(UpstreamError::unavailable(
                url.as_str(),
                Some(status.as_u16()),
                format!("status {status} body {body}"),
            ));
        }

        record_outcome(endpoint, "ok");
        debug!(
            target = "libero::upstream",
            endpoint,
            bytes = bytes.len(),
            "upstream response received"
        );
        Ok(Attempt::Body(bytes.to_vec()))
    }

    fn competitions_param(&self) -> String {
        self.competitions
            .iter()
            .map(CompetitionCode::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[async_trait]
impl SportsProvider for FootballDataClient {
    async fn fetch_today_fixtures(
        &self,
        today: Date,
    ) -> Result<Vec<CompetitionFixtures>, UpstreamError> {
        let mut query = vec![("dateFrom", today.to_string()), ("dateTo", today.to_string())];
        if !self.competitions.is_empty() {
            query.push(("competitions", self.competitions_param()));
        }

        let url = self.endpoint(&["matches"], &query)?;
        let response: MatchesResponse = self
            .get_json(url, "matches", RetryPolicy::RetryOnce)
            .await?;

        let matches = response
            .matches
            .into_iter()
            .filter(|resource| resource.utc_date.date() == today)
            .collect();
        Ok(normalize::group_by_competition(matches))
    }

    async fn fetch_fixtures_summary(
        &self,
        code: &CompetitionCode,
        today: Date,
    ) -> Result<FixturesSummary, UpstreamError> {
        let url = self.endpoint(&["competitions", code.as_str()], &[])?;
        let competition: CompetitionResource = self
            .get_json(url, "competition", RetryPolicy::Surface)
            .await?;

        let until = today
            .checked_add(time::Duration::days(SUMMARY_WINDOW_DAYS))
            .unwrap_or(today);
        let url = self.endpoint(
            &["matches"],
            &[
                ("competitions", code.to_string()),
                ("dateFrom", today.to_string()),
                ("dateTo", until.to_string()),
            ],
        )?;
        let response: MatchesResponse = self
            .get_json(url, "matches", RetryPolicy::Surface)
            .await?;

        Ok(normalize::fixtures_summary(
            competition,
            response.matches,
            today,
        ))
    }

    async fn fetch_standings(
        &self,
        code: &CompetitionCode,
    ) -> Result<CompetitionStandings, UpstreamError> {
        let url = self.endpoint(&["competitions", code.as_str(), "standings"], &[])?;
        let response: StandingsResponse = self
            .get_json(url, "standings", RetryPolicy::RetryOnce)
            .await?;
        Ok(normalize::standings(response, code))
    }

    async fn fetch_top_scorers(
        &self,
        code: &CompetitionCode,
    ) -> Result<CompetitionScorers, UpstreamError> {
        let url = self.endpoint(&["competitions", code.as_str(), "scorers"], &[])?;
        let response: ScorersResponse = self
            .get_json(url, "scorers", RetryPolicy::RetryOnce)
            .await?;
        Ok(normalize::scorers(response, code))
    }
}

fn record_outcome(endpoint: &'static str, outcome: &'static str) {
    counter!(
        "libero_upstream_requests_total",
        "endpoint" => endpoint,
        "outcome" => outcome
    )
    .increment(1);
}

/// Delay-seconds form only; HTTP-date values fall back to the default pause.
fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn decode<T: DeserializeOwned>(url: &Url, bytes: &[u8]) -> Result<T, UpstreamError> {
    serde_json::from_slice(bytes).map_err(|err| UpstreamError::decode(url.as_str(), err.to_string()))
}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::application::{error::ErrorReport, freshness::CachedValue};
use crate::domain::{
    competitions::CompetitionCode, entities::CachedFixturesRecord, keys::SportsResource,
};

use super::{
    HttpState,
    conditional::{if_none_match, matches, not_modified, versioned_json},
    error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct CompetitionQuery {
    pub competition: Option<String>,
}

impl CompetitionQuery {
    fn code(self) -> Result<CompetitionCode, ApiError> {
        let raw = self.competition.ok_or_else(|| {
            ApiError::bad_request(
                "Missing competition parameter",
                Some("pass ?competition=CODE, for example PL".to_string()),
            )
        })?;
        Ok(CompetitionCode::parse(&raw)?)
    }
}

#[derive(Debug, Serialize)]
pub struct CachedFixturesView {
    #[serde(flatten)]
    pub record: CachedFixturesRecord,
    pub fresh: bool,
}

/// Answer from the stored version alone when the client already holds it.
async fn stored_version(
    state: &HttpState,
    resource: &SportsResource,
    candidates: &[String],
) -> Option<Response> {
    state
        .sports
        .current_version(resource, candidates)
        .await
        .map(|entry| not_modified(&entry.etag, entry.last_modified))
}

fn respond<T: Serialize>(candidates: &[String], value: CachedValue<T>) -> Response {
    if matches(candidates, &value.etag) {
        return not_modified(&value.etag, value.last_modified);
    }
    versioned_json(
        &value.value,
        &value.etag,
        value.last_modified,
        value.freshness.as_str(),
    )
}

pub async fn todays_fixtures(
    State(state): State<HttpState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let candidates = if_none_match(&headers);
    let resource = SportsResource::TodayFixtures {
        date: OffsetDateTime::now_utc().date(),
    };
    if let Some(response) = stored_version(&state, &resource, &candidates).await {
        return Ok(response);
    }

    let value = state.sports.todays_fixtures().await?;
    Ok(respond(&candidates, value))
}

pub async fn fixtures_summary(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(query): Query<CompetitionQuery>,
) -> Result<Response, ApiError> {
    let code = query.code()?;
    let candidates = if_none_match(&headers);
    let resource = SportsResource::FixturesSummary(code.clone());
    if let Some(response) = stored_version(&state, &resource, &candidates).await {
        return Ok(response);
    }

    let value = state.sports.fixtures_summary(&code).await?;
    Ok(respond(&candidates, value))
}

pub async fn standings(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(query): Query<CompetitionQuery>,
) -> Result<Response, ApiError> {
    let code = query.code()?;
    let candidates = if_none_match(&headers);
    let resource = SportsResource::Standings(code.clone());
    if let Some(response) = stored_version(&state, &resource, &candidates).await {
        return Ok(response);
    }

    let value = state.sports.standings(&code).await?;
    Ok(respond(&candidates, value))
}

pub async fn top_scorers(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(query): Query<CompetitionQuery>,
) -> Result<Response, ApiError> {
    let code = query.code()?;
    let candidates = if_none_match(&headers);
    let resource = SportsResource::Scorers(code.clone());
    if let Some(response) = stored_version(&state, &resource, &candidates).await {
        return Ok(response);
    }

    let value = state.sports.top_scorers(&code).await?;
    Ok(respond(&candidates, value))
}

pub async fn competition_cache(
    State(state): State<HttpState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<CachedFixturesView>>, ApiError> {
    let code = CompetitionCode::parse(&code)?;
    let now = OffsetDateTime::now_utc();
    let rows = state
        .sports
        .competition_cache(&code)
        .await?
        .into_iter()
        .map(|record| CachedFixturesView {
            fresh: record.is_fresh_at(now),
            record,
        })
        .collect();
    Ok(Json(rows))
}

pub async fn db_health(State(state): State<HttpState>) -> Response {
    match state.health.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

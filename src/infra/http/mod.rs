mod conditional;
pub mod error;
mod middleware;
mod sports;

pub use conditional::CACHE_STATUS_HEADER;
pub use error::ApiError;
pub use middleware::{REQUEST_ID_HEADER, RequestContext};

use std::sync::Arc;

use axum::{Router, middleware as axum_middleware, routing::get};

use crate::application::{repos::HealthRepo, sports::SportsDataService};

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub sports: SportsDataService,
    pub health: Arc<dyn HealthRepo>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/sports/fixtures/today", get(sports::todays_fixtures))
        .route("/api/sports/fixtures/summary", get(sports::fixtures_summary))
        .route("/api/standings", get(sports::standings))
        .route("/api/topscorers", get(sports::top_scorers))
        .route(
            "/api/sports/competitions/{code}/cache",
            get(sports::competition_cache),
        )
        .route("/_health/db", get(sports::db_health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

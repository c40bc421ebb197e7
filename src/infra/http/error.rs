use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::freshness::FreshnessError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const UPSTREAM_UNAVAILABLE: &str = "upstream_unavailable";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        let report = ErrorReport::from_message(
            source,
            status,
            format!("{code}: {}", hint.as_deref().unwrap_or(message)),
        );
        Self {
            status,
            code,
            message,
            hint,
            report,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(
            "infra::http::sports",
            StatusCode::BAD_REQUEST,
            codes::BAD_REQUEST,
            message,
            hint,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::bad_request("Invalid request", Some(err.to_string()))
    }
}

impl From<FreshnessError> for ApiError {
    fn from(err: FreshnessError) -> Self {
        let status = StatusCode::SERVICE_UNAVAILABLE;
        Self {
            status,
            code: codes::UPSTREAM_UNAVAILABLE,
            message: "Sports data is temporarily unavailable",
            hint: None,
            report: ErrorReport::from_error("infra::http::sports", status, &err),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        let (status, code, message) = match &err {
            RepoError::NotFound => (StatusCode::NOT_FOUND, codes::NOT_FOUND, "Resource not found"),
            RepoError::Timeout => (
                StatusCode::SERVICE_UNAVAILABLE,
                codes::DB_TIMEOUT,
                "Database timeout",
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "Persistence error",
            ),
        };
        Self {
            status,
            code,
            message,
            hint: None,
            report: ErrorReport::from_error("infra::http::cache", status, &err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}

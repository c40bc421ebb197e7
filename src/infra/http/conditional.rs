//! Conditional GET helpers shared by the sports endpoints.

use std::time::SystemTime;

use axum::{
    Json,
    http::{
        HeaderMap, HeaderName, HeaderValue, StatusCode,
        header::{ETAG, IF_NONE_MATCH, LAST_MODIFIED},
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;
use time::OffsetDateTime;

pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

const ANY_TAG: &str = "*";

/// Opaque tags from every `If-None-Match` header. Weak prefixes and quotes
/// are dropped; `*` is kept verbatim.
pub fn if_none_match(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(normalize_tag)
        .collect()
}

fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim();
    let tag = tag.strip_prefix("W/").unwrap_or(tag);
    let tag = tag
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(tag)
        .trim();
    (!tag.is_empty()).then(|| tag.to_string())
}

pub fn matches(candidates: &[String], etag: &str) -> bool {
    candidates
        .iter()
        .any(|candidate| candidate == ANY_TAG || candidate == etag)
}

fn quoted(etag: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("\"{etag}\"")).ok()
}

fn http_date(at: OffsetDateTime) -> Option<HeaderValue> {
    HeaderValue::from_str(&httpdate::fmt_http_date(SystemTime::from(at))).ok()
}

fn version_headers(response: &mut Response, etag: &str, last_modified: OffsetDateTime) {
    let headers = response.headers_mut();
    if let Some(value) = quoted(etag) {
        headers.insert(ETAG, value);
    }
    if let Some(value) = http_date(last_modified) {
        headers.insert(LAST_MODIFIED, value);
    }
}

/// 304 with an empty body and the current version headers.
pub fn not_modified(etag: &str, last_modified: OffsetDateTime) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    version_headers(&mut response, etag, last_modified);
    response
}

pub fn versioned_json<T: Serialize>(
    body: &T,
    etag: &str,
    last_modified: OffsetDateTime,
    cache_status: &'static str,
) -> Response {
    let mut response = Json(body).into_response();
    version_headers(&mut response, etag, last_modified);
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(cache_status));
    response
}

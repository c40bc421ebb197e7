use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Applied only when `RUST_LOG` is unset.
const QUIET_DIRECTIVES: &[&str] = &["sqlx::query=warn", "hyper_util=info", "reqwest=info"];

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let mut env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        for directive in QUIET_DIRECTIVES {
            let directive = directive.parse().map_err(|err| {
                InfraError::telemetry(format!("invalid log directive `{directive}`: {err}"))
            })?;
            env_filter = env_filter.add_directive(directive);
        }
    }

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "libero_cache_fresh_total",
            Unit::Count,
            "Requests answered from a fresh cache entry."
        );
        describe_counter!(
            "libero_cache_refreshed_total",
            Unit::Count,
            "Cache entries rewritten after a successful upstream fetch."
        );
        describe_counter!(
            "libero_cache_stale_total",
            Unit::Count,
            "Expired entries served because the upstream refresh failed."
        );
        describe_counter!(
            "libero_cache_empty_skipped_total",
            Unit::Count,
            "Empty upstream results that were not written to the cache."
        );
        describe_counter!(
            "libero_cache_swept_total",
            Unit::Count,
            "Expired cache rows deleted by the sweep."
        );
        describe_counter!(
            "libero_upstream_requests_total",
            Unit::Count,
            "Requests sent to the sports data provider."
        );
        describe_counter!(
            "libero_upstream_rate_limited_total",
            Unit::Count,
            "Provider responses with HTTP 429."
        );
        describe_histogram!(
            "libero_upstream_request_ms",
            Unit::Milliseconds,
            "Provider request latency in milliseconds."
        );
    });
}

//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    CliArgs, Command, DatabaseOverride, MaintenanceArgs, ServeArgs, ServeOverrides,
    UpstreamOverrides,
};

use std::{net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::{jobs::SchedulerConfig, sports::CacheTtls};
use crate::domain::competitions::CompetitionCode;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "libero";
const ENV_PREFIX: &str = "LIBERO";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.football-data.org/v4";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 10;
const DEFAULT_RETRY_AFTER_SECS: u64 = 10;
const DEFAULT_MAX_RETRY_AFTER_SECS: u64 = 30;
/// Ceiling for TTLs and sweep retention so expiry arithmetic stays in range.
const MAX_CACHE_DURATION_SECS: u64 = 366 * 24 * 60 * 60;
const DEFAULT_COMPETITIONS: &[&str] = &["PL", "PD", "SA", "BL1", "FL1", "CL", "EL"];
const DEFAULT_TODAY_INTERVAL_SECS: u64 = 4 * 60 * 60;
const DEFAULT_SUMMARY_INTERVAL_SECS: u64 = 6 * 60 * 60;
const DEFAULT_STARTUP_DELAY_SECS: u64 = 15;
const DEFAULT_REQUEST_PAUSE_SECS: u64 = 5;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub upstream: UpstreamSettings,
    pub cache: CacheTtls,
    pub scheduler: SchedulerSettings,
    pub sweep: SweepSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub requests_per_minute: NonZeroU32,
    pub default_retry_after: Duration,
    pub max_retry_after: Duration,
    pub competitions: Vec<CompetitionCode>,
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub today_interval: Duration,
    pub summary_interval: Duration,
    pub startup_delay: Duration,
    pub request_pause: Duration,
}

#[derive(Debug, Clone)]
pub struct SweepSettings {
    pub interval: Duration,
    /// How long expired rows are kept before a sweep removes them.
    pub retention: Duration,
}

impl Settings {
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            today_interval: self.scheduler.today_interval,
            summary_interval: self.scheduler.summary_interval,
            startup_delay: self.scheduler.startup_delay,
            request_pause: self.scheduler.request_pause,
            sweep_interval: self.sweep.interval,
            competitions: self.upstream.competitions.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("upstream.competitions")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Sweep(args)) | Some(Command::Warm(args)) => {
            raw.apply_maintenance_overrides(args)
        }
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    upstream: RawUpstreamSettings,
    cache: RawCacheSettings,
    scheduler: RawSchedulerSettings,
    sweep: RawSweepSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.scheduler_enabled {
            self.scheduler.enabled = Some(enabled);
        }
        self.apply_database_override(&overrides.database);
        self.apply_upstream_overrides(&overrides.upstream);
    }

    fn apply_maintenance_overrides(&mut self, args: &MaintenanceArgs) {
        self.apply_database_override(&args.database);
        self.apply_upstream_overrides(&args.upstream);
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }

    fn apply_upstream_overrides(&mut self, overrides: &UpstreamOverrides) {
        if let Some(url) = overrides.upstream_base_url.as_ref() {
            self.upstream.base_url = Some(url.clone());
        }
        if let Some(key) = overrides.upstream_api_key.as_ref() {
            self.upstream.api_key = Some(key.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            upstream,
            cache,
            scheduler,
            sweep,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            upstream: build_upstream_settings(upstream)?,
            cache: build_cache_ttls(cache)?,
            scheduler: build_scheduler_settings(scheduler)?,
            sweep: build_sweep_settings(sweep)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_shutdown = non_zero_secs(
        server
            .graceful_shutdown_seconds
            .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS),
        "server.graceful_shutdown_seconds",
    )?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_upstream_settings(upstream: RawUpstreamSettings) -> Result<UpstreamSettings, LoadError> {
    let raw_url = non_blank(upstream.base_url).unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string());
    let base_url = Url::parse(&raw_url)
        .map_err(|err| LoadError::invalid("upstream.base_url", format!("`{raw_url}`: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "upstream.base_url",
            "scheme must be http or https",
        ));
    }

    let timeout = non_zero_secs(
        upstream
            .timeout_seconds
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        "upstream.timeout_seconds",
    )?;
    let requests_per_minute = non_zero_u32(
        upstream
            .requests_per_minute
            .unwrap_or(DEFAULT_REQUESTS_PER_MINUTE.into()),
        "upstream.requests_per_minute",
    )?;
    let default_retry_after = non_zero_secs(
        upstream
            .default_retry_after_seconds
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        "upstream.default_retry_after_seconds",
    )?;
    let max_retry_after = non_zero_secs(
        upstream
            .max_retry_after_seconds
            .unwrap_or(DEFAULT_MAX_RETRY_AFTER_SECS),
        "upstream.max_retry_after_seconds",
    )?;
    if default_retry_after > max_retry_after {
        return Err(LoadError::invalid(
            "upstream.default_retry_after_seconds",
            "must not exceed upstream.max_retry_after_seconds",
        ));
    }

    let raw_codes = upstream.competitions.unwrap_or_else(|| {
        DEFAULT_COMPETITIONS
            .iter()
            .map(|code| code.to_string())
            .collect()
    });
    let mut competitions: Vec<CompetitionCode> = Vec::with_capacity(raw_codes.len());
    for raw in &raw_codes {
        let code = CompetitionCode::parse(raw)
            .map_err(|err| LoadError::invalid("upstream.competitions", err.to_string()))?;
        if !competitions.contains(&code) {
            competitions.push(code);
        }
    }
    if competitions.is_empty() {
        return Err(LoadError::invalid(
            "upstream.competitions",
            "at least one competition is required",
        ));
    }

    Ok(UpstreamSettings {
        base_url,
        api_key: non_blank(upstream.api_key),
        timeout,
        requests_per_minute,
        default_retry_after,
        max_retry_after,
        competitions,
    })
}

fn build_cache_ttls(cache: RawCacheSettings) -> Result<CacheTtls, LoadError> {
    let defaults = CacheTtls::default();
    let ttl = |value: Option<u64>, fallback: Duration, key: &'static str| -> Result<Duration, LoadError> {
        match value {
            Some(seconds) => {
                non_zero_secs(seconds, key)?;
                bounded_secs(seconds, key)
            }
            None => Ok(fallback),
        }
    };

    Ok(CacheTtls {
        today: ttl(cache.today_ttl_seconds, defaults.today, "cache.today_ttl_seconds")?,
        summary: ttl(
            cache.summary_ttl_seconds,
            defaults.summary,
            "cache.summary_ttl_seconds",
        )?,
        standings: ttl(
            cache.standings_ttl_seconds,
            defaults.standings,
            "cache.standings_ttl_seconds",
        )?,
        scorers: ttl(
            cache.scorers_ttl_seconds,
            defaults.scorers,
            "cache.scorers_ttl_seconds",
        )?,
    })
}

fn build_scheduler_settings(
    scheduler: RawSchedulerSettings,
) -> Result<SchedulerSettings, LoadError> {
    Ok(SchedulerSettings {
        enabled: scheduler.enabled.unwrap_or(true),
        today_interval: non_zero_secs(
            scheduler
                .today_interval_seconds
                .unwrap_or(DEFAULT_TODAY_INTERVAL_SECS),
            "scheduler.today_interval_seconds",
        )?,
        summary_interval: non_zero_secs(
            scheduler
                .summary_interval_seconds
                .unwrap_or(DEFAULT_SUMMARY_INTERVAL_SECS),
            "scheduler.summary_interval_seconds",
        )?,
        startup_delay: Duration::from_secs(
            scheduler
                .startup_delay_seconds
                .unwrap_or(DEFAULT_STARTUP_DELAY_SECS),
        ),
        request_pause: Duration::from_secs(
            scheduler
                .request_pause_seconds
                .unwrap_or(DEFAULT_REQUEST_PAUSE_SECS),
        ),
    })
}

fn build_sweep_settings(sweep: RawSweepSettings) -> Result<SweepSettings, LoadError> {
    Ok(SweepSettings {
        interval: non_zero_secs(
            sweep.interval_seconds.unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
            "sweep.interval_seconds",
        )?,
        retention: bounded_secs(sweep.retention_seconds.unwrap_or(0), "sweep.retention_seconds")?,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUpstreamSettings {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_seconds: Option<u64>,
    requests_per_minute: Option<u64>,
    default_retry_after_seconds: Option<u64>,
    max_retry_after_seconds: Option<u64>,
    competitions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    today_ttl_seconds: Option<u64>,
    summary_ttl_seconds: Option<u64>,
    standings_ttl_seconds: Option<u64>,
    scorers_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSchedulerSettings {
    enabled: Option<bool>,
    today_interval_seconds: Option<u64>,
    summary_interval_seconds: Option<u64>,
    startup_delay_seconds: Option<u64>,
    request_pause_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSweepSettings {
    interval_seconds: Option<u64>,
    retention_seconds: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_secs(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

fn bounded_secs(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value > MAX_CACHE_DURATION_SECS {
        return Err(LoadError::invalid(
            key,
            format!("must be at most {MAX_CACHE_DURATION_SECS} seconds"),
        ));
    }
    Ok(Duration::from_secs(value))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

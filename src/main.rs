use std::{future::IntoFuture, process, sync::Arc};

use libero::{
    application::{
        error::AppError,
        freshness::FreshnessCoordinator,
        jobs::{Scheduler, refresh_summaries_once, refresh_today_once},
        maintenance::CacheSweeper,
        repos::{CacheRepo, FixturesCacheRepo, HealthRepo},
        sports::SportsDataService,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        upstream::{FootballDataClient, FootballDataConfig},
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Sweep(_) => run_sweep(settings).await,
        config::Command::Warm(_) => run_warm(settings).await,
    }
}

struct ApplicationContext {
    sports: SportsDataService,
    sweeper: CacheSweeper,
    health: Arc<dyn HealthRepo>,
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_application_context(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let upstream = &settings.upstream;
    let client = FootballDataClient::new(FootballDataConfig {
        base_url: upstream.base_url.clone(),
        api_key: upstream.api_key.clone(),
        timeout: upstream.timeout,
        requests_per_minute: upstream.requests_per_minute,
        default_retry_after: upstream.default_retry_after,
        max_retry_after: upstream.max_retry_after,
        competitions: upstream.competitions.clone(),
    })?;
    if upstream.api_key.is_none() {
        warn!(
            target = "libero::bootstrap",
            "no upstream api key configured; requests are sent unauthenticated"
        );
    }

    let cache: Arc<dyn CacheRepo> = repositories.clone();
    let fixtures: Arc<dyn FixturesCacheRepo> = repositories.clone();
    let health: Arc<dyn HealthRepo> = repositories;

    let sports = SportsDataService::new(
        Arc::new(client),
        FreshnessCoordinator::new(cache.clone()),
        fixtures.clone(),
        settings.cache,
    );
    let sweeper = CacheSweeper::new(cache, fixtures, settings.sweep.retention);

    Ok(ApplicationContext {
        sports,
        sweeper,
        health,
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let app = build_application_context(repositories, &settings)?;

    let scheduler = settings.scheduler.enabled.then(|| {
        Scheduler::start(
            app.sports.clone(),
            app.sweeper.clone(),
            settings.scheduler_config(),
        )
    });

    let result = serve_http(
        &settings,
        HttpState {
            sports: app.sports,
            health: app.health,
        },
    )
    .await;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }

    result
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "libero::bootstrap",
        addr = %settings.server.addr,
        "listening"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(forward_shutdown_signal(shutdown.clone()));

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = async {
            shutdown.cancelled().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target = "libero::bootstrap",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    Ok(())
}

async fn forward_shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "libero::bootstrap", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = "libero::bootstrap", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!(target = "libero::bootstrap", "shutdown requested");
    token.cancel();
}

async fn run_sweep(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let app = build_application_context(repositories, &settings)?;

    let report = app.sweeper.sweep_expired().await?;
    info!(
        target = "libero::sweep",
        entries = report.entries,
        fixtures = report.fixtures,
        "Sweep completed"
    );
    Ok(())
}

async fn run_warm(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let app = build_application_context(repositories, &settings)?;
    let scheduler = settings.scheduler_config();

    let today = refresh_today_once(&app.sports).await;
    let summaries = refresh_summaries_once(
        &app.sports,
        &scheduler.competitions,
        scheduler.request_pause,
        &CancellationToken::new(),
    )
    .await
    .unwrap_or(0);

    info!(
        target = "libero::warm",
        todays_fixtures = today,
        summaries,
        competitions = scheduler.competitions.len(),
        "Warm completed"
    );
    Ok(())
}

//! Background refresh and sweep tasks with an explicit lifecycle.

mod refresh;
mod sweep;

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::{maintenance::CacheSweeper, sports::SportsDataService};
use crate::domain::competitions::CompetitionCode;

pub use refresh::{refresh_summaries_once, refresh_today_once};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub today_interval: Duration,
    pub summary_interval: Duration,
    pub startup_delay: Duration,
    pub request_pause: Duration,
    pub sweep_interval: Duration,
    pub competitions: Vec<CompetitionCode>,
}

impl SchedulerConfig {
    pub fn with_competitions(competitions: Vec<CompetitionCode>) -> Self {
        Self {
            today_interval: Duration::from_secs(4 * 60 * 60),
            summary_interval: Duration::from_secs(6 * 60 * 60),
            startup_delay: Duration::from_secs(15),
            request_pause: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(60 * 60),
            competitions,
        }
    }
}

/// Owns the periodic tasks and the token that stops them.
pub struct Scheduler {
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Scheduler {
    /// Spawn every task on the current runtime.
    pub fn start(service: SportsDataService, sweeper: CacheSweeper, config: SchedulerConfig) -> Self {
        let cancel = CancellationToken::new();

        let tasks = vec![
            (
                "todays_fixtures",
                tokio::spawn(refresh::run_today_task(
                    service.clone(),
                    config.today_interval,
                    cancel.child_token(),
                )),
            ),
            (
                "fixtures_summaries",
                tokio::spawn(refresh::run_summary_task(
                    service,
                    config.clone(),
                    cancel.child_token(),
                )),
            ),
            (
                "cache_sweep",
                tokio::spawn(sweep::run_sweep_task(
                    sweeper,
                    config.sweep_interval,
                    cancel.child_token(),
                )),
            ),
        ];

        info!(
            target = "libero::scheduler",
            tasks = tasks.len(),
            competitions = config.competitions.len(),
            "scheduler started"
        );

        Self { cancel, tasks }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Signal every task and wait for all of them to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for (name, handle) in self.tasks {
            if let Err(err) = handle.await {
                warn!(
                    target = "libero::scheduler",
                    task = name,
                    error = %err,
                    "scheduler task ended abnormally"
                );
            }
        }
        info!(target = "libero::scheduler", "scheduler stopped");
    }
}

/// Sleep for `duration` unless cancelled first. Returns `false` on cancellation.
async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

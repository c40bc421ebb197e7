use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::{freshness::Freshness, sports::SportsDataService};
use crate::domain::competitions::CompetitionCode;

use super::{SchedulerConfig, pause};

/// Refresh today's fixtures once. Returns whether fresh data was obtained.
pub async fn refresh_today_once(service: &SportsDataService) -> bool {
    match service.refresh_todays_fixtures().await {
        Ok(value) => {
            let competitions = value.value.len();
            let matches: usize = value.value.iter().map(|group| group.matches.len()).sum();
            log_outcome("todays_fixtures", value.freshness, competitions, matches);
            value.freshness == Freshness::Refreshed
        }
        Err(err) => {
            warn!(
                target = "libero::scheduler",
                resource = "todays_fixtures",
                error = %err,
                "scheduled refresh failed"
            );
            false
        }
    }
}

/// Refresh every summary in order, pausing between upstream requests.
///
/// Stops early and returns `None` when `cancel` fires; otherwise the number
/// of summaries that were refreshed.
pub async fn refresh_summaries_once(
    service: &SportsDataService,
    competitions: &[CompetitionCode],
    request_pause: Duration,
    cancel: &CancellationToken,
) -> Option<usize> {
    let mut refreshed = 0;
    for (index, code) in competitions.iter().enumerate() {
        if index > 0 && !pause(request_pause, cancel).await {
            return None;
        }
        if cancel.is_cancelled() {
            return None;
        }

        match service.refresh_fixtures_summary(code).await {
            Ok(value) => {
                let summary = &value.value;
                let matches = summary.today.len() + summary.tomorrow.len() + summary.upcoming.len();
                log_outcome(code.as_str(), value.freshness, 1, matches);
                if value.freshness == Freshness::Refreshed {
                    refreshed += 1;
                }
            }
            Err(err) => warn!(
                target = "libero::scheduler",
                resource = "fixtures_summary",
                competition = code.as_str(),
                error = %err,
                "scheduled refresh failed"
            ),
        }
    }
    Some(refreshed)
}

pub(super) async fn run_today_task(
    service: SportsDataService,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        refresh_today_once(&service).await;
        if !pause(interval, &cancel).await {
            break;
        }
    }
}

pub(super) async fn run_summary_task(
    service: SportsDataService,
    config: SchedulerConfig,
    cancel: CancellationToken,
) {
    if !pause(config.startup_delay, &cancel).await {
        return;
    }

    loop {
        let Some(refreshed) = refresh_summaries_once(
            &service,
            &config.competitions,
            config.request_pause,
            &cancel,
        )
        .await
        else {
            break;
        };

        info!(
            target = "libero::scheduler",
            refreshed,
            competitions = config.competitions.len(),
            "fixtures summary pass complete"
        );

        if !pause(config.summary_interval, &cancel).await {
            break;
        }
    }
}

fn log_outcome(resource: &str, freshness: Freshness, groups: usize, matches: usize) {
    match freshness {
        Freshness::Refreshed => info!(
            target = "libero::scheduler",
            resource,
            groups,
            matches,
            "scheduled refresh stored"
        ),
        Freshness::Stale | Freshness::Fresh => warn!(
            target = "libero::scheduler",
            resource,
            cache_status = freshness.as_str(),
            "scheduled refresh kept the previous cache entry"
        ),
        Freshness::Uncached => warn!(
            target = "libero::scheduler",
            resource,
            "scheduled refresh produced nothing cacheable"
        ),
    }
}

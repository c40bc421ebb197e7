use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::application::maintenance::CacheSweeper;

pub(super) async fn run_sweep_task(
    sweeper: CacheSweeper,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // first tick completes immediately

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if let Err(err) = sweeper.sweep_expired().await {
            warn!(
                target = "libero::scheduler",
                error = %err,
                "cache sweep failed"
            );
        }
    }
}

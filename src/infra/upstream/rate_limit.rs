use std::{num::NonZeroU32, time::Duration};

use tokio::{
    sync::Mutex,
    time::{Instant, sleep_until},
};

/// Admits at most one upstream request per `min_interval`, across all callers.
///
/// The lock is held while waiting, so concurrent callers queue in arrival
/// order. Dropping a pending `wait()` leaves the last admission untouched.
#[derive(Debug)]
pub struct UpstreamRateLimiter {
    min_interval: Duration,
    last_admitted: Mutex<Option<Instant>>,
}

impl UpstreamRateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_admitted: Mutex::new(None),
        }
    }

    /// `60s / requests_per_minute`.
    pub fn per_minute(requests_per_minute: NonZeroU32) -> Self {
        Self::new(Duration::from_secs(60) / requests_per_minute.get())
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Suspend until the caller may issue a request; returns the admission instant.
    pub async fn wait(&self) -> Instant {
        let mut last = self.last_admitted.lock().await;
        if let Some(previous) = *last {
            sleep_until(previous + self.min_interval).await;
        }
        let admitted = Instant::now();
        *last = Some(admitted);
        admitted
    }
}

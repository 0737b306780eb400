use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{sleep, Instant};
use tracing::trace;

/// Serializes outbound calls behind a single FIFO gate.
///
/// Work runs one unit at a time, in the order callers first polled
/// [`RequestQueue::enqueue`]. Consecutive units start at least
/// `min_interval` apart. The gate is a fair tokio mutex held for the whole
/// unit, so at most one request is ever in flight.
pub struct RequestQueue {
    min_interval: Duration,
    last_issued: AsyncMutex<Option<Instant>>,
}

impl RequestQueue {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_issued: AsyncMutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub async fn enqueue<F, Fut, T>(&self, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut last = self.last_issued.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                trace!(?wait, "throttling outbound request");
                sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
        work().await
    }
}

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::config::PipelineSettings;
use crate::errors::GeocodeError;

/// Outcome of one attempt, classified for the retry loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    Success(T),
    Retryable(GeocodeError),
    Terminal(GeocodeError),
}

impl<T> From<Result<T, GeocodeError>> for Attempt<T> {
    fn from(result: Result<T, GeocodeError>) -> Self {
        match result {
            Ok(value) => Attempt::Success(value),
            Err(err) if err.is_retryable() => Attempt::Retryable(err),
            Err(err) => Attempt::Terminal(err),
        }
    }
}

/// Exponential backoff without jitter.
///
/// `max_retries` counts retries after the first attempt: a policy with
/// `max_retries = 3` makes at most four attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::new(settings.max_retries, settings.initial_backoff)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay slept before retry number `retry` (starting at 1).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.initial_delay.saturating_mul(1_u32 << exponent)
    }

    /// Runs `operation` until it succeeds, fails terminally, or the retry
    /// budget is spent. The closure receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, GeocodeError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, GeocodeError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match Attempt::from(operation(attempt).await) {
                Attempt::Success(value) => return Ok(value),
                Attempt::Terminal(err) => return Err(err),
                Attempt::Retryable(err) if attempt <= self.max_retries => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        ?err,
                        attempt, "geocode attempt failed; retrying after {:?}", delay
                    );
                    sleep(delay).await;
                }
                Attempt::Retryable(err) => {
                    warn!(?err, attempt, "geocode retries exhausted");
                    return Err(err);
                }
            }
        }
    }
}

//! Bounded retry with exponential backoff around a single async call.

use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Default number of attempts: the first call plus three retries.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
const DEFAULT_FACTOR: u32 = 2;

/// Every attempt failed. Carries the error of the last one.
#[derive(Debug, Error)]
#[error("{label} failed after {attempts} attempt(s): {source}")]
pub struct RetryError<E: StdError + 'static> {
    pub label: String,
    pub attempts: u32,
    #[source]
    pub source: E,
}

/// Passed to the observer after each failed attempt.
#[derive(Debug)]
pub struct FailedAttempt<'a> {
    /// What was being attempted, e.g. `rename 'scan.pdf'`.
    pub label: &'a str,
    /// 1-based number of the attempt that just failed.
    pub attempt_number: u32,
    pub retries_left: u32,
    pub error: &'a (dyn StdError + 'a),
}

pub trait RetryObserver: Send + Sync {
    fn on_failed_attempt(&self, attempt: &FailedAttempt<'_>);
}

impl RetryObserver for () {
    fn on_failed_attempt(&self, _attempt: &FailedAttempt<'_>) {}
}

/// Retry configuration shared by every remote call in a pipeline.
///
/// Failures are not classified: a 400 is retried like a timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    min_delay: Duration,
    max_delay: Duration,
    factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            factor: DEFAULT_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; zero is treated as one.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_factor(mut self, factor: u32) -> Self {
        self.factor = factor.max(1);
        self
    }

    /// Policy that retries immediately. Used by tests and dry runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts)
            .with_min_delay(Duration::ZERO)
            .with_max_delay(Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff after the given failed attempt (1-based):
    /// `min_delay * factor^(attempt - 1)`, capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let multiplier = self.factor.saturating_pow(exponent);
        self.min_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }

    /// Runs `op` until it succeeds or the attempts are used up.
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        observer: &dyn RetryObserver,
        op: F,
    ) -> Result<T, RetryError<E>>
    where
        E: StdError + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_if(label, observer, |_| true, op).await
    }

    /// Like [`run`](Self::run), but gives up at once on an error for which
    /// `is_retryable` returns false.
    pub async fn run_if<T, E, R, F, Fut>(
        &self,
        label: &str,
        observer: &dyn RetryObserver,
        is_retryable: R,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        E: StdError + 'static,
        R: Fn(&E) -> bool,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(error) => {
                    let retries_left = if is_retryable(&error) {
                        self.max_attempts.saturating_sub(attempt)
                    } else {
                        0
                    };
                    observer.on_failed_attempt(&FailedAttempt {
                        label,
                        attempt_number: attempt,
                        retries_left,
                        error: &error,
                    });

                    if retries_left == 0 {
                        return Err(RetryError {
                            label: label.to_string(),
                            attempts: attempt,
                            source: error,
                        });
                    }

                    let delay = self.delay_after(attempt);
                    warn!(
                        "Attempt {} failed for {}: {}. {} retries left, next in {:?}",
                        attempt, label, error, retries_left, delay
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

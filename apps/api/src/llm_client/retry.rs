//! Bounded retry with exponential backoff for remote calls.
//!
//! A call moves through `Idle → Attempting → {Succeeded | Backoff → Attempting | Failed}`.
//! `Succeeded` and `Failed` are the two exits of [`retry_with_backoff`]; only
//! failures classified as [`FailureClass::Transient`] ever reach `Backoff`.
//! Attempts are strictly sequential and a started loop is never cancelled.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

/// Whether a failed attempt is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Rate limiting or temporary unavailability.
    Transient,
    /// Will not resolve on retry (bad request, auth, quota, ...).
    Terminal,
}

/// Errors that can tell the retry loop how to treat them.
pub trait Classify {
    fn classify(&self) -> FailureClass;
}

#[derive(Debug, Error, PartialEq)]
pub enum RetryPolicyError {
    #[error("max attempts must be at least 1")]
    ZeroAttempts,

    #[error("initial delay must be greater than zero")]
    ZeroDelay,

    #[error("backoff multiplier must be a finite number greater than 1 (got {0})")]
    Multiplier(f64),
}

/// Retry configuration. Validated on construction, never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_multiplier: f64,
    max_delay: Option<Duration>,
    jitter: bool,
}

impl RetryPolicy {
    /// Plain exponential policy: no ceiling, no jitter.
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        backoff_multiplier: f64,
    ) -> Result<Self, RetryPolicyError> {
        if max_attempts == 0 {
            return Err(RetryPolicyError::ZeroAttempts);
        }
        if initial_delay.is_zero() {
            return Err(RetryPolicyError::ZeroDelay);
        }
        if !backoff_multiplier.is_finite() || backoff_multiplier <= 1.0 {
            return Err(RetryPolicyError::Multiplier(backoff_multiplier));
        }

        Ok(Self {
            max_attempts,
            initial_delay,
            backoff_multiplier,
            max_delay: None,
            jitter: false,
        })
    }

    /// Caps every individual wait at `max_delay`.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Randomizes each wait into `[delay / 2, delay]`.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait before retry number `retry` (1-based), ceiling applied, jitter not applied.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);

        match self.max_delay {
            Some(ceiling) => delay.min(ceiling),
            None => delay,
        }
    }

    fn next_delay(&self, retry: u32) -> Duration {
        let delay = self.backoff_delay(retry);
        if !self.jitter {
            return delay;
        }
        let half = delay / 2;
        let spread = (delay - half).as_millis().min(u64::MAX as u128) as u64;
        half + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
    }
}

impl Default for RetryPolicy {
    /// Five attempts starting at 10s, doubling, capped at 60s, jittered.
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            max_delay: Some(Duration::from_secs(60)),
            jitter: true,
        }
    }
}

/// Terminal outcome of a retry loop.
#[derive(Debug, Error)]
#[error("remote call failed after {attempts} attempt(s): {source}")]
pub struct RetryError<E: std::error::Error + 'static> {
    /// Number of attempts actually made.
    pub attempts: u32,
    /// True when the last failure was transient and the attempt budget ran out.
    pub exhausted: bool,
    #[source]
    pub source: E,
}

enum Phase {
    Idle,
    Attempting { attempt: u32 },
    Backoff { attempt: u32, delay: Duration },
}

/// Runs `operation` until it succeeds, fails terminally, or `policy` runs out of attempts.
///
/// `operation` receives the 1-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Classify + 'static,
{
    let mut phase = Phase::Idle;

    loop {
        phase = match phase {
            Phase::Idle => Phase::Attempting { attempt: 1 },

            Phase::Attempting { attempt } => match operation(attempt).await {
                Ok(value) => {
                    debug!(attempt, "remote call succeeded");
                    return Ok(value);
                }
                Err(error) => match error.classify() {
                    FailureClass::Terminal => {
                        debug!(attempt, "remote call failed terminally: {error}");
                        return Err(RetryError {
                            attempts: attempt,
                            exhausted: false,
                            source: error,
                        });
                    }
                    FailureClass::Transient if attempt >= policy.max_attempts => {
                        warn!(
                            "Remote call still failing after {} attempts, giving up: {}",
                            attempt, error
                        );
                        return Err(RetryError {
                            attempts: attempt,
                            exhausted: true,
                            source: error,
                        });
                    }
                    FailureClass::Transient => {
                        let delay = policy.next_delay(attempt);
                        warn!(
                            "Remote call attempt {}/{} failed transiently ({}), retrying after {}ms",
                            attempt,
                            policy.max_attempts,
                            error,
                            delay.as_millis()
                        );
                        Phase::Backoff { attempt, delay }
                    }
                },
            },

            Phase::Backoff { attempt, delay } => {
                tokio::time::sleep(delay).await;
                Phase::Attempting {
                    attempt: attempt + 1,
                }
            }
        };
    }
}

//! Bounded retry for one unit of work.
//!
//! `max_attempts` counts every attempt, the first one included: a policy of
//! K invokes a permanently failing operation exactly K times.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each later one. Zero disables sleeping.
    pub backoff: Duration,
}

impl RetryPolicy {
    #[cfg(test)]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Duration::ZERO,
        }
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 || self.backoff.is_zero() {
            return Duration::ZERO;
        }
        self.backoff.saturating_mul(1 << (attempt - 2).min(16))
    }
}

/// Errors that know whether another attempt could succeed.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

#[derive(Debug, PartialEq, Eq)]
pub enum RetryFailure<E> {
    /// Every attempt failed with a transient error.
    Exhausted { attempts: u32, last: E },
    /// A non-transient error stopped the loop early.
    Unretryable { attempt: u32, error: E },
}

/// Runs `op` until it succeeds, fails with a non-transient error, or the
/// policy's attempts are used up. `op` receives the 1-based attempt number.
pub async fn run_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let delay = policy.delay_before(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let error = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !error.is_transient() {
            warn!("{label}: attempt {attempt} failed permanently: {error}");
            return Err(RetryFailure::Unretryable { attempt, error });
        }

        if attempt >= max_attempts {
            warn!("{label}: attempt {attempt}/{max_attempts} failed, giving up: {error}");
            return Err(RetryFailure::Exhausted {
                attempts: attempt,
                last: error,
            });
        }

        warn!("{label}: attempt {attempt}/{max_attempts} failed, retrying: {error}");
        attempt += 1;
    }
}

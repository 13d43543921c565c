//! Backoff retrier — exponential-delay retry for fallible operations.
//!
//! Applied at the transport-call boundary (around a single outbound
//! network call), never around the turn engine itself: tool and provider
//! failures inside a turn are handled by engine policy, not blindly
//! retried.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};

/// Retry schedule for a fallible operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first (must be >= 1).
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_factor: f64,

    /// Add up to 10% uniform jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// The sleep before the retry following failed attempt `attempt`
    /// (1-based): `base_delay * backoff_factor^(attempt - 1)`, plus jitter
    /// if enabled.
    fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let mut secs = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        if self.jitter && secs > 0.0 {
            secs += rand::rng().random_range(0.0..secs * 0.1);
        }
        Duration::from_secs_f64(secs)
    }
}

/// Run `op`, retrying failures that match `retryable` with exponential
/// backoff.
///
/// After `max_attempts` failures the last error is returned unchanged —
/// not wrapped — so callers can pattern-match on the original failure
/// kind. Errors that do not match `retryable` propagate immediately
/// without sleeping.
pub async fn with_retry<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    retryable: R,
    mut op: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !retryable(&err) {
                    return Err(err);
                }

                if attempt >= policy.max_attempts {
                    error!(
                        attempts = attempt,
                        error = %err,
                        "Operation failed after all retry attempts"
                    );
                    return Err(err);
                }

                let delay = policy.delay_after(attempt);
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn no_jitter_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            jitter: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_without_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, ProviderError> =
            with_retry(&no_jitter_policy(), ProviderError::is_retryable, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok("ok") }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, ProviderError> =
            with_retry(&no_jitter_policy(), ProviderError::is_retryable, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(ProviderError::Network("connection reset".into()))
                    } else {
                        Ok("recovered")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_timing_and_attempt_count() {
        // base 1.0s, factor 2.0: sleeps 1.0s then 2.0s, three invocations,
        // then the original error comes back unchanged.
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), ProviderError> =
            with_retry(&no_jitter_policy(), ProviderError::is_retryable, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::Timeout("upstream".into())) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert!(matches!(result.unwrap_err(), ProviderError::Timeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn jitter_stays_within_ten_percent() {
        let policy = RetryPolicy {
            jitter: true,
            ..no_jitter_policy()
        };
        let start = Instant::now();

        let result: Result<(), ProviderError> =
            with_retry(&policy, ProviderError::is_retryable, || async {
                Err(ProviderError::Network("down".into()))
            })
            .await;

        assert!(result.is_err());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed <= Duration::from_secs_f64(3.3));
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_propagates_immediately() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), ProviderError> =
            with_retry(&no_jitter_policy(), ProviderError::is_retryable, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::AuthenticationFailed("bad key".into())) }
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ProviderError::AuthenticationFailed(_)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}

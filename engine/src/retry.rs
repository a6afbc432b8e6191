//! Bounded retry with backoff for conflicting writes.
//!
//! A version conflict means another writer won the race; the losing request
//! reloads and retries the whole read-decide-write cycle. The bound exists to
//! cap tail latency under contention — under sustained pressure on a
//! near-full offer, some requests exhaust the budget and receive a retryable
//! error rather than hang.
//!
//! Business-rule rejections are never retried; only errors whose
//! [`is_retryable`](huddle_core::ClaimError::is_retryable) is true re-enter
//! the loop.
//!
//! # Example
//!
//! ```rust
//! use huddle_engine::retry::{RetryPolicy, retry_conflicts};
//!
//! # async fn example() -> Result<(), huddle_core::ClaimError> {
//! let policy = RetryPolicy::default();
//!
//! let result = retry_conflicts(&policy, || async {
//!     // Your read-decide-write attempt here
//!     Ok::<_, huddle_core::ClaimError>(42)
//! }).await?;
//!
//! assert_eq!(result, 42);
//! # Ok(())
//! # }
//! ```

use huddle_core::{ClaimError, ClaimStoreError};
use std::env;
use std::time::Duration;
use tokio::time::sleep;

/// Retry policy for conflicting writes.
///
/// # Default Values
///
/// - `max_retries`: 3 (one initial attempt plus three retries)
/// - `initial_delay`: 10ms
/// - `max_delay`: 100ms
/// - `multiplier`: 2.0 (delay doubles each retry)
///
/// The defaults keep the worst case comfortably under a second while giving a
/// loser of a race three fresh looks at the pool.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the initial one
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Cap on the backoff delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new policy builder.
    #[must_use]
    pub const fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            max_retries: None,
            initial_delay: None,
            max_delay: None,
            multiplier: None,
        }
    }

    /// Load the policy from environment variables with defaults:
    /// `CLAIM_RETRY_MAX_RETRIES`, `CLAIM_RETRY_INITIAL_DELAY_MS`,
    /// `CLAIM_RETRY_MAX_DELAY_MS`, `CLAIM_RETRY_MULTIPLIER`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env::var("CLAIM_RETRY_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            initial_delay: env::var("CLAIM_RETRY_INITIAL_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.initial_delay, Duration::from_millis),
            max_delay: env::var("CLAIM_RETRY_MAX_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.max_delay, Duration::from_millis),
            multiplier: env::var("CLAIM_RETRY_MULTIPLIER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.multiplier),
        }
    }

    /// Calculate the delay before the retry following `attempt` (0-based).
    ///
    /// Exponential backoff capped at `max_delay`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay;
        }

        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(delay_ms as u64);

        if delay > self.max_delay {
            self.max_delay
        } else {
            delay
        }
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_retries: Option<u32>,
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    multiplier: Option<f64>,
}

impl RetryPolicyBuilder {
    /// Set maximum number of retries.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set delay before the first retry.
    #[must_use]
    pub const fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set the backoff cap.
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set the backoff multiplier.
    #[must_use]
    pub const fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Build the [`RetryPolicy`].
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            initial_delay: self.initial_delay.unwrap_or(defaults.initial_delay),
            max_delay: self.max_delay.unwrap_or(defaults.max_delay),
            multiplier: self.multiplier.unwrap_or(defaults.multiplier),
        }
    }
}

/// Run one read-decide-write attempt, retrying retryable failures up to the
/// policy's bound.
///
/// Non-retryable errors (business-rule rejections) return immediately. When
/// the budget is exhausted on a version conflict, the caller receives
/// [`ClaimError::Contention`] — a retryable error, never a silent drop.
///
/// # Errors
///
/// The last error encountered, or `Contention` after exhausted conflicts.
pub async fn retry_conflicts<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T, ClaimError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClaimError>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::debug!(attempt, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                metrics::counter!("claim_ledger_write_conflicts_total").increment(1);

                if attempt >= policy.max_retries {
                    tracing::warn!(
                        attempt,
                        error = %err,
                        "retry budget exhausted under contention"
                    );
                    metrics::counter!("claim_ledger_retries_exhausted_total").increment(1);
                    return Err(match err {
                        ClaimError::Store(ClaimStoreError::Conflict { .. }) => {
                            ClaimError::Contention {
                                attempts: attempt + 1,
                            }
                        }
                        other => other,
                    });
                }

                let delay = policy.delay_for_attempt(attempt);
                tracing::debug!(
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "conflicting write, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use huddle_core::Version;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn conflict() -> ClaimError {
        ClaimError::Store(ClaimStoreError::Conflict {
            expected: Version::new(1),
            actual: Version::new(2),
        })
    }

    #[test]
    fn delay_calculation() {
        let policy = RetryPolicy::builder()
            .initial_delay(Duration::from_millis(10))
            .multiplier(2.0)
            .max_delay(Duration::from_millis(100))
            .build();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(10));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(20));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(40));
        // capped
        assert_eq!(policy.delay_for_attempt(6), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn succeeds_on_first_try() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = retry_conflicts(&policy, || {
            let c = Arc::clone(&calls_clone);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ClaimError>(7)
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_conflicts_then_succeeds() {
        let policy = RetryPolicy::builder()
            .max_retries(3)
            .initial_delay(Duration::from_millis(1))
            .build();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = retry_conflicts(&policy, || {
            let c = Arc::clone(&calls_clone);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(conflict())
                } else {
                    Ok(7)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_conflicts_surface_contention() {
        let policy = RetryPolicy::builder()
            .max_retries(2)
            .initial_delay(Duration::from_millis(1))
            .build();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result: Result<(), _> = retry_conflicts(&policy, || {
            let c = Arc::clone(&calls_clone);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(conflict())
            }
        })
        .await;

        assert!(matches!(result, Err(ClaimError::Contention { attempts: 3 })));
        assert_eq!(calls.load(Ordering::SeqCst), 3); // initial + 2 retries
    }

    #[tokio::test]
    async fn business_rejections_are_not_retried() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result: Result<(), _> = retry_conflicts(&policy, || {
            let c = Arc::clone(&calls_clone);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(ClaimError::CapacityExceeded {
                    capacity: 1,
                    claimed: 1,
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ClaimError::CapacityExceeded { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

//! Exponential backoff with additive jitter.

use super::strategy::BackoffStrategy;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Predicate deciding whether a failure is worth another attempt.
///
/// Receives the failure as a trait object; downcast it to inspect the
/// concrete error type.
pub type RetryPredicate = Arc<dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync>;

/// Exponential backoff strategy with bounded additive jitter.
///
/// # Mathematical Formula
///
/// For the delay after failed attempt `n` (0-indexed):
/// ```text
/// base_delay   = initial_delay * (multiplier ^ n)
/// capped_delay = min(base_delay, max_delay)      // only when max_delay is set
/// final_delay  = capped_delay + uniform(0, jitter)
/// ```
///
/// With the defaults (`initial_delay` 500ms, `multiplier` 2.0, `jitter`
/// 100ms) the waits are roughly 0.5s, 1s, 2s, 4s, each plus up to 100ms, which
/// spreads out callers that failed at the same moment.
///
/// # Examples
///
/// ```rust
/// use double_o_core::retry::{BackoffStrategy, ExponentialBackoff};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Default configuration (max_retries=3, initial=500ms, multiplier=2.0, jitter=100ms)
/// let backoff = ExponentialBackoff::default();
///
/// // Custom configuration: only retry I/O failures
/// let backoff = ExponentialBackoff::builder()
///     .max_retries(5)
///     .initial_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(30))
///     .jitter(Duration::from_millis(50))
///     .retry_if(|err| err.is::<std::io::Error>())
///     .build();
///
/// let result = backoff.execute(|| async {
///     // Your operation here
///     Ok::<_, std::io::Error>(42)
/// }).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Performance Characteristics
///
/// - **Memory**: O(1) - no allocations during retry loop
/// - **CPU**: O(1) per retry - simple arithmetic + one random number generation
/// - **I/O**: Sleeps between retries (`tokio::time::sleep` or `std::thread::sleep`)
#[derive(Clone)]
pub struct ExponentialBackoff {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Option<Duration>,
    multiplier: f64,
    jitter: Duration,
    retry_if: Option<RetryPredicate>,
}

impl ExponentialBackoff {
    /// Create a new builder for configuring exponential backoff.
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }

    /// Backoff that never retries: exactly one attempt.
    pub fn disabled() -> Self {
        Self::builder().max_retries(0).build()
    }
}

impl Default for ExponentialBackoff {
    /// Create an exponential backoff with sensible defaults.
    ///
    /// Defaults:
    /// - `max_retries`: 3
    /// - `initial_delay`: 500ms
    /// - `max_delay`: none
    /// - `multiplier`: 2.0 (doubles each time)
    /// - `jitter`: up to 100ms
    /// - retries every error
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for ExponentialBackoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExponentialBackoff")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("multiplier", &self.multiplier)
            .field("jitter", &self.jitter)
            .field("retry_if", &self.retry_if.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn should_retry(&self, error: &(dyn Error + 'static), _attempt: u32) -> bool {
        self.retry_if
            .as_ref()
            .is_none_or(|predicate| predicate(error))
    }

    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        // attempt 0 is the delay before the first RETRY (after the initial attempt fails)
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let mut delay = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);

        if let Some(max_delay) = self.max_delay {
            delay = delay.min(max_delay.as_secs_f64());
        }

        if !self.jitter.is_zero() {
            delay += self.jitter.as_secs_f64() * rand::random::<f64>();
        }

        Some(Duration::try_from_secs_f64(delay).unwrap_or(Duration::MAX))
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Builder for configuring `ExponentialBackoff`.
///
/// # Examples
///
/// ```rust
/// use double_o_core::retry::ExponentialBackoff;
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::builder()
///     .max_retries(5)
///     .initial_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(30))
///     .multiplier(2.0)
///     .jitter(Duration::from_millis(100))
///     .build();
/// ```
#[derive(Default)]
pub struct ExponentialBackoffBuilder {
    max_retries: Option<u32>,
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    multiplier: Option<f64>,
    jitter: Option<Duration>,
    retry_if: Option<RetryPredicate>,
}

impl ExponentialBackoffBuilder {
    /// Set the maximum number of retry attempts.
    ///
    /// Default: 3. Zero disables retrying.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the delay before the first retry (the backoff factor).
    ///
    /// Default: 500ms
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Cap every computed delay (before jitter) at `delay`.
    ///
    /// Default: uncapped
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set the exponential multiplier. Values below 1.0 are raised to 1.0.
    ///
    /// Default: 2.0 (doubles each time)
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(if multiplier.is_finite() {
            multiplier.max(1.0)
        } else {
            1.0
        });
        self
    }

    /// Set the upper bound of the uniform random delay added to every wait.
    ///
    /// Default: 100ms. `Duration::ZERO` makes delays deterministic.
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Only retry failures for which `predicate` returns `true`.
    ///
    /// Default: every failure is retried.
    pub fn retry_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    {
        self.retry_if = Some(Arc::new(predicate));
        self
    }

    /// Build the `ExponentialBackoff` instance.
    ///
    /// Uses default values for any unset parameters.
    pub fn build(self) -> ExponentialBackoff {
        ExponentialBackoff {
            max_retries: self.max_retries.unwrap_or(3),
            initial_delay: self.initial_delay.unwrap_or(Duration::from_millis(500)),
            max_delay: self.max_delay,
            multiplier: self.multiplier.unwrap_or(2.0),
            jitter: self.jitter.unwrap_or(Duration::from_millis(100)),
            retry_if: self.retry_if,
        }
    }
}

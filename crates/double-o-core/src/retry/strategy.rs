//! Retry strategies with exponential backoff and custom retry predicates.

use async_trait::async_trait;
use std::error::Error;
use std::future::Future;
use std::time::Duration;

/// A strategy for retrying failed operations with backoff.
///
/// Implementations decide whether a failure is worth another attempt, how
/// long to wait before it, and how many attempts are allowed. The retry loop
/// itself is provided twice, once per scheduling model:
///
/// - [`execute`](Self::execute) sleeps with `tokio::time::sleep`, yielding to
///   the runtime between attempts;
/// - [`execute_blocking`](Self::execute_blocking) sleeps the calling thread.
///
/// In both loops a failure is returned to the caller unchanged when it is not
/// retryable, when the retry budget is spent, or when
/// [`next_delay`](Self::next_delay) declines to schedule another attempt.
///
/// # Examples
///
/// ```rust
/// use double_o_core::retry::{BackoffStrategy, ExponentialBackoff};
/// use std::time::Duration;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backoff = ExponentialBackoff::builder()
///     .max_retries(3)
///     .initial_delay(Duration::from_millis(100))
///     .build();
///
/// let attempts = Arc::new(AtomicU32::new(0));
/// let result = backoff.execute(|| {
///     let attempts = Arc::clone(&attempts);
///     async move {
///         let current = attempts.fetch_add(1, Ordering::SeqCst);
///         if current < 2 {
///             Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "retry me"))
///         } else {
///             Ok(42)
///         }
///     }
/// }).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait BackoffStrategy: Send + Sync {
    /// Execute an async operation with retry logic.
    ///
    /// The operation is called until it succeeds, a non-retryable error
    /// occurs, or the maximum number of retries is exceeded. The operation is
    /// attempted at most `max_retries() + 1` times.
    ///
    /// # Returns
    /// - `Ok(T)`: The successful result
    /// - `Err(E)`: The last error, unchanged
    async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: Error + Send + Sync + 'static,
    {
        let mut attempt = 0;
        loop {
            let err = match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => err,
            };
            match self.retry_delay(&err, attempt) {
                Some(delay) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                None => return Err(err),
            }
        }
    }

    /// Execute a blocking operation with retry logic, sleeping the current
    /// thread between attempts.
    ///
    /// Same contract as [`execute`](Self::execute). Do not call this from
    /// inside an async task.
    fn execute_blocking<F, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Error + 'static,
    {
        let mut attempt = 0;
        loop {
            let err = match operation() {
                Ok(result) => return Ok(result),
                Err(err) => err,
            };
            match self.retry_delay(&err, attempt) {
                Some(delay) => {
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                None => return Err(err),
            }
        }
    }

    /// Decide whether the failure of attempt `attempt` (0-indexed) gets
    /// another try, and how long to wait first.
    ///
    /// Returns `None` when the error must be surfaced to the caller.
    fn retry_delay(&self, error: &(dyn Error + 'static), attempt: u32) -> Option<Duration> {
        if !self.should_retry(error, attempt) {
            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, error = %error, "failure is not retryable");
            return None;
        }
        if attempt >= self.max_retries() {
            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, error = %error, "retry budget exhausted");
            return None;
        }
        let delay = self.next_delay(attempt)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "retrying after transient failure"
        );
        Some(delay)
    }

    /// Determine if an error is retryable.
    ///
    /// Default implementation returns `true` for all errors. Override this
    /// to implement custom retry logic (e.g., only retry network errors).
    ///
    /// # Parameters
    /// - `error`: The error to evaluate; downcast it to inspect concrete types
    /// - `attempt`: The current attempt number (0-indexed)
    fn should_retry(&self, error: &(dyn Error + 'static), attempt: u32) -> bool {
        let _ = (error, attempt);
        true
    }

    /// Calculate the delay before the next retry attempt.
    ///
    /// # Parameters
    /// - `attempt`: The attempt that just failed (0-indexed)
    ///
    /// # Returns
    /// - `Some(Duration)`: Wait this long before the next retry
    /// - `None`: No more retries should be attempted
    ///
    /// The first attempt (attempt=0) calls `next_delay(0)` before the second try.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    /// Get the maximum number of retry attempts.
    ///
    /// If `max_retries() == 3`, the operation is attempted up to 4 times
    /// total (1 initial + 3 retries). Zero disables retrying.
    fn max_retries(&self) -> u32;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Retries only connection resets, with no delay.
    struct ResetOnly {
        max_retries: u32,
    }

    impl BackoffStrategy for ResetOnly {
        fn should_retry(&self, error: &(dyn Error + 'static), _attempt: u32) -> bool {
            error
                .downcast_ref::<io::Error>()
                .is_some_and(|e| e.kind() == io::ErrorKind::ConnectionReset)
        }

        fn next_delay(&self, _attempt: u32) -> Option<Duration> {
            Some(Duration::ZERO)
        }

        fn max_retries(&self) -> u32 {
            self.max_retries
        }
    }

    /// Refuses to schedule anything past the first retry.
    struct OneShot;

    impl BackoffStrategy for OneShot {
        fn next_delay(&self, attempt: u32) -> Option<Duration> {
            (attempt == 0).then_some(Duration::ZERO)
        }

        fn max_retries(&self) -> u32 {
            10
        }
    }

    #[tokio::test]
    async fn test_non_retryable_error_propagates_immediately() {
        let strategy = ResetOnly { max_retries: 5 };
        let attempts = Arc::new(AtomicU32::new(0));

        let result = strategy
            .execute(|| {
                let attempts = Arc::clone(&attempts);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
                }
            })
            .await;

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_last_error_is_returned_unchanged() {
        let strategy = ResetOnly { max_retries: 2 };
        let attempts = Arc::new(AtomicU32::new(0));

        let result = strategy
            .execute(|| {
                let attempts = Arc::clone(&attempts);
                async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        format!("reset #{n}"),
                    ))
                }
            })
            .await;

        assert_eq!(result.unwrap_err().to_string(), "reset #2");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_next_delay_none_stops_retrying() {
        let attempts = Arc::new(AtomicU32::new(0));

        let result = OneShot
            .execute(|| {
                let attempts = Arc::clone(&attempts);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(io::Error::other("always"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_blocking_driver_shares_policy() {
        let strategy = ResetOnly { max_retries: 3 };
        let mut attempts = 0;

        let result = strategy.execute_blocking(|| {
            attempts += 1;
            if attempts < 3 {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            } else {
                Ok("done")
            }
        });

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_blocking_driver_non_retryable() {
        let strategy = ResetOnly { max_retries: 3 };
        let mut attempts = 0;

        let result: Result<(), _> = strategy.execute_blocking(|| {
            attempts += 1;
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad body"))
        });

        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}

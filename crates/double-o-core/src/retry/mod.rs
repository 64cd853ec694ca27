//! Retry strategies and backoff implementations.
//!
//! This module provides one retry policy abstraction that can be driven from
//! async code ([`BackoffStrategy::execute`]) or from a plain thread
//! ([`BackoffStrategy::execute_blocking`]). Both drivers consult the same
//! `should_retry` / `next_delay` / `max_retries` decisions, so the policy is
//! written once.
//!
//! # Key Types
//!
//! - [`BackoffStrategy`] - Core trait for retry strategies
//! - [`ExponentialBackoff`] - Exponential backoff with additive jitter
//!
//! # Examples
//!
//! ```rust
//! use double_o_core::retry::{BackoffStrategy, ExponentialBackoff};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backoff = ExponentialBackoff::builder()
//!     .max_retries(3)
//!     .initial_delay(Duration::from_millis(100))
//!     .build();
//!
//! let result = backoff.execute(|| async {
//!     // Your operation here
//!     Ok::<_, std::io::Error>(42)
//! }).await?;
//! # Ok(())
//! # }
//! ```

mod exponential;
mod strategy;

pub use exponential::{ExponentialBackoff, ExponentialBackoffBuilder, RetryPredicate};
pub use strategy::BackoffStrategy;

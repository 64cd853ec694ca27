#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core building blocks for the double-o client.
//!
//! This crate provides the domain-free pieces the client is assembled from:
//!
//! - **TTL caching** via [`cache::CacheStore`], with two scheduling adapters
//!   - [`cache::TtlCache`] for threads sharing one instance
//!   - [`cache::AsyncTtlCache`] for tasks on a cooperative runtime
//! - **Retry strategies** via the [`retry::BackoffStrategy`] trait
//!   - Exponential backoff with additive jitter
//!   - Custom retry predicates
//!   - Async and blocking execution of the same policy
//! - **Resource lifecycle management** via [`resource::LazyResource`]
//! - **Declarative error boundaries** via the `error_boundary!` macro
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use double_o_core::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backoff = ExponentialBackoff::builder()
//!     .max_retries(3)
//!     .initial_delay(Duration::from_millis(100))
//!     .build();
//!
//! let result = backoff.execute(|| async {
//!     Ok::<_, std::io::Error>(42)
//! }).await?;
//!
//! let cache = TtlCache::new();
//! cache.set("token", result, Duration::from_secs(60));
//! assert_eq!(cache.get(&"token"), Some(42));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod resource;
pub mod retry;

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use double_o_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cache::{AsyncTtlCache, CacheStore, TtlCache};
    pub use crate::error_boundary;
    pub use crate::resource::{LazyResource, Resource};
    pub use crate::retry::{BackoffStrategy, ExponentialBackoff, ExponentialBackoffBuilder};
}

//! Time-to-live caching.
//!
//! The expiry semantics live in exactly one place, [`CacheStore`], which is a
//! plain single-owner map driven by an explicit `now` instant. The two public
//! caches are thin adapters that decide *how* exclusive access to that store
//! is obtained:
//!
//! - [`TtlCache`] guards the store with a blocking [`std::sync::Mutex`]. Use it
//!   when threads share one instance.
//! - [`AsyncTtlCache`] guards the store with [`tokio::sync::Mutex`], whose
//!   acquisition is a suspension point. Use it from async tasks.
//!
//! Every operation on either adapter runs its whole read-check-delete or write
//! sequence under the lock, and the lock is never held outside the cache, so a
//! slow caller elsewhere can never stall a cache read.
//!
//! # Examples
//!
//! ```rust
//! use double_o_core::cache::TtlCache;
//! use std::time::Duration;
//!
//! let cache = TtlCache::new();
//! cache.set("token".to_string(), "sk-123".to_string(), Duration::from_secs(300));
//! assert_eq!(cache.get("token"), Some("sk-123".to_string()));
//!
//! cache.invalidate("token");
//! assert_eq!(cache.get("token"), None);
//! ```

mod async_cache;
mod shared;
mod store;

pub use async_cache::AsyncTtlCache;
pub use shared::TtlCache;
pub use store::CacheStore;

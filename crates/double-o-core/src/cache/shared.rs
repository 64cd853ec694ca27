//! Blocking adapter for threads sharing one cache.

use super::CacheStore;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Thread-safe TTL cache.
///
/// Each operation takes the mutex, reads the clock, applies the
/// [`CacheStore`] rules and releases the mutex before returning. The value is
/// cloned out, so no guard ever escapes to the caller.
///
/// A panic in another thread while it held the lock cannot leave the store in
/// a half-applied state (every store operation is a single map call), so a
/// poisoned lock is recovered rather than propagated.
///
/// # Examples
///
/// ```rust
/// use double_o_core::cache::TtlCache;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let cache = Arc::new(TtlCache::new());
///
/// let writer = {
///     let cache = Arc::clone(&cache);
///     std::thread::spawn(move || {
///         cache.set("token".to_string(), "sk-123".to_string(), Duration::from_secs(60));
///     })
/// };
/// writer.join().unwrap();
///
/// assert_eq!(cache.get("token").as_deref(), Some("sk-123"));
/// ```
pub struct TtlCache<K, V> {
    store: Mutex<CacheStore<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            store: Mutex::new(CacheStore::new()),
        }
    }

    /// Return the live value for `key`, removing it if it has expired.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().get(key, Instant::now())
    }

    /// Insert or overwrite `key` for `ttl`.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        self.lock().set(key, value, ttl, Instant::now());
    }

    /// Remove `key` if present.
    pub fn invalidate<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().invalidate(key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop expired entries eagerly. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.lock().purge_expired(Instant::now())
    }

    /// Number of stored entries, including expired ones not yet observed.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, CacheStore<K, V>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.len())
            .finish()
    }
}

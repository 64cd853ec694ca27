//! Cooperative adapter for async tasks.

use super::CacheStore;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// TTL cache for async code.
///
/// Same semantics as [`TtlCache`](super::TtlCache), but exclusive access is
/// obtained through [`tokio::sync::Mutex`]. Waiting for the lock yields to the
/// runtime instead of blocking the worker thread, and a task that holds the
/// lock keeps it across any suspension, so other tasks never observe a
/// half-applied check-then-delete.
///
/// # Examples
///
/// ```rust
/// use double_o_core::cache::AsyncTtlCache;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let cache = AsyncTtlCache::new();
/// cache.set("env:token".to_string(), 7u32, Duration::from_secs(30)).await;
/// assert_eq!(cache.get("env:token").await, Some(7));
/// # }
/// ```
pub struct AsyncTtlCache<K, V> {
    store: Mutex<CacheStore<K, V>>,
}

impl<K, V> AsyncTtlCache<K, V>
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
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().await.get(key, Instant::now())
    }

    /// Insert or overwrite `key` for `ttl`.
    pub async fn set(&self, key: K, value: V, ttl: Duration) {
        self.store.lock().await.set(key, value, ttl, Instant::now());
    }

    /// Remove `key` if present.
    pub async fn invalidate<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().await.invalidate(key);
    }

    /// Remove every entry.
    pub async fn clear(&self) {
        self.store.lock().await.clear();
    }

    /// Drop expired entries eagerly. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        self.store.lock().await.purge_expired(Instant::now())
    }

    /// Number of stored entries, including expired ones not yet observed.
    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }
}

impl<K, V> Default for AsyncTtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// Only the entry count is shown; keys and values may be credentials.
impl<K, V> fmt::Debug for AsyncTtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("AsyncTtlCache");
        match self.store.try_lock() {
            Ok(store) => debug.field("entries", &store.len()),
            Err(_) => debug.field("entries", &format_args!("<locked>")),
        };
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cache_set_and_get() {
        let cache = AsyncTtlCache::new();
        cache.set("key1", "value1", Duration::from_secs(60)).await;

        assert_eq!(cache.get(&"key1").await, Some("value1"));
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache: AsyncTtlCache<String, String> = AsyncTtlCache::new();
        assert_eq!(cache.get("nonexistent_key").await, None);
    }

    #[tokio::test]
    async fn test_cache_expiry() {
        let cache = AsyncTtlCache::new();
        cache.set("key1", "value1", Duration::from_millis(100)).await;

        assert_eq!(cache.get(&"key1").await, Some("value1"));

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.get(&"key1").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_invalidate() {
        let cache = AsyncTtlCache::new();
        cache.set("key1", "value1", Duration::from_secs(60)).await;
        cache.set("key2", "value2", Duration::from_secs(60)).await;

        cache.invalidate(&"key1").await;

        assert_eq!(cache.get(&"key1").await, None);
        assert_eq!(cache.get(&"key2").await, Some("value2"));
    }

    #[tokio::test]
    async fn test_cache_clear() {
        let cache = AsyncTtlCache::new();
        cache.set("key1", "value1", Duration::from_secs(60)).await;
        cache.set("key2", "value2", Duration::from_secs(60)).await;

        cache.clear().await;

        assert_eq!(cache.get(&"key1").await, None);
        assert_eq!(cache.get(&"key2").await, None);
    }

    #[tokio::test]
    async fn test_interleaved_tasks_on_one_runtime_thread() {
        let cache = Arc::new(AsyncTtlCache::new());
        let mut tasks = tokio::task::JoinSet::new();

        for task in 0..16u32 {
            let cache = Arc::clone(&cache);
            tasks.spawn(async move {
                for i in 0..50u32 {
                    cache.set(i % 4, task, Duration::from_secs(60)).await;
                    tokio::task::yield_now().await;
                    if let Some(value) = cache.get(&(i % 4)).await {
                        assert!(value < 16);
                    }
                }
            });
        }

        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        assert_eq!(cache.len().await, 4);
    }
}

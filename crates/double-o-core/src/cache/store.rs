//! Unsynchronized TTL store shared by both cache adapters.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A cached value together with the instant it stops being valid.
///
/// `expires_at == None` means the TTL was too large to represent as an
/// [`Instant`]; such entries never expire on their own.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

/// Key-value store with per-entry expiry.
///
/// The store performs no locking and reads no clock: every time-dependent
/// operation takes the current instant from the caller. This keeps the
/// expiry rules deterministic and lets [`TtlCache`](super::TtlCache) and
/// [`AsyncTtlCache`](super::AsyncTtlCache) share one implementation.
///
/// Invariants:
/// - a `get` never returns a value at or past its expiry instant;
/// - a `get` that observes an expired entry removes it;
/// - `set` replaces any previous entry for the key wholesale.
///
/// # Examples
///
/// ```rust
/// use double_o_core::cache::CacheStore;
/// use std::time::{Duration, Instant};
///
/// let mut store = CacheStore::new();
/// let start = Instant::now();
///
/// store.set("token", "sk-123", Duration::from_secs(5), start);
/// assert_eq!(store.get("token", start + Duration::from_secs(4)), Some("sk-123"));
/// assert_eq!(store.get("token", start + Duration::from_secs(5)), None);
/// assert!(store.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct CacheStore<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Look up a live value.
    ///
    /// An entry whose expiry instant is at or before `now` is removed and
    /// reported as absent.
    pub fn get<Q>(&mut self, key: &Q, now: Instant) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let live = self.entries.get(key)?.is_live(now);
        if live {
            self.entries.get(key).map(|entry| entry.value.clone())
        } else {
            self.entries.remove(key);
            None
        }
    }

    /// Insert or overwrite `key`, valid until `now + ttl`.
    ///
    /// A zero TTL is accepted: the entry is already expired for any later read.
    pub fn set(&mut self, key: K, value: V, ttl: Duration, now: Instant) {
        let expires_at = now.checked_add(ttl);
        self.entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Remove `key` if present. Returns whether an entry was removed.
    pub fn invalidate<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key).is_some()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop all entries that are expired at `now`. Returns how many were dropped.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }

    /// Number of stored entries, including expired ones not yet observed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Default for CacheStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn test_set_then_get_before_expiry() {
        let mut store = CacheStore::new();
        let t0 = Instant::now();

        store.set("key1", "value1", 60 * SECOND, t0);

        assert_eq!(store.get("key1", t0), Some("value1"));
        assert_eq!(store.get("key1", t0 + 59 * SECOND), Some("value1"));
    }

    #[test]
    fn test_get_at_expiry_instant_is_absent_and_removes_entry() {
        let mut store = CacheStore::new();
        let t0 = Instant::now();

        store.set("key1", "value1", 10 * SECOND, t0);
        assert_eq!(store.len(), 1);

        assert_eq!(store.get("key1", t0 + 10 * SECOND), None);
        assert_eq!(store.len(), 0, "expired entry must be removed by get");

        // Going back in time does not resurrect it.
        assert_eq!(store.get("key1", t0), None);
    }

    #[test]
    fn test_zero_ttl_is_expired_on_next_read() {
        let mut store = CacheStore::new();
        let t0 = Instant::now();

        store.set("key1", "value1", Duration::ZERO, t0);

        assert_eq!(store.get("key1", t0), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let mut store = CacheStore::new();
        let t0 = Instant::now();

        store.set("key1", "value1", Duration::MAX, t0);

        assert_eq!(store.get("key1", t0 + 1_000_000 * SECOND), Some("value1"));
    }

    #[test]
    fn test_overwrite_replaces_value_and_expiry() {
        let mut store = CacheStore::new();
        let t0 = Instant::now();

        store.set("key1", "old", SECOND, t0);
        store.set("key1", "new", 100 * SECOND, t0);

        assert_eq!(store.get("key1", t0 + 50 * SECOND), Some("new"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let mut store = CacheStore::new();
        let t0 = Instant::now();

        store.set("key1", "value1", 60 * SECOND, t0);
        store.set("key2", "value2", 60 * SECOND, t0);

        assert!(store.invalidate("key1"));
        assert!(!store.invalidate("key1"), "second invalidate is a no-op");
        assert!(!store.invalidate("missing"));

        assert_eq!(store.get("key1", t0), None);
        assert_eq!(store.get("key2", t0), Some("value2"));
    }

    #[test]
    fn test_clear() {
        let mut store = CacheStore::new();
        let t0 = Instant::now();

        store.set("key1", "value1", 60 * SECOND, t0);
        store.set("key2", "value2", 60 * SECOND, t0);
        store.clear();

        assert_eq!(store.get("key1", t0), None);
        assert_eq!(store.get("key2", t0), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let mut store = CacheStore::new();
        let t0 = Instant::now();

        store.set("short", 1, SECOND, t0);
        store.set("long", 2, 60 * SECOND, t0);

        assert_eq!(store.purge_expired(t0 + 2 * SECOND), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("long", t0 + 2 * SECOND), Some(2));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(u8, u32, u64),
        Get(u8),
        Invalidate(u8),
        Clear,
        Advance(u64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4, any::<u32>(), 0u64..20).prop_map(|(k, v, ttl)| Op::Set(k, v, ttl)),
            (0u8..4).prop_map(Op::Get),
            (0u8..4).prop_map(Op::Invalidate),
            Just(Op::Clear),
            (0u64..10).prop_map(Op::Advance),
        ]
    }

    proptest! {
        /// The store agrees with a naive model that keeps absolute expiry seconds.
        #[test]
        fn prop_store_matches_model(ops in prop::collection::vec(op_strategy(), 1..64)) {
            let t0 = Instant::now();
            let mut elapsed = 0u64;
            let mut store = CacheStore::new();
            let mut model: HashMap<u8, (u32, u64)> = HashMap::new();

            for op in ops {
                let now = t0 + Duration::from_secs(elapsed);
                match op {
                    Op::Set(k, v, ttl) => {
                        store.set(k, v, Duration::from_secs(ttl), now);
                        model.insert(k, (v, elapsed + ttl));
                    }
                    Op::Get(k) => {
                        let expected = match model.get(&k) {
                            Some(&(v, expires)) if elapsed < expires => Some(v),
                            _ => {
                                model.remove(&k);
                                None
                            }
                        };
                        prop_assert_eq!(store.get(&k, now), expected);
                    }
                    Op::Invalidate(k) => {
                        store.invalidate(&k);
                        model.remove(&k);
                        prop_assert_eq!(store.get(&k, now), None);
                    }
                    Op::Clear => {
                        store.clear();
                        model.clear();
                        prop_assert!(store.is_empty());
                    }
                    Op::Advance(secs) => elapsed += secs,
                }
            }
        }
    }
}

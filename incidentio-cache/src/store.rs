//! TTL cache store.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// A cached value together with its expiry instant.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value.
    pub value: V,
    /// Instant after which the entry is stale.
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    /// An entry is expired once `now` is strictly past its expiry.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Thread-safe key/value cache with a fixed per-instance TTL.
///
/// Reads share a read lock and may run concurrently; `set`, `delete`,
/// `clear` and `clean_expired` take the write lock. The lock is never
/// held across an `.await`.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// The time-to-live stamped onto every entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a key. Absent and expired entries both yield `None`.
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;

        if entry.is_expired_at(Instant::now()) {
            trace!(key, "cache entry expired");
            return None;
        }

        Some(entry.value.clone())
    }

    /// Store a value, replacing any previous entry and restarting its TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            expires_at: expiry_after(Instant::now(), self.ttl),
        };
        self.entries.write().insert(key.into(), entry);
    }

    /// Remove a key. Returns whether an entry (stale or not) was present.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Drop every expired entry in a single pass, returning how many were removed.
    pub fn clean_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - entries.len();

        if removed > 0 {
            trace!(removed, "removed expired cache entries");
        }
        removed
    }

    /// Number of stored entries, including ones that have expired but not been reaped.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Roughly 30 years; stands in for "never" when `now + ttl` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn expiry_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("key1", "value1".to_string());

        assert_eq!(cache.get("key1"), Some("value1".to_string()));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("key", 1);
        cache.set("key", 2);

        assert_eq!(cache.get("key"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = TtlCache::new(Duration::from_millis(100));
        cache.set("key", "value");

        tokio::time::advance(Duration::from_millis(50)).await;
        assert_eq!(cache.get("key"), Some("value"));

        tokio::time::advance(Duration::from_millis(51)).await;
        assert_eq!(cache.get("key"), None);

        // Lazy expiry keeps the stale entry until it is reaped.
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_restarts_ttl() {
        let cache = TtlCache::new(Duration::from_millis(100));
        cache.set("key", 1);

        tokio::time::advance(Duration::from_millis(80)).await;
        cache.set("key", 2);

        tokio::time::advance(Duration::from_millis(80)).await;
        assert_eq!(cache.get("key"), Some(2));
    }

    #[test]
    fn test_unrepresentable_ttl_does_not_panic() {
        let cache = TtlCache::new(Duration::MAX);
        cache.set("key", 1);

        assert_eq!(cache.get("key"), Some(1));
        assert_eq!(cache.clean_expired(), 0);
    }

    #[test]
    fn test_delete() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("key", "value");

        assert!(cache.delete("key"));
        assert!(!cache.delete("key"));
        assert_eq!(cache.get("key"), None);
    }

    #[test]
    fn test_clear() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("b", 2);

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_expired_only_removes_stale_entries() {
        let cache = TtlCache::new(Duration::from_millis(100));
        cache.set("old1", 1);
        cache.set("old2", 2);

        tokio::time::advance(Duration::from_millis(150)).await;
        cache.set("fresh", 3);

        assert_eq!(cache.clean_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh"), Some(3));
    }
}

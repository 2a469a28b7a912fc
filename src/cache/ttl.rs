/// Generic in-memory cache with per-instance TTL
///
/// Thread-safe, generic over key/value types. Staleness is enforced at read
/// time: a value is never returned once its age reaches the TTL. `sweep`
/// only bounds memory for keys that are written once and never read again.
/// Tracks metrics for the health endpoint.
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Cache entry with its write time
///
/// Replaced wholesale on overwrite, never mutated in place.
struct CacheEntry<V> {
    value: V,
    written_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            written_at: Instant::now(),
        }
    }

    fn age(&self) -> Duration {
        self.written_at.elapsed()
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub inserts: u64,
    pub swept: u64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Time-bounded cache keyed by logical request identity
pub struct TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    ttl: Duration,
    data: RwLock<HashMap<K, CacheEntry<V>>>,
    metrics: RwLock<CacheMetrics>,
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Create a cache with the given time-to-live
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            data: RwLock::new(HashMap::new()),
            metrics: RwLock::new(CacheMetrics::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a value (None when missing or when its age reached the TTL)
    pub fn get(&self, key: &K) -> Option<V> {
        let mut data = self.data.write().unwrap();

        if let Some(entry) = data.get(key) {
            if entry.age() >= self.ttl {
                data.remove(key);

                let mut metrics = self.metrics.write().unwrap();
                metrics.misses += 1;
                metrics.expirations += 1;
                return None;
            }

            let value = entry.value.clone();
            let mut metrics = self.metrics.write().unwrap();
            metrics.hits += 1;
            Some(value)
        } else {
            let mut metrics = self.metrics.write().unwrap();
            metrics.misses += 1;
            None
        }
    }

    /// Insert a value, overwriting any existing entry (last-writer-wins)
    pub fn put(&self, key: K, value: V) {
        let mut data = self.data.write().unwrap();
        data.insert(key, CacheEntry::new(value));

        let mut metrics = self.metrics.write().unwrap();
        metrics.inserts += 1;
    }

    /// Current entry count (expired entries included until read or swept)
    pub fn len(&self) -> usize {
        self.data.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose age exceeds `ttl * stale_multiple`
    ///
    /// Memory hygiene only; read-time TTL checks keep correctness regardless.
    pub fn sweep(&self, stale_multiple: u32) -> usize {
        let cutoff = self.ttl * stale_multiple.max(1);
        let mut data = self.data.write().unwrap();

        let before = data.len();
        data.retain(|_, entry| entry.age() < cutoff);
        let removed = before - data.len();

        if removed > 0 {
            let mut metrics = self.metrics.write().unwrap();
            metrics.swept += removed as u64;
        }
        removed
    }

    /// Get current metrics
    pub fn metrics(&self) -> CacheMetrics {
        self.metrics.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_get_after_put_returns_exact_value() {
        let cache: TtlCache<String, Vec<u32>> = TtlCache::new(Duration::from_secs(60));

        cache.put("key".to_string(), vec![1, 2, 3]);
        assert_eq!(cache.get(&"key".to_string()), Some(vec![1, 2, 3]));

        // Miss for unknown key
        assert_eq!(cache.get(&"other".to_string()), None);

        let metrics = cache.metrics();
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.inserts, 1);
    }

    #[test]
    fn test_ttl_expiration() {
        let cache: TtlCache<String, String> = TtlCache::new(Duration::from_millis(50));

        cache.put("key".to_string(), "value".to_string());
        assert_eq!(cache.get(&"key".to_string()), Some("value".to_string()));

        thread::sleep(Duration::from_millis(70));
        assert_eq!(cache.get(&"key".to_string()), None);
        assert_eq!(cache.metrics().expirations, 1);
    }

    #[test]
    fn test_put_overwrites() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));

        cache.put("key".to_string(), 1);
        cache.put("key".to_string(), 2);

        assert_eq!(cache.get(&"key".to_string()), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sweep_drops_only_long_stale_entries() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(20));

        cache.put("old".to_string(), 1);
        thread::sleep(Duration::from_millis(50));
        cache.put("fresh".to_string(), 2);

        // "old" is past 2x its TTL, "fresh" is not
        let removed = cache.sweep(2);
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"fresh".to_string()), Some(2));
    }
}

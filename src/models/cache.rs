use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Cache entry with TTL
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// In-memory keyed cache where every entry shares one TTL
#[derive(Debug)]
pub struct TtlCache<T> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<T>>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Get a live value; expired entries read as missing
    pub fn get(&self, key: &str) -> Option<T> {
        let cache = self.entries.read().ok()?;
        let entry = cache.get(key)?;

        if entry.is_expired() {
            return None;
        }

        Some(entry.value.clone())
    }

    pub fn set(&self, key: String, value: T) {
        if let Ok(mut cache) = self.entries.write() {
            cache.insert(key, CacheEntry::new(value, self.ttl));
        }
    }

    pub fn invalidate(&self, key: &str) {
        if let Ok(mut cache) = self.entries.write() {
            cache.remove(key);
        }
    }

    /// Clean up expired entries
    pub fn cleanup_expired(&self) {
        if let Ok(mut cache) = self.entries.write() {
            cache.retain(|_, entry| !entry.is_expired());
        }
    }

    pub fn get_stats(&self) -> CacheStats {
        let (total_entries, expired_entries) = self
            .entries
            .read()
            .map(|c| (c.len(), c.values().filter(|e| e.is_expired()).count()))
            .unwrap_or((0, 0));

        CacheStats {
            total_entries,
            expired_entries,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
}

/// Cache key builder for consistent key generation
pub struct CacheKey;

impl CacheKey {
    pub fn price(token_id: &str) -> String {
        format!("price:{}:usd", token_id.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cache_entry_expiration() {
        let entry = CacheEntry::new("test_value".to_string(), Duration::from_millis(10));
        assert!(!entry.is_expired());

        std::thread::sleep(Duration::from_millis(15));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_cache_basic_operations() {
        let cache: TtlCache<f64> = TtlCache::new(Duration::from_secs(60));

        cache.set(CacheKey::price("spark"), 0.05);
        assert_eq!(cache.get(&CacheKey::price("spark")), Some(0.05));

        // Test non-existent key
        assert!(cache.get(&CacheKey::price("other")).is_none());

        cache.invalidate(&CacheKey::price("spark"));
        assert!(cache.get(&CacheKey::price("spark")).is_none());
    }

    #[test]
    fn test_expired_entries_are_hidden_and_cleaned() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_millis(5));
        cache.set("a".to_string(), 1);

        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get_stats().expired_entries, 1);

        cache.cleanup_expired();
        assert_eq!(cache.get_stats().total_entries, 0);
    }

    #[test]
    fn test_cache_key_generation() {
        assert_eq!(CacheKey::price("SPARK"), "price:spark:usd");
    }
}

//! Localization lookup caching.
//!
//! Provides an LRU cache with TTL expiration keyed by `(culture, key)`.
//! Misses are cached as well so a key the source does not know is only
//! looked up once per TTL.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::config::CacheConfig;

type CacheKey = (String, String);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Option<String>,
    created_at: Instant,
}

impl CacheEntry {
    fn new(value: Option<String>) -> Self {
        Self {
            value,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Thread-safe LRU cache with TTL expiration for localized strings.
///
/// # Example
///
/// ```rust
/// use cms_macro_engine::{CacheConfig, LocalizationCache};
///
/// let cache = LocalizationCache::new(CacheConfig::default());
/// cache.set("en-US", "general.ok", Some("OK".to_string()));
///
/// assert_eq!(cache.get("en-US", "general.ok"), Some(Some("OK".to_string())));
/// assert_eq!(cache.get("cs-CZ", "general.ok"), None);
/// ```
pub struct LocalizationCache {
    inner: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl LocalizationCache {
    /// Creates a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_capacity(config.max_entries, config.ttl)
    }

    /// Creates a cache with custom capacity and TTL.
    pub fn with_capacity(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Gets a cached lookup.
    ///
    /// The outer `None` means "not cached"; `Some(None)` is a cached miss.
    /// Expired entries are dropped and reported as not cached.
    pub fn get(&self, culture: &str, key: &str) -> Option<Option<String>> {
        let cache_key = (culture.to_string(), key.to_string());
        let mut cache = self.inner.lock();

        if let Some(entry) = cache.get(&cache_key) {
            if entry.is_expired(self.ttl) {
                cache.pop(&cache_key);
                return None;
            }
            return Some(entry.value.clone());
        }

        None
    }

    /// Stores a lookup result, evicting the least recently used entry when full.
    pub fn set(&self, culture: &str, key: &str, value: Option<String>) {
        self.inner
            .lock()
            .put((culture.to_string(), key.to_string()), CacheEntry::new(value));
    }

    /// Number of entries, including expired ones not yet cleaned up.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Removes expired entries.
    pub fn cleanup_expired(&self) {
        let mut cache = self.inner.lock();
        let expired: Vec<CacheKey> = cache
            .iter()
            .filter(|(_, entry)| entry.is_expired(self.ttl))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            cache.pop(&key);
        }
    }
}

impl std::fmt::Debug for LocalizationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizationCache")
            .field("entries", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

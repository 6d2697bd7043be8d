use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::storage::LocalStorage;

/// Namespace used when no cache name is given.
pub const DEFAULT_CACHE_NAME: &str = "anim-media-cache";

/// TTL used by `set_default`: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

const MILLIS_PER_MINUTE: i64 = 60_000;

/// A stored value with the time it was written and how long it stays valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    /// Epoch milliseconds at which the entry was stored.
    pub timestamp: i64,
    /// Validity in milliseconds.
    pub ttl: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, now_millis: i64, ttl: Duration) -> Self {
        Self {
            data,
            timestamp: now_millis,
            ttl: duration_millis(ttl),
        }
    }

    pub fn is_expired(&self, now_millis: i64) -> bool {
        now_millis.saturating_sub(self.timestamp) > self.ttl
    }

    pub fn age_minutes(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.timestamp) / MILLIS_PER_MINUTE
    }

    pub fn age_display(&self, now_millis: i64) -> String {
        let minutes = self.age_minutes(now_millis);
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// TTL-bounded key/value cache over local storage.
///
/// Storage failures never reach the caller: a failed write is logged and the
/// cache behaves as if nothing was stored, a failed read is a miss.
pub struct SmartCache {
    cache_name: String,
    storage: Arc<dyn LocalStorage>,
    clock: Arc<dyn Clock>,
}

impl SmartCache {
    pub fn new(storage: Arc<dyn LocalStorage>, clock: Arc<dyn Clock>) -> Self {
        Self::with_name(DEFAULT_CACHE_NAME, storage, clock)
    }

    pub fn with_name(
        cache_name: impl Into<String>,
        storage: Arc<dyn LocalStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache_name: cache_name.into(),
            storage,
            clock,
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}_{}", self.cache_name, key)
    }

    /// Store `data` under `key` for `ttl`.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, data: &T, ttl: Duration) {
        let entry = CacheEntry::new(data, self.clock.now_millis(), ttl);
        let storage_key = self.storage_key(key);

        let contents = match serde_json::to_string(&entry) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(key = %storage_key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };

        if let Err(e) = self.storage.set_item(&storage_key, &contents) {
            warn!(key = %storage_key, error = %e, "Failed to write cache entry");
        }
    }

    /// Store `data` under `key` with the default one hour TTL.
    pub fn set_default<T: Serialize + ?Sized>(&self, key: &str, data: &T) {
        self.set(key, data, DEFAULT_TTL)
    }

    /// Read `key`, removing it if its TTL has elapsed.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let storage_key = self.storage_key(key);
        let entry: CacheEntry<T> = self.load(&storage_key)?;

        if entry.is_expired(self.clock.now_millis()) {
            debug!(key = %storage_key, "Cache entry expired");
            if let Err(e) = self.storage.remove_item(&storage_key) {
                warn!(key = %storage_key, error = %e, "Failed to remove expired cache entry");
            }
            return None;
        }

        Some(entry.data)
    }

    /// Age of a stored entry for display, whether or not it has expired.
    pub fn entry_age(&self, key: &str) -> Option<String> {
        let storage_key = self.storage_key(key);
        let entry: CacheEntry<serde_json::Value> = self.load(&storage_key)?;
        Some(entry.age_display(self.clock.now_millis()))
    }

    /// Remove every key in this cache's namespace. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let prefix = format!("{}_", self.cache_name);
        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(cache = %self.cache_name, error = %e, "Failed to list cache keys");
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys.iter().filter(|k| k.starts_with(&prefix)) {
            match self.storage.remove_item(key) {
                Ok(()) => removed += 1,
                Err(e) => warn!(key = %key, error = %e, "Failed to remove cache entry"),
            }
        }
        debug!(cache = %self.cache_name, removed, "Cleared cache");
        removed
    }

    fn load<T: DeserializeOwned>(&self, storage_key: &str) -> Option<CacheEntry<T>> {
        let contents = match self.storage.get_item(storage_key) {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %storage_key, error = %e, "Failed to read cache entry");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = %storage_key, error = %e, "Failed to parse cache entry");
                None
            }
        }
    }
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    const T0: i64 = 1_726_000_000_000;

    fn cache_with(storage: Arc<MemoryStorage>, clock: Arc<ManualClock>) -> SmartCache {
        SmartCache::new(storage, clock)
    }

    #[test]
    fn test_get_before_ttl_returns_payload() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(T0));
        let cache = cache_with(storage.clone(), clock.clone());

        cache.set("events", &json!({"events": [1, 2]}), Duration::from_millis(1_000));
        clock.advance(1_000);

        let value: Option<serde_json::Value> = cache.get("events");
        assert_eq!(value, Some(json!({"events": [1, 2]})));
    }

    #[test]
    fn test_get_after_ttl_removes_entry() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(T0));
        let cache = cache_with(storage.clone(), clock.clone());

        cache.set("events", &vec![1, 2, 3], Duration::from_millis(1_000));
        assert!(storage.get_item("anim-media-cache_events").unwrap().is_some());

        clock.advance(1_001);
        assert_eq!(cache.get::<Vec<i32>>("events"), None);
        assert!(storage.get_item("anim-media-cache_events").unwrap().is_none());
    }

    #[test]
    fn test_expired_entries_linger_until_read() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(T0));
        let cache = cache_with(storage.clone(), clock.clone());

        cache.set("a", "x", Duration::from_millis(10));
        cache.set("b", "y", Duration::from_millis(10));
        clock.advance(60_000);

        // Nothing sweeps: both are still stored
        assert_eq!(storage.len(), 2);
        assert_eq!(cache.get::<String>("a"), None);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_stored_format() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(T0));
        let cache = cache_with(storage.clone(), clock);

        cache.set_default("config", &json!({"site": "Anim'Média"}));
        let raw = storage.get_item("anim-media-cache_config").unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            parsed,
            json!({"data": {"site": "Anim'Média"}, "timestamp": T0, "ttl": 3_600_000})
        );
    }

    #[test]
    fn test_malformed_entry_is_a_miss() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(T0));
        storage.set_item("anim-media-cache_broken", "{not json").unwrap();
        let cache = cache_with(storage.clone(), clock);

        assert_eq!(cache.get::<serde_json::Value>("broken"), None);
        assert_eq!(cache.get::<serde_json::Value>("missing"), None);
    }

    #[test]
    fn test_write_failure_degrades_to_noop() {
        let storage = Arc::new(MemoryStorage::with_quota(16));
        let clock = Arc::new(ManualClock::new(T0));
        let cache = cache_with(storage.clone(), clock);

        cache.set_default("big", &"x".repeat(100));
        assert_eq!(cache.get::<String>("big"), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_clear_only_touches_namespace() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(T0));
        storage.set_item("analytics", "[]").unwrap();
        storage.set_item("cookieConsent", "true").unwrap();
        storage.set_item("anim-media-cache-other_key", "1").unwrap();

        let cache = cache_with(storage.clone(), clock.clone());
        let other = SmartCache::with_name("images", storage.clone(), clock);
        cache.set_default("events", &1);
        cache.set_default("config", &2);
        other.set_default("logo", &3);

        assert_eq!(cache.clear(), 2);
        let mut keys = storage.keys().unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "analytics".to_string(),
                "anim-media-cache-other_key".to_string(),
                "cookieConsent".to_string(),
                "images_logo".to_string(),
            ]
        );
    }

    #[test]
    fn test_entry_age_display() {
        let entry = CacheEntry::new((), T0, DEFAULT_TTL);
        assert_eq!(entry.age_display(T0), "just now");
        assert_eq!(entry.age_display(T0 - 5_000), "just now");
        assert_eq!(entry.age_display(T0 + 5 * MILLIS_PER_MINUTE), "5m ago");
        assert_eq!(entry.age_display(T0 + 90 * MILLIS_PER_MINUTE), "2h ago");
        assert_eq!(entry.age_display(T0 + 36 * 60 * MILLIS_PER_MINUTE), "2d ago");
        assert_eq!(entry.age_display(T0 + 25 * 60 * MILLIS_PER_MINUTE), "1d ago");
    }

    #[test]
    fn test_out_of_range_timestamp_is_expired() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(T0));
        storage
            .set_item(
                "anim-media-cache_old",
                &format!(r#"{{"data": 1, "timestamp": {}, "ttl": 1000}}"#, i64::MIN),
            )
            .unwrap();
        let cache = cache_with(storage.clone(), clock.clone());

        assert!(cache.entry_age("old").is_some());
        assert_eq!(cache.get::<i32>("old"), None);
        assert!(storage.is_empty());

        let future = CacheEntry::new((), i64::MAX, DEFAULT_TTL);
        assert!(!future.is_expired(i64::MIN));
        assert_eq!(future.age_display(i64::MIN), "just now");
    }

    #[test]
    fn test_entry_age_through_cache() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(T0));
        let cache = cache_with(storage, clock.clone());

        assert_eq!(cache.entry_age("events"), None);
        cache.set_default("events", &[1]);
        clock.advance(10 * MILLIS_PER_MINUTE);
        assert_eq!(cache.entry_age("events").as_deref(), Some("10m ago"));
    }
}

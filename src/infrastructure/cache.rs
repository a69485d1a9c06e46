// Per-component result cache with TTL and lazy eviction
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry {
    data: Value,
    inserted_at: Instant,
}

/// Key → (value, timestamp) store. Expired entries are evicted on
/// read; there is no background sweeper. Each dashboard owns its own
/// instance, so tests and multiple dashboards stay isolated.
#[derive(Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str, ttl_ms: u64) -> Option<Value> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() > Duration::from_millis(ttl_ms) {
            entries.remove(key);
            return None;
        }
        Some(entry.data.clone())
    }

    pub fn set(&self, key: &str, data: Value) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Clear one entry, or everything when no key is given.
    pub fn clear(&self, key: Option<&str>) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match key {
            Some(key) => {
                entries.remove(key);
            }
            None => entries.clear(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .contains_key(key)
    }
}

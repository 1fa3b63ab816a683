use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Response cache keyed by request signature (`"GET:/articles?scope=public"`).
///
/// Entries live for a fixed TTL. Clones share the same storage so the API
/// service can be cloned into spawned tasks.
pub struct RequestCache<V> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    ttl: Duration,
}

impl<V: Clone> RequestCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn key(method: &str, path: &str) -> String {
        format!("{}:{}", method, path)
    }

    /// Fresh value for `key`, if any. Stale entries are evicted on read.
    pub fn get(&self, key: &str) -> Option<V> {
        {
            let entries = self.entries.read().ok()?;
            match entries.get(key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
            tracing::trace!(key, "cache entry expired");
        }
        None
    }

    pub fn set(&self, key: String, value: V) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key,
                CacheEntry {
                    value,
                    stored_at: Instant::now(),
                },
            );
        } else {
            tracing::warn!("request cache lock poisoned; skipping store");
        }
    }

    /// Drop every entry whose key mentions `path`. Returns how many went.
    pub fn invalidate_matching(&self, path: &str) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|key, _| !key.contains(path));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, path, "cleared cache entries");
        }
        removed
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
            tracing::debug!("request cache cleared");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Clone for RequestCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
        }
    }
}

//! In-memory, activity-scoped cache.
//!
//! Two caches in the credential tester are built on this: the HTTP baseline
//! cache (keyed by base URL) and the RTSP unauthenticated-DESCRIBE cache
//! (keyed by `ip:port:path`). Both are handed down as explicit state to a
//! single activity invocation rather than held as module globals, so
//! parallel activities stay isolated and tests can construct a fresh cache
//! per case.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;

/// A plain keyed cache with no eviction and no TTL — it lives exactly as
/// long as the activity invocation that owns it.
pub struct ScopedCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for ScopedCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        ScopedCache {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> ScopedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    pub fn get_or_insert_with(&self, key: K, f: impl FnOnce() -> V) -> V {
        if let Some(v) = self.get(&key) {
            return v;
        }
        let value = f();
        self.entries.write().insert(key, value.clone());
        value
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.write().insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_first_computed_value() {
        let cache: ScopedCache<String, u32> = ScopedCache::new();
        let mut calls = 0;
        let first = cache.get_or_insert_with("a".to_string(), || {
            calls += 1;
            1
        });
        assert_eq!(first, 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn distinct_keys_are_independent() {
        let cache: ScopedCache<&str, i32> = ScopedCache::new();
        cache.insert("x", 1);
        cache.insert("y", 2);
        assert_eq!(cache.get(&"x"), Some(1));
        assert_eq!(cache.get(&"y"), Some(2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn miss_returns_none() {
        let cache: ScopedCache<&str, i32> = ScopedCache::new();
        assert_eq!(cache.get(&"missing"), None);
        assert!(cache.is_empty());
    }
}

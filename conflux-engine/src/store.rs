//! In-memory cache store with a pluggable eviction seam
//!
//! The store maps cache keys to the last successfully computed result for
//! one engine. It holds entries forever by default; a bounded policy can be
//! layered on through [`EvictionPolicy`] without changing the engine's
//! contract.

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Instant;

/// A cached result and when it landed
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: JsonValue,
    pub cached_at: Instant,
}

impl CacheEntry {
    fn new(value: JsonValue) -> Self {
        Self {
            value,
            cached_at: Instant::now(),
        }
    }
}

/// Decides which keys to drop after an insert
pub trait EvictionPolicy: Send + Sync {
    /// Keys to evict, given the store contents after an insert
    fn select_victims(&self, entries: &HashMap<String, CacheEntry>) -> Vec<String>;
}

/// Default policy: no expiry, no size bound
#[derive(Debug, Default)]
pub struct KeepForever;

impl EvictionPolicy for KeepForever {
    fn select_victims(&self, _entries: &HashMap<String, CacheEntry>) -> Vec<String> {
        Vec::new()
    }
}

/// Bounded policy evicting the oldest entries beyond a capacity
#[derive(Debug)]
pub struct MaxEntries(pub usize);

impl EvictionPolicy for MaxEntries {
    fn select_victims(&self, entries: &HashMap<String, CacheEntry>) -> Vec<String> {
        if entries.len() <= self.0 {
            return Vec::new();
        }
        let mut by_age: Vec<_> = entries.iter().collect();
        by_age.sort_by_key(|(_, entry)| entry.cached_at);
        by_age
            .iter()
            .take(entries.len() - self.0)
            .map(|(key, _)| (*key).clone())
            .collect()
    }
}

/// Cache store scoped to one execution engine
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    policy: Box<dyn EvictionPolicy>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::with_policy(Box::new(KeepForever))
    }

    pub fn with_policy(policy: Box<dyn EvictionPolicy>) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
        }
    }

    /// Look up a cached value
    pub fn get(&self, key: &str) -> Option<JsonValue> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Insert a value, then apply the eviction policy
    pub fn set(&mut self, key: impl Into<String>, value: JsonValue) {
        self.entries.insert(key.into(), CacheEntry::new(value));
        for victim in self.policy.select_victims(&self.entries) {
            self.entries.remove(&victim);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_set_remove() {
        let mut store = CacheStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("k"), None);

        store.set("k", json!("v"));
        assert_eq!(store.get("k"), Some(json!("v")));
        assert_eq!(store.len(), 1);

        assert_eq!(store.remove("k"), Some(json!("v")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let mut store = CacheStore::new();
        store.set("k", json!(1));
        store.set("k", json!(2));
        assert_eq!(store.get("k"), Some(json!(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut store = CacheStore::new();
        store.set("a", json!(1));
        store.set("b", json!(2));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_keep_forever_never_evicts() {
        let mut store = CacheStore::new();
        for i in 0..1000 {
            store.set(format!("k{}", i), json!(i));
        }
        assert_eq!(store.len(), 1000);
    }

    #[test]
    fn test_max_entries_evicts_oldest() {
        let mut store = CacheStore::with_policy(Box::new(MaxEntries(2)));
        store.set("a", json!(1));
        std::thread::sleep(std::time::Duration::from_millis(2));
        store.set("b", json!(2));
        std::thread::sleep(std::time::Duration::from_millis(2));
        store.set("c", json!(3));

        assert_eq!(store.len(), 2);
        assert!(!store.contains_key("a"));
        assert!(store.contains_key("b"));
        assert!(store.contains_key("c"));
    }
}

//! Caching utilities for ryt-js

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;

/// Single-owner memoization cache
///
/// Interpreter instances are not shared across threads, so the cache uses
/// `RefCell` instead of a lock. Entries never expire: a cache lives exactly
/// as long as the interpreter that owns it.
pub struct MemoCache<K, V> {
    entries: RefCell<HashMap<K, V>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Create a cache pre-populated with entries
    pub fn with_entries(entries: HashMap<K, V>) -> Self {
        Self {
            entries: RefCell::new(entries),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.borrow().get(key).cloned()
    }

    /// Return the cached value or compute, store and return it
    ///
    /// The borrow is released while `compute` runs, so the computation may
    /// itself consult or populate the cache.
    pub fn get_or_try_insert_with<E, F>(&self, key: &K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = compute()?;
        self.entries
            .borrow_mut()
            .entry(key.clone())
            .or_insert(value.clone());
        Ok(value)
    }
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_seeded_entries() {
        let cache = MemoCache::with_entries(HashMap::from([("key1", "value1")]));
        assert_eq!(cache.get(&"key1"), Some("value1"));
        assert_eq!(cache.get(&"key2"), None);
    }

    #[test]
    fn test_get_or_try_insert_with_computes_once() {
        let cache: MemoCache<String, u32> = MemoCache::new();
        let calls = Cell::new(0);

        for _ in 0..3 {
            let value: Result<u32, ()> = cache.get_or_try_insert_with(&"f".to_string(), || {
                calls.set(calls.get() + 1);
                Ok(7)
            });
            assert_eq!(value, Ok(7));
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_get_or_try_insert_with_error_is_not_cached() {
        let cache: MemoCache<&str, u32> = MemoCache::new();

        let failed: Result<u32, &str> = cache.get_or_try_insert_with(&"g", || Err("missing"));
        assert_eq!(failed, Err("missing"));
        assert_eq!(cache.get(&"g"), None);

        let ok: Result<u32, &str> = cache.get_or_try_insert_with(&"g", || Ok(1));
        assert_eq!(ok, Ok(1));
    }

    #[test]
    fn test_reentrant_compute() {
        let cache: MemoCache<&str, u32> = MemoCache::new();

        let value: Result<u32, ()> = cache.get_or_try_insert_with(&"outer", || {
            let inner = cache.get_or_try_insert_with(&"inner", || Ok(1))?;
            Ok(inner + 1)
        });
        assert_eq!(value, Ok(2));
        assert_eq!(cache.get(&"inner"), Some(1));
        assert_eq!(cache.get(&"outer"), Some(2));
    }
}

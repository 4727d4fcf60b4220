//! Read-through query caches
//!
//! Small LRU caches in front of the membership queries. Keys embed the query
//! parameters, so a new block naturally produces new keys; only a rollback
//! has to drop them.
//!
//! Every `clear` starts a new generation. A reader captures the generation
//! before it queries and hands it back to `put`; rows read before a rollback
//! are then refused instead of outliving it.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Default entry capacity for each query cache
pub const DEFAULT_CACHE_CAPACITY: usize = 104;

struct Inner<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
    generation: u64,
}

/// Mutex-guarded LRU cache returning cloned values
pub struct QueryCache<K: Hash + Eq, V: Clone> {
    inner: Mutex<Inner<K, V>>,
}

impl<K: Hash + Eq, V: Clone> QueryCache<K, V> {
    /// A zero capacity is bumped to one entry
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        // A panic while holding the lock cannot leave the LRU half-updated
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current generation, to be passed back to `put`
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().entries.get(key).cloned()
    }

    /// Store `value` unless the cache was cleared since `generation`
    ///
    /// Returns whether the entry was kept.
    pub fn put(&self, generation: u64, key: K, value: V) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        inner.entries.put(key, value);
        true
    }

    /// Drop every entry and start a new generation
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.generation = inner.generation.wrapping_add(1);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().entries.cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_put() {
        let cache: QueryCache<(u64, u64), Vec<u32>> = QueryCache::new(2);
        assert_eq!(cache.get(&(1, 2)), None);

        assert!(cache.put(cache.generation(), (1, 2), vec![7]));
        assert_eq!(cache.get(&(1, 2)), Some(vec![7]));
    }

    #[test]
    fn test_eviction_and_clear() {
        let cache: QueryCache<u32, u32> = QueryCache::new(2);
        let generation = cache.generation();
        cache.put(generation, 1, 10);
        cache.put(generation, 2, 20);
        cache.put(generation, 3, 30);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&1), None);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn test_put_from_before_clear_is_dropped() {
        let cache: QueryCache<u32, Vec<u32>> = QueryCache::new(4);
        let before = cache.generation();

        // a reader queried, then a rollback cleared the cache
        cache.clear();
        assert!(!cache.put(before, 1, vec![10]));
        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);

        assert!(cache.put(cache.generation(), 1, vec![11]));
        assert_eq!(cache.get(&1), Some(vec![11]));
    }

    #[test]
    fn test_zero_capacity_is_bumped() {
        let cache: QueryCache<u32, u32> = QueryCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }
}

//! Bounded most-recently-used list.

use std::collections::VecDeque;

/// Default number of cached entries.
pub const DEFAULT_MRU_CAPACITY: usize = 50;

/// A small most-recently-used cache.
///
/// Entries are kept in recency order (front = most recent). Lookups are
/// linear, which is faster than hashing for the handful of entries this is
/// used with.
#[derive(Debug, Clone)]
pub struct MruList<K, V> {
    entries: VecDeque<(K, V)>,
    capacity: usize,
}

impl<K: PartialEq, V: Clone> MruList<K, V> {
    /// Creates an empty list holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up `key`, moving a hit to the front.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        let entry = self.entries.remove(position)?;
        let value = entry.1.clone();
        self.entries.push_front(entry);
        Some(value)
    }

    /// Inserts (or refreshes) `key`, evicting the least recently used entry
    /// when full. Returns the evicted entry, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.capacity == 0 {
            return None;
        }
        if let Some(position) = self.entries.iter().position(|(k, _)| *k == key) {
            self.entries.remove(position);
        }
        self.entries.push_front((key, value));
        if self.entries.len() > self.capacity {
            self.entries.pop_back()
        } else {
            None
        }
    }

    /// Drops every entry whose key matches `predicate`.
    pub fn remove_if<F: Fn(&K) -> bool>(&mut self, predicate: F) {
        self.entries.retain(|(k, _)| !predicate(k));
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_least_recently_used() {
        let mut mru = MruList::new(2);
        mru.insert(1, "a");
        mru.insert(2, "b");
        assert_eq!(mru.get(&1), Some("a"));
        let evicted = mru.insert(3, "c");
        assert_eq!(evicted, Some((2, "b")));
        assert_eq!(mru.get(&2), None);
        assert_eq!(mru.len(), 2);
    }

    #[test]
    fn test_reinsert_refreshes_entry() {
        let mut mru = MruList::new(2);
        mru.insert(1, 10);
        mru.insert(1, 11);
        assert_eq!(mru.len(), 1);
        assert_eq!(mru.get(&1), Some(11));
    }

    #[test]
    fn test_remove_if_and_clear() {
        let mut mru = MruList::new(4);
        for i in 0..4 {
            mru.insert(i, i * 10);
        }
        mru.remove_if(|k| k % 2 == 0);
        assert_eq!(mru.len(), 2);
        mru.clear();
        assert!(mru.is_empty());
    }

    #[test]
    fn test_zero_capacity_caches_nothing() {
        let mut mru = MruList::new(0);
        assert_eq!(mru.insert(1, 1), None);
        assert!(mru.is_empty());
    }
}

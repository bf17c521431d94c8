//! A tiny append-only, insertion-ordered map.
//!
//! The cache needs two nested instances of this (by name, then by version
//! within a name) to satisfy C2's contract that iteration order is
//! deterministic and matches arrival order. Neither level ever removes
//! a key, so a side index plus a flat vector is enough — no need for a full
//! indexmap dependency for this one shape.

use ahash::AHashMap;

#[derive(Debug, Clone)]
pub struct InsertionOrderedMap<K, V> {
    index: AHashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K, V> Default for InsertionOrderedMap<K, V> {
    fn default() -> Self {
        Self {
            index: AHashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K, V> InsertionOrderedMap<K, V>
where
    K: std::hash::Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = *self.index.get(key)?;
        Some(&mut self.entries[idx].1)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Insert `value` under `key` if absent. Returns `true` if the insertion
    /// happened, `false` if `key` was already present (the existing value is
    /// left untouched).
    pub fn insert_if_absent(&mut self, key: K, value: V) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let idx = self.entries.len();
        self.index.insert(key.clone(), idx);
        self.entries.push((key, value));
        true
    }

    /// Overwrite the value at an existing key, or insert it at the end if
    /// absent. Never reorders an existing entry.
    pub fn upsert(&mut self, key: K, value: V) {
        if let Some(&idx) = self.index.get(&key) {
            self.entries[idx].1 = value;
        } else {
            let idx = self.entries.len();
            self.index.insert(key.clone(), idx);
            self.entries.push((key, value));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order_across_updates() {
        let mut map: InsertionOrderedMap<&'static str, u32> = InsertionOrderedMap::new();
        map.insert_if_absent("b", 2);
        map.insert_if_absent("a", 1);
        map.upsert("b", 20);
        let order: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(*map.get(&"b").unwrap(), 20);
    }

    #[test]
    fn insert_if_absent_does_not_overwrite() {
        let mut map: InsertionOrderedMap<&'static str, u32> = InsertionOrderedMap::new();
        assert!(map.insert_if_absent("a", 1));
        assert!(!map.insert_if_absent("a", 2));
        assert_eq!(*map.get(&"a").unwrap(), 1);
    }
}

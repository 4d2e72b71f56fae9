//! Deduplicated key → row store with last-write-wins semantics.

use crate::row::Keyed;
use std::collections::{BTreeMap, HashMap};

/// Rows indexed by primary key.
///
/// Later upserts replace earlier ones. Iteration order is not part of the
/// contract; [`snapshot`](Registry::snapshot) sorts by key so rendered output
/// is stable.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    rows: HashMap<String, T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the row stored under `key`, returning the old row.
    pub fn upsert(&mut self, key: impl Into<String>, row: T) -> Option<T> {
        self.rows.insert(key.into(), row)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All entries, sorted by key.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(&str, &T)> {
        let mut entries: Vec<(&str, &T)> =
            self.rows.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_unstable_by_key(|(k, _)| *k);
        entries
    }

    /// Consume the registry into a key-ordered map.
    #[must_use]
    pub fn into_map(self) -> BTreeMap<String, T> {
        self.rows.into_iter().collect()
    }
}

impl<T: Keyed> Registry<T> {
    /// Upsert `row` under its own primary key.
    pub fn upsert_row(&mut self, row: T) -> Option<T> {
        let key = row.key().to_owned();
        self.upsert(key, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_upsert_wins() {
        let mut reg = Registry::new();
        assert!(reg.upsert("alice", 1).is_none());
        assert_eq!(reg.upsert("alice", 2), Some(1));
        assert_eq!(reg.get("alice"), Some(&2));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn size_equals_distinct_keys() {
        let mut reg = Registry::new();
        let keys = ["a", "b", "a", "c", "b", "a"];
        for (i, k) in keys.iter().enumerate() {
            reg.upsert(*k, i);
        }
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.get("a"), Some(&5));
        assert_eq!(reg.get("b"), Some(&4));
    }

    #[test]
    fn snapshot_is_key_ordered_and_repeatable() {
        let mut reg = Registry::new();
        for k in ["m", "z", "a", "q"] {
            reg.upsert(k, ());
        }
        let keys: Vec<&str> = reg.snapshot().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "m", "q", "z"]);
        assert_eq!(reg.snapshot(), reg.snapshot());
    }
}

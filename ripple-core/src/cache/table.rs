//! Memo Table Implementation
//!
//! The table behind every map cache. It is a hash table with explicit
//! buckets: the policy hash picks a bucket, and the policy predicate
//! scans it in insertion order. Spelling the buckets out keeps collision
//! behavior part of the table's contract instead of an accident of some
//! library's probing scheme.
//!
//! Storing under a key that is policy-equal to an existing entry replaces
//! that entry, key and value both, so a class's surviving exemplar is
//! always the most recently stored one. Nothing is ever evicted.

use std::fmt::Debug;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::policy::{ElementEq, ElementHash};

/// One bucket. With a discriminating hash policy almost every bucket
/// holds a single entry, so entries live inline until a collision.
type Bucket<K, V> = SmallVec<[(K, V); 1]>;

/// An append-mostly memo table keyed by a pluggable equality policy.
pub struct ElementCache<K, V> {
    equality: Box<dyn ElementEq<K>>,
    hasher: Box<dyn ElementHash<K>>,
    buckets: IndexMap<u64, Bucket<K, V>>,
    entries: usize,
}

impl<K, V> ElementCache<K, V> {
    pub fn new<Q, H>(equality: Q, hasher: H) -> Self
    where
        Q: ElementEq<K> + 'static,
        H: ElementHash<K> + 'static,
    {
        Self {
            equality: Box::new(equality),
            hasher: Box::new(hasher),
            buckets: IndexMap::new(),
            entries: 0,
        }
    }

    /// Find the stored value for the first entry policy-equal to `key`,
    /// oldest first.
    pub fn lookup(&self, key: &K) -> Option<&V> {
        let hash = self.hasher.hash_one(key);
        let bucket = self.buckets.get(&hash)?;
        bucket
            .iter()
            .find(|(stored, _)| self.equality.equivalent(stored, key))
            .map(|(_, value)| value)
    }

    /// Store a result, replacing the first entry policy-equal to `key` or
    /// appending a fresh one.
    pub fn store(&mut self, key: K, value: V) {
        let hash = self.hasher.hash_one(&key);
        let equality = &self.equality;
        let bucket = self.buckets.entry(hash).or_default();
        match bucket
            .iter_mut()
            .find(|(stored, _)| equality.equivalent(stored, &key))
        {
            Some(entry) => *entry = (key, value),
            None => {
                bucket.push((key, value));
                self.entries += 1;
            }
        }
    }

    /// Number of live entries across all buckets.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

impl<K, V> Debug for ElementCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementCache")
            .field("entries", &self.entries)
            .field("buckets", &self.buckets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::policy::{EqBy, HashBy, Natural};
    use super::*;

    #[test]
    fn lookup_on_an_empty_table_misses() {
        let table: ElementCache<i32, String> = ElementCache::new(Natural, Natural);
        assert!(table.lookup(&1).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn store_then_lookup_hits() {
        let mut table = ElementCache::new(Natural, Natural);
        table.store(7, "seven");
        assert_eq!(table.lookup(&7), Some(&"seven"));
        assert!(table.lookup(&8).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn distinct_keys_get_distinct_entries() {
        let mut table = ElementCache::new(Natural, Natural);
        table.store(1, 10);
        table.store(2, 20);
        table.store(3, 30);
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup(&2), Some(&20));
    }

    #[test]
    fn storing_an_equal_key_replaces_the_entry() {
        let mut table = ElementCache::new(Natural, Natural);
        table.store(1, "first");
        table.store(1, "second");
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(&1), Some(&"second"));
    }

    #[test]
    fn coarse_policy_replaces_within_the_class() {
        let mut table = ElementCache::new(
            EqBy::new(|a: &i32, b: &i32| a.rem_euclid(2) == b.rem_euclid(2)),
            HashBy::new(|k: &i32| k.rem_euclid(2) as u64),
        );
        table.store(1, "one");
        table.store(3, "three");
        assert_eq!(table.len(), 1);
        // Any odd key now resolves to the class's latest exemplar.
        assert_eq!(table.lookup(&5), Some(&"three"));

        table.store(2, "two");
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(&8), Some(&"two"));
    }

    #[test]
    fn hash_collisions_scan_by_equality() {
        // Degenerate hash: everything shares one bucket, so correctness
        // rests entirely on the equality scan.
        let mut table = ElementCache::new(Natural, HashBy::new(|_: &i32| 0));
        table.store(1, "one");
        table.store(2, "two");
        table.store(3, "three");
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup(&1), Some(&"one"));
        assert_eq!(table.lookup(&2), Some(&"two"));
        assert_eq!(table.lookup(&3), Some(&"three"));
        assert!(table.lookup(&4).is_none());
    }

    #[test]
    fn replacement_in_a_shared_bucket_keeps_other_entries() {
        let mut table = ElementCache::new(Natural, HashBy::new(|_: &i32| 0));
        table.store(1, "one");
        table.store(2, "two");
        table.store(1, "uno");
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(&1), Some(&"uno"));
        assert_eq!(table.lookup(&2), Some(&"two"));
    }
}

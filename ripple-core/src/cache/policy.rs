//! Element Equality Policies
//!
//! A map cache decides whether two elements share a result using a policy
//! pair: an equality predicate and a hash function. The pair is pluggable
//! so callers can memoize under a coarser notion of sameness than the
//! element type's own `Eq` (say, case-insensitive keys, or one field of a
//! larger record).
//!
//! # The Consistency Contract
//!
//! The two halves must agree: elements the predicate calls equivalent must
//! hash to the same value, or equivalent elements can land in different
//! buckets and a lookup that should hit will miss. The table has no way to
//! check this, so the contract is on the caller. A predicate coarser than
//! what the mapped function actually distinguishes is allowed and yields
//! deliberate reuse of one representative's result.

use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

/// Decides whether two elements share a cache entry.
pub trait ElementEq<K>: Send + Sync {
    fn equivalent(&self, a: &K, b: &K) -> bool;
}

/// Assigns an element to a bucket. Must agree with the paired
/// [`ElementEq`]: equivalent elements hash alike.
pub trait ElementHash<K>: Send + Sync {
    fn hash_one(&self, key: &K) -> u64;
}

/// The element type's own `Eq` and `Hash`.
///
/// Hashing uses `DefaultHasher::new()`, whose initial state is fixed, so
/// a given element keeps the same bucket across passes and across runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Natural;

impl<K> ElementEq<K> for Natural
where
    K: Eq,
{
    fn equivalent(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

impl<K> ElementHash<K> for Natural
where
    K: Hash,
{
    fn hash_one(&self, key: &K) -> u64 {
        let mut hasher = DefaultHasher::new();
        Hash::hash(key, &mut hasher);
        hasher.finish()
    }
}

/// An equality policy built from a closure.
///
/// # Example
///
/// ```rust,ignore
/// let same_parity = EqBy::new(|a: &i32, b: &i32| a % 2 == b % 2);
/// ```
pub struct EqBy<F> {
    predicate: F,
}

impl<F> EqBy<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<K, F> ElementEq<K> for EqBy<F>
where
    F: Fn(&K, &K) -> bool + Send + Sync,
{
    fn equivalent(&self, a: &K, b: &K) -> bool {
        (self.predicate)(a, b)
    }
}

impl<F> Debug for EqBy<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EqBy").finish_non_exhaustive()
    }
}

/// A hash policy built from a closure.
pub struct HashBy<F> {
    function: F,
}

impl<F> HashBy<F> {
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<K, F> ElementHash<K> for HashBy<F>
where
    F: Fn(&K) -> u64 + Send + Sync,
{
    fn hash_one(&self, key: &K) -> u64 {
        (self.function)(key)
    }
}

impl<F> Debug for HashBy<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashBy").finish_non_exhaustive()
    }
}

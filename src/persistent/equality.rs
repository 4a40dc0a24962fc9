//! Order-independent map equality and hashing.
//!
//! Maps compare and hash purely as sets of (key, value) pairs: two maps are
//! equal when they have the same size and every entry of one is found, with
//! an equal value, in the other. The concrete map type and the order the
//! entries were inserted in never matter.
//!
//! Two equality notions exist and are kept apart:
//!
//! - [`map_equals`] accepts any two [`MapLike`] values.
//! - [`map_equiv`] additionally refuses a right-hand side that is a
//!   persistent map but does not declare [`MapLike::MAP_EQUIVALENCE`];
//!   equivalence is only defined between map families that opted in.
//!
//! The matching hashes are [`map_hash`] and [`map_hasheq`]. Both are the
//! wrapping sum over entries of `hash(key) ^ hash(value)`, which does not
//! depend on iteration order.
//!
//! # Examples
//!
//! ```rust
//! use std::collections::HashMap;
//! use submap::persistent::{map_equals, map_hash, PersistentTreeMap};
//!
//! let tree: PersistentTreeMap<i32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
//! let hashed: HashMap<i32, &str> = [(1, "a"), (2, "b")].into_iter().collect();
//!
//! assert!(map_equals(&tree, &hashed));
//! assert_eq!(map_hash(&tree), map_hash(&hashed));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::atomic::{AtomicI32, Ordering};

// =============================================================================
// Map Capability
// =============================================================================

/// The map capability: size, probing by key, and walking entries.
///
/// Implemented by every map in this crate and by the standard library's
/// `HashMap` and `BTreeMap`, so any two of them can be compared.
pub trait MapLike<K, V> {
    /// `true` for persistent (immutable, structurally shared) map types.
    const PERSISTENT: bool = false;

    /// `true` for map types that take part in [`map_equiv`].
    const MAP_EQUIVALENCE: bool = false;

    /// Returns the number of entries.
    fn size(&self) -> usize;

    /// Returns the value stored for `key`.
    fn lookup(&self, key: &K) -> Option<&V>;

    /// Calls `visit` for each entry until it returns `false`.
    ///
    /// Returns `true` if every entry was visited.
    fn for_each_entry_while<F>(&self, visit: F) -> bool
    where
        F: FnMut(&K, &V) -> bool;
}

impl<K, V, S> MapLike<K, V> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn size(&self) -> usize {
        self.len()
    }

    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn for_each_entry_while<F>(&self, mut visit: F) -> bool
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.iter().all(|(key, value)| visit(key, value))
    }
}

impl<K: Ord, V> MapLike<K, V> for BTreeMap<K, V> {
    fn size(&self) -> usize {
        self.len()
    }

    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn for_each_entry_while<F>(&self, mut visit: F) -> bool
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.iter().all(|(key, value)| visit(key, value))
    }
}

// =============================================================================
// Equality
// =============================================================================

fn entries_match<K, V, L, R>(left: &L, right: &R) -> bool
where
    L: MapLike<K, V> + ?Sized,
    R: MapLike<K, V> + ?Sized,
    V: PartialEq,
{
    if std::ptr::addr_eq(std::ptr::from_ref(left), std::ptr::from_ref(right)) {
        return true;
    }
    if left.size() != right.size() {
        return false;
    }
    left.for_each_entry_while(|key, value| {
        right
            .lookup(key)
            .is_some_and(|other_value| other_value == value)
    })
}

/// Structural map equality.
///
/// Iterates `left` and looks each key up in `right`: O(n) lookups, each one
/// a search of `right`.
pub fn map_equals<K, V, L, R>(left: &L, right: &R) -> bool
where
    L: MapLike<K, V> + ?Sized,
    R: MapLike<K, V> + ?Sized,
    V: PartialEq,
{
    entries_match(left, right)
}

/// Map equivalence, restricted to map families that declare
/// [`MapLike::MAP_EQUIVALENCE`].
///
/// A right-hand side that is [`MapLike::PERSISTENT`] without declaring
/// equivalence is never equivalent, even when [`map_equals`] would accept
/// it. Generic maps that are not persistent are compared structurally.
pub fn map_equiv<K, V, L, R>(left: &L, right: &R) -> bool
where
    L: MapLike<K, V> + ?Sized,
    R: MapLike<K, V> + ?Sized,
    V: PartialEq,
{
    if R::PERSISTENT && !R::MAP_EQUIVALENCE {
        return false;
    }
    entries_match(left, right)
}

// =============================================================================
// Hashing
// =============================================================================

#[cfg(feature = "fxhash")]
type ElementHasher = rustc_hash::FxHasher;

#[cfg(not(feature = "fxhash"))]
type ElementHasher = std::collections::hash_map::DefaultHasher;

const HASHEQ_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

#[allow(clippy::cast_possible_truncation)]
const fn fold_to_i32(bits: u64) -> i32 {
    (bits ^ (bits >> 32)) as i32
}

/// Hashes one key or value for [`map_hash`].
///
/// Deterministic within a build: the hasher uses fixed keys.
pub fn element_hash<T: Hash + ?Sized>(value: &T) -> i32 {
    let mut hasher = ElementHasher::default();
    value.hash(&mut hasher);
    fold_to_i32(hasher.finish())
}

/// Hashes one key or value for [`map_hasheq`].
pub fn element_hasheq<T: Hash + ?Sized>(value: &T) -> i32 {
    let [k0, k1, k2, k3] = HASHEQ_SEEDS;
    let state = ahash::RandomState::with_seeds(k0, k1, k2, k3);
    fold_to_i32(state.hash_one(value))
}

fn sum_entries<K, V, M, H>(map: &M, hash: H) -> i32
where
    M: MapLike<K, V> + ?Sized,
    H: Fn(&K, &V) -> i32,
{
    let mut total: i32 = 0;
    map.for_each_entry_while(|key, value| {
        total = total.wrapping_add(hash(key, value));
        true
    });
    total
}

/// The map hash: wrapping sum over entries of
/// `element_hash(key) ^ element_hash(value)`.
///
/// Consistent with [`map_equals`]: equal maps hash equally whatever their
/// concrete type. Persistent maps cache this value, see
/// [`PersistentTreeMap::hash_code`](super::PersistentTreeMap::hash_code).
pub fn map_hash<K, V, M>(map: &M) -> i32
where
    K: Hash,
    V: Hash,
    M: MapLike<K, V> + ?Sized,
{
    sum_entries(map, |key, value| element_hash(key) ^ element_hash(value))
}

/// The equivalence hash: like [`map_hash`], over [`element_hasheq`].
pub fn map_hasheq<K, V, M>(map: &M) -> i32
where
    K: Hash,
    V: Hash,
    M: MapLike<K, V> + ?Sized,
{
    sum_entries(map, |key, value| {
        element_hasheq(key) ^ element_hasheq(value)
    })
}

// =============================================================================
// Hash Cache
// =============================================================================

const UNSET: i32 = -1;

/// A compute-once cell for an immutable map's hash.
///
/// The cell moves from unset (`-1`) to the map's hash at most once per
/// value. Threads racing on the first read may both compute; they store the
/// same value, so the lost update is harmless and no lock is taken. A hash
/// that happens to equal `-1` is recomputed on every call.
pub struct HashCache(AtomicI32);

impl HashCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicI32::new(UNSET))
    }

    /// Returns the cached hash, computing and storing it first if needed.
    pub fn get_or_compute<F>(&self, compute: F) -> i32
    where
        F: FnOnce() -> i32,
    {
        let cached = self.0.load(Ordering::Relaxed);
        if cached != UNSET {
            return cached;
        }
        let hash = compute();
        self.0.store(hash, Ordering::Relaxed);
        tracing::trace!(hash, "map hash cached");
        hash
    }

    /// Returns the cached hash without computing it.
    #[must_use]
    pub fn peek(&self) -> Option<i32> {
        match self.0.load(Ordering::Relaxed) {
            UNSET => None,
            hash => Some(hash),
        }
    }
}

impl Default for HashCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for HashCache {
    fn clone(&self) -> Self {
        Self(AtomicI32::new(self.0.load(Ordering::Relaxed)))
    }
}

impl fmt::Debug for HashCache {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("HashCache").field(&self.peek()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;

    /// A persistent map family that never declared map equivalence.
    struct OptedOut(BTreeMap<i32, i32>);

    impl MapLike<i32, i32> for OptedOut {
        const PERSISTENT: bool = true;

        fn size(&self) -> usize {
            self.0.len()
        }

        fn lookup(&self, key: &i32) -> Option<&i32> {
            self.0.get(key)
        }

        fn for_each_entry_while<F>(&self, visit: F) -> bool
        where
            F: FnMut(&i32, &i32) -> bool,
        {
            self.0.for_each_entry_while(visit)
        }
    }

    fn hashed(entries: &[(i32, i32)]) -> HashMap<i32, i32> {
        entries.iter().copied().collect()
    }

    fn ordered(entries: &[(i32, i32)]) -> BTreeMap<i32, i32> {
        entries.iter().copied().collect()
    }

    #[rstest]
    fn test_equals_ignores_concrete_type_and_order() {
        let left = hashed(&[(3, 30), (1, 10), (2, 20)]);
        let right = ordered(&[(1, 10), (2, 20), (3, 30)]);
        assert!(map_equals(&left, &right));
        assert!(map_equals(&right, &left));
    }

    #[rstest]
    #[case(&[(1, 10)], &[(1, 11)])]
    #[case(&[(1, 10)], &[(2, 10)])]
    #[case(&[(1, 10)], &[(1, 10), (2, 20)])]
    fn test_equals_rejects_differences(#[case] left: &[(i32, i32)], #[case] right: &[(i32, i32)]) {
        assert!(!map_equals(&hashed(left), &ordered(right)));
    }

    #[rstest]
    fn test_equals_same_reference_short_circuits() {
        let map = ordered(&[(1, 1)]);
        assert!(map_equals(&map, &map));
    }

    #[rstest]
    fn test_equiv_refuses_persistent_maps_without_equivalence() {
        let generic = ordered(&[(1, 10), (2, 20)]);
        let opted_out = OptedOut(generic.clone());

        assert!(map_equals(&generic, &opted_out));
        assert!(!map_equiv(&generic, &opted_out));
        assert!(map_equiv(&opted_out, &generic));
    }

    #[rstest]
    fn test_hash_is_order_independent_across_types() {
        let left = hashed(&[(5, 50), (4, 40), (3, 30)]);
        let right = ordered(&[(3, 30), (4, 40), (5, 50)]);
        assert_eq!(map_hash(&left), map_hash(&right));
        assert_eq!(map_hasheq(&left), map_hasheq(&right));
    }

    #[rstest]
    fn test_empty_map_hashes_to_zero() {
        let empty: BTreeMap<i32, i32> = BTreeMap::new();
        assert_eq!(map_hash(&empty), 0);
        assert_eq!(map_hasheq(&empty), 0);
    }

    #[rstest]
    fn test_map_hash_is_sum_of_entry_hashes() {
        let map = ordered(&[(1, 2), (3, 4)]);
        let expected = (element_hash(&1) ^ element_hash(&2))
            .wrapping_add(element_hash(&3) ^ element_hash(&4));
        assert_eq!(map_hash(&map), expected);
    }

    #[rstest]
    fn test_element_hashes_are_deterministic() {
        assert_eq!(element_hash("key"), element_hash("key"));
        assert_eq!(element_hasheq("key"), element_hasheq("key"));
    }

    #[rstest]
    fn test_hash_cache_computes_once() {
        let cache = HashCache::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            42
        };

        assert_eq!(cache.peek(), None);
        assert_eq!(cache.get_or_compute(compute), 42);
        assert_eq!(cache.get_or_compute(compute), 42);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.peek(), Some(42));
    }

    #[rstest]
    fn test_hash_cache_recomputes_sentinel_value() {
        let cache = HashCache::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            -1
        };

        assert_eq!(cache.get_or_compute(compute), -1);
        assert_eq!(cache.get_or_compute(compute), -1);
        assert_eq!(calls.get(), 2);
    }

    #[rstest]
    fn test_hash_cache_clone_keeps_value() {
        let cache = HashCache::new();
        cache.get_or_compute(|| 7);
        assert_eq!(cache.clone().peek(), Some(7));
    }
}

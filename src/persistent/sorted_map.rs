//! Either shape of sorted persistent map.
//!
//! Operations on a [`RangeView`] can hand back a view (the update stayed in
//! the window) or a standalone [`PersistentTreeMap`] (it did not, or the
//! requested window was empty). [`SortedMap`] is that result; it forwards
//! the shared read, traversal and update surface to whichever shape it
//! holds.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::comparator::{Comparator, NaturalOrder};
use super::cons::ConsItem;
use super::equality::{MapLike, map_equals, map_equiv};
use super::range_view::RangeView;
use super::traversal::{Iter, TraversalSeq};
use super::treemap::{Node, PersistentTreeMap, write_entries};
use crate::error::Result;

/// A sorted persistent map: a full tree map or a window over one.
///
/// # Examples
///
/// ```rust
/// use submap::persistent::{PersistentTreeMap, SortedMap};
///
/// let map: PersistentTreeMap<i32, i32> = (0..10).map(|key| (key, key)).collect();
///
/// let window = map.sub_map(2, 5);
/// assert!(matches!(window, SortedMap::Range(_)));
/// assert_eq!(window.first_key(), Some(&2));
///
/// let empty = map.sub_map(5, 2);
/// assert!(matches!(empty, SortedMap::Tree(_)));
/// assert!(empty.is_empty());
/// ```
pub enum SortedMap<K, V, C = NaturalOrder> {
    /// A standalone tree map.
    Tree(PersistentTreeMap<K, V, C>),
    /// A window over a tree map.
    Range(RangeView<K, V, C>),
}

impl<K, V, C> SortedMap<K, V, C> {
    /// Returns the tree map, if this is one.
    pub const fn as_tree(&self) -> Option<&PersistentTreeMap<K, V, C>> {
        match self {
            Self::Tree(tree) => Some(tree),
            Self::Range(_) => None,
        }
    }

    /// Returns the range view, if this is one.
    pub const fn as_range(&self) -> Option<&RangeView<K, V, C>> {
        match self {
            Self::Tree(_) => None,
            Self::Range(view) => Some(view),
        }
    }

    /// Returns the comparator ordering the keys.
    pub const fn comparator(&self) -> &C {
        match self {
            Self::Tree(tree) => tree.comparator(),
            Self::Range(view) => view.comparator(),
        }
    }
}

impl<K, V, C> SortedMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
{
    /// Returns the number of entries.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Tree(tree) => tree.len(),
            Self::Range(view) => view.count(),
        }
    }

    /// Alias of [`count`](Self::count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.count()
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Tree(tree) => tree.is_empty(),
            Self::Range(view) => view.is_empty(),
        }
    }

    /// Returns the node stored under `key`.
    #[must_use]
    pub fn entry_at<Q>(&self, key: &Q) -> Option<&Node<K, V>>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        match self {
            Self::Tree(tree) => tree.entry_at(key),
            Self::Range(view) => view.entry_at(key),
        }
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.entry_at(key).map(Node::value)
    }

    /// Returns the value for `key`, or `not_found`.
    #[must_use]
    pub fn val_at<'a, Q>(&'a self, key: &Q, not_found: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get(key).unwrap_or(not_found)
    }

    /// Returns `true` if the map holds `key`.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.entry_at(key).is_some()
    }

    /// Binds `key` to `value`.
    #[must_use]
    pub fn assoc(&self, key: K, value: V) -> Self {
        match self {
            Self::Tree(tree) => Self::Tree(tree.assoc(key, value)),
            Self::Range(view) => view.assoc(key, value),
        }
    }

    /// Binds `key` only when it is not bound yet.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::KeyAlreadyPresent`](crate::MapError::KeyAlreadyPresent)
    /// when `key` is already bound.
    pub fn assoc_ex(&self, key: K, value: V) -> Result<Self> {
        match self {
            Self::Tree(tree) => tree.assoc_ex(key, value).map(Self::Tree),
            Self::Range(view) => view.assoc_ex(key, value),
        }
    }

    /// Removes `key`.
    #[must_use]
    pub fn without<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        match self {
            Self::Tree(tree) => Self::Tree(tree.without(key)),
            Self::Range(view) => view.without(key),
        }
    }

    /// Adds an entry, a two-slot vector, or a batch of entries.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidArgument`](crate::MapError::InvalidArgument)
    /// for a vector that is not exactly a key followed by a value.
    pub fn cons(&self, item: impl Into<ConsItem<K, V>>) -> Result<Self> {
        match self {
            Self::Tree(tree) => tree.cons(item).map(Self::Tree),
            Self::Range(view) => view.cons(item),
        }
    }

    /// Returns an empty tree map with the same comparator.
    #[must_use]
    pub fn empty(&self) -> PersistentTreeMap<K, V, C> {
        match self {
            Self::Tree(tree) => tree.empty(),
            Self::Range(view) => view.empty(),
        }
    }

    /// Returns the smallest key.
    #[must_use]
    pub fn first_key(&self) -> Option<&K> {
        match self {
            Self::Tree(tree) => tree.first_key(),
            Self::Range(view) => view.first_key(),
        }
    }

    /// Returns the greatest key.
    #[must_use]
    pub fn last_key(&self) -> Option<&K> {
        match self {
            Self::Tree(tree) => tree.last_key(),
            Self::Range(view) => view.last_key(),
        }
    }

    /// Returns the entries in ascending or descending order.
    #[must_use]
    pub fn seq(&self, ascending: bool) -> Option<TraversalSeq<K, V, C>> {
        match self {
            Self::Tree(tree) => tree.seq(ascending),
            Self::Range(view) => view.seq(ascending),
        }
    }

    /// Returns the entries in descending order.
    #[must_use]
    pub fn rseq(&self) -> Option<TraversalSeq<K, V, C>> {
        self.seq(false)
    }

    /// Returns the entries starting from `key`.
    #[must_use]
    pub fn seq_from(&self, key: &K, ascending: bool) -> Option<TraversalSeq<K, V, C>> {
        match self {
            Self::Tree(tree) => tree.seq_from(key, ascending),
            Self::Range(view) => view.seq_from(key, ascending),
        }
    }

    /// Returns a borrowing iterator in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        match self {
            Self::Tree(tree) => tree.iter(),
            Self::Range(view) => view.iter(),
        }
    }

    /// Returns an iterator over keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over values in key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Returns a window of the keys strictly below `to_key`.
    #[must_use]
    pub fn head_map(&self, to_key: K) -> RangeView<K, V, C> {
        match self {
            Self::Tree(tree) => tree.head_map(to_key),
            Self::Range(view) => view.head_map(to_key),
        }
    }

    /// Returns a window of the keys at or above `from_key`.
    #[must_use]
    pub fn tail_map(&self, from_key: K) -> RangeView<K, V, C> {
        match self {
            Self::Tree(tree) => tree.tail_map(from_key),
            Self::Range(view) => view.tail_map(from_key),
        }
    }

    /// Returns the entries with keys in `[from_key, to_key)`.
    #[must_use]
    pub fn sub_map(&self, from_key: K, to_key: K) -> Self {
        match self {
            Self::Tree(tree) => tree.sub_map(from_key, to_key),
            Self::Range(view) => view.sub_map(from_key, to_key),
        }
    }

    /// Structural equality against any map.
    pub fn equals<R>(&self, other: &R) -> bool
    where
        R: MapLike<K, V> + ?Sized,
        V: PartialEq,
    {
        map_equals(self, other)
    }

    /// Map equivalence against any map.
    pub fn equiv<R>(&self, other: &R) -> bool
    where
        R: MapLike<K, V> + ?Sized,
        V: PartialEq,
    {
        map_equiv(self, other)
    }

    /// Returns the cached map hash of whichever shape this is.
    pub fn hash_code(&self) -> i32
    where
        K: Hash,
        V: Hash,
    {
        match self {
            Self::Tree(tree) => tree.hash_code(),
            Self::Range(view) => view.hash_code(),
        }
    }

    /// Returns the equivalence hash.
    pub fn hasheq(&self) -> i32
    where
        K: Hash,
        V: Hash,
    {
        match self {
            Self::Tree(tree) => tree.hasheq(),
            Self::Range(view) => view.hasheq(),
        }
    }
}

impl<K: Clone, V, C: Clone> Clone for SortedMap<K, V, C> {
    fn clone(&self) -> Self {
        match self {
            Self::Tree(tree) => Self::Tree(tree.clone()),
            Self::Range(view) => Self::Range(view.clone()),
        }
    }
}

impl<K, V, C> From<PersistentTreeMap<K, V, C>> for SortedMap<K, V, C> {
    fn from(tree: PersistentTreeMap<K, V, C>) -> Self {
        Self::Tree(tree)
    }
}

impl<K, V, C> From<RangeView<K, V, C>> for SortedMap<K, V, C> {
    fn from(view: RangeView<K, V, C>) -> Self {
        Self::Range(view)
    }
}

impl<K, V, C> MapLike<K, V> for SortedMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
{
    const PERSISTENT: bool = true;
    const MAP_EQUIVALENCE: bool = true;

    fn size(&self) -> usize {
        self.count()
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

impl<'a, K, V, C> IntoIterator for &'a SortedMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, C, R> PartialEq<R> for SortedMap<K, V, C>
where
    K: Clone,
    V: Clone + PartialEq,
    C: Comparator<K> + Clone,
    R: MapLike<K, V>,
{
    fn eq(&self, other: &R) -> bool {
        map_equals(self, other)
    }
}

impl<K, V, C> Eq for SortedMap<K, V, C>
where
    K: Clone,
    V: Clone + Eq,
    C: Comparator<K> + Clone,
{
}

impl<K, V, C> Hash for SortedMap<K, V, C>
where
    K: Clone + Hash,
    V: Clone + Hash,
    C: Comparator<K> + Clone,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash_code());
    }
}

impl<K, V, C> fmt::Debug for SortedMap<K, V, C>
where
    K: Clone + fmt::Debug,
    V: Clone + fmt::Debug,
    C: Comparator<K> + Clone,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> fmt::Display for SortedMap<K, V, C>
where
    K: Clone + fmt::Display,
    V: Clone + fmt::Display,
    C: Comparator<K> + Clone,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_entries(formatter, self.iter())
    }
}

#[cfg(feature = "serde")]
impl<K, V, C> serde::Serialize for SortedMap<K, V, C>
where
    K: serde::Serialize + Clone,
    V: serde::Serialize + Clone,
    C: Comparator<K> + Clone,
{
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

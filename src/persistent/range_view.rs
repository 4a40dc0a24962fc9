//! Bounded windows over a persistent tree map.
//!
//! A [`RangeView`] is a `[start, end)` window over a [`PersistentTreeMap`].
//! It holds the backing map and the two bounds, nothing else: lookups are
//! answered by the backing map and filtered by the window, and traversals
//! seek straight to the window's edge instead of scanning.
//!
//! Updates inside the window stay views over the updated backing map. An
//! update outside the window cannot be represented by a view, so the view's
//! entries are copied into a fresh [`PersistentTreeMap`] and the update is
//! applied there.
//!
//! # Examples
//!
//! ```rust
//! use submap::persistent::{PersistentTreeMap, SortedMap};
//!
//! let map: PersistentTreeMap<i32, char> = (1..20).map(|key| (key, 'x')).collect();
//! let SortedMap::Range(window) = map.sub_map(5, 10) else {
//!     unreachable!()
//! };
//!
//! assert!(window.contains_key(&5));
//! assert!(!window.contains_key(&10));
//! assert_eq!(window.count(), 5);
//!
//! // Inside the window: still a view over the (updated) backing map.
//! assert!(matches!(window.assoc(7, 'y'), SortedMap::Range(_)));
//!
//! // Outside the window: promoted to a full map of the window's entries.
//! let promoted = window.assoc(15, 'z');
//! assert!(matches!(promoted, SortedMap::Tree(_)));
//! assert_eq!(promoted.count(), 6);
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::ReferenceCounter;
use super::comparator::{Comparator, NaturalOrder};
use super::cons::ConsItem;
use super::equality::{HashCache, MapLike, map_equals, map_equiv, map_hash, map_hasheq};
use super::sorted_map::SortedMap;
use super::traversal::{Bounds, Iter, TraversalSeq, Window};
use super::treemap::{Node, PersistentTreeMap, write_entries};
use crate::error::{MapError, Result};

/// A `[start, end)` window over a [`PersistentTreeMap`].
///
/// `start` is inclusive and `end` exclusive; a missing bound leaves that side
/// open. The view never copies the backing map.
///
/// # Time Complexity
///
/// | Operation                 | Complexity         |
/// |---------------------------|--------------------|
/// | `get` / `contains_key`    | O(log N)           |
/// | `assoc` / `without` (in)  | O(log N)           |
/// | `assoc` / `without` (out) | O(M log M), M = `count` |
/// | `seq_from`                | O(log N)           |
/// | `first_key` / `last_key`  | O(log N)           |
/// | `count`                   | O(log N + M)       |
pub struct RangeView<K, V, C = NaturalOrder> {
    backing: PersistentTreeMap<K, V, C>,
    start: Option<K>,
    end: Option<K>,
    hash: HashCache,
}

impl<K, V, C> RangeView<K, V, C> {
    /// Wraps bounds that are already known to be ordered.
    pub(crate) const fn from_parts(
        backing: PersistentTreeMap<K, V, C>,
        start: Option<K>,
        end: Option<K>,
    ) -> Self {
        Self {
            backing,
            start,
            end,
            hash: HashCache::new(),
        }
    }

    /// Returns the map this view is a window over.
    #[inline]
    pub const fn backing(&self) -> &PersistentTreeMap<K, V, C> {
        &self.backing
    }

    /// Returns the inclusive lower bound, `None` when open.
    #[inline]
    pub const fn start(&self) -> Option<&K> {
        self.start.as_ref()
    }

    /// Returns the exclusive upper bound, `None` when open.
    #[inline]
    pub const fn end(&self) -> Option<&K> {
        self.end.as_ref()
    }

    /// Returns the backing map's comparator.
    #[inline]
    pub const fn comparator(&self) -> &C {
        self.backing.comparator()
    }
}

impl<K, V, C> RangeView<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
{
    /// Creates a view over `backing`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidArgument`] if `end` sorts before `start`.
    ///
    /// ```rust
    /// use submap::persistent::{PersistentTreeMap, RangeView};
    ///
    /// let map: PersistentTreeMap<i32, i32> = (0..10).map(|key| (key, key)).collect();
    /// let view = RangeView::new(map.clone(), Some(2), Some(4)).unwrap();
    /// assert_eq!(view.keys().copied().collect::<Vec<_>>(), vec![2, 3]);
    ///
    /// assert!(RangeView::new(map, Some(4), Some(2)).is_err());
    /// ```
    pub fn new(backing: PersistentTreeMap<K, V, C>, start: Option<K>, end: Option<K>) -> Result<Self> {
        Self::check_order(backing.comparator(), start.as_ref(), end.as_ref())?;
        Ok(Self::from_parts(backing, start, end))
    }

    /// Creates a view over any sorted map.
    ///
    /// A view over a view is flattened: the result is a single window, the
    /// intersection of both, over the innermost tree map.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidArgument`] if `end` sorts before `start`.
    pub fn over(map: SortedMap<K, V, C>, start: Option<K>, end: Option<K>) -> Result<Self> {
        match map {
            SortedMap::Tree(tree) => Self::new(tree, start, end),
            SortedMap::Range(view) => {
                Self::check_order(view.comparator(), start.as_ref(), end.as_ref())?;
                Ok(view.narrow(start, end))
            }
        }
    }

    fn check_order(comparator: &C, start: Option<&K>, end: Option<&K>) -> Result<()> {
        match (start, end) {
            (Some(start), Some(end)) if comparator.compare(end, start) == Ordering::Less => Err(
                MapError::invalid_argument("range end sorts before range start"),
            ),
            _ => Ok(()),
        }
    }

    /// Returns `true` if `key` lies in `[start, end)`.
    pub fn within_range<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let comparator = self.comparator();
        let after_start = self.start.as_ref().is_none_or(|start| {
            Comparator::<Q>::compare(comparator, key, start.borrow()) != Ordering::Less
        });
        let before_end = self.end.as_ref().is_none_or(|end| {
            Comparator::<Q>::compare(comparator, key, end.borrow()) == Ordering::Less
        });
        after_start && before_end
    }

    /// Intersects the window with `[from, to)`. A bound that would not
    /// shrink the window is ignored; an empty intersection collapses `end`
    /// onto `start`.
    fn narrow(&self, from: Option<K>, to: Option<K>) -> Self {
        let comparator = self.comparator();
        let start = match (from, &self.start) {
            (Some(from), Some(start)) if comparator.compare(&from, start) != Ordering::Greater => {
                None
            }
            (from, _) => from,
        };
        let end = match (to, &self.end) {
            (Some(to), Some(end)) if comparator.compare(&to, end) != Ordering::Less => None,
            (to, _) => to,
        };
        if start.is_none() && end.is_none() {
            return self.clone();
        }

        let start = start.or_else(|| self.start.clone());
        let mut end = end.or_else(|| self.end.clone());
        let inverted = matches!(
            (&start, &end),
            (Some(start), Some(end)) if comparator.compare(end, start) == Ordering::Less
        );
        if inverted {
            end.clone_from(&start);
        }
        Self::from_parts(self.backing.clone(), start, end)
    }

    fn is_empty_window(&self) -> bool {
        matches!(
            (&self.start, &self.end),
            (Some(start), Some(end)) if self.comparator().compare(end, start) != Ordering::Greater
        )
    }

    fn window(&self) -> ReferenceCounter<Window<K, C>> {
        ReferenceCounter::new(Window::new(
            self.comparator().clone(),
            self.start.clone(),
            self.end.clone(),
        ))
    }

    fn bounds(&self) -> Bounds<'_, K, C> {
        Bounds::new(self.comparator(), self.start.as_ref(), self.end.as_ref())
    }

    fn rewrap(&self, backing: PersistentTreeMap<K, V, C>) -> SortedMap<K, V, C> {
        SortedMap::Range(Self::from_parts(
            backing,
            self.start.clone(),
            self.end.clone(),
        ))
    }

    /// Copies the view's entries into a standalone map.
    fn promote(&self) -> PersistentTreeMap<K, V, C> {
        tracing::debug!("update outside the range view window, rebuilding a full map");
        PersistentTreeMap::create(self.comparator().clone(), self.seq(true))
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Returns the node stored under `key` if the key is inside the window.
    #[must_use]
    pub fn entry_at<Q>(&self, key: &Q) -> Option<&Node<K, V>>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        if self.within_range(key) {
            self.backing.entry_at(key)
        } else {
            None
        }
    }

    /// Returns the value for `key` if the key is inside the window.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.entry_at(key).map(Node::value)
    }

    /// Returns the value for `key`, or `not_found` when the key is absent or
    /// outside the window.
    #[must_use]
    pub fn val_at<'a, Q>(&'a self, key: &Q, not_found: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get(key).unwrap_or(not_found)
    }

    /// Returns `true` if `key` is present and inside the window.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.entry_at(key).is_some()
    }

    /// Returns the smallest key inside the window.
    #[must_use]
    pub fn first_key(&self) -> Option<&K> {
        self.iter().next().map(|(key, _)| key)
    }

    /// Returns the greatest key inside the window.
    #[must_use]
    pub fn last_key(&self) -> Option<&K> {
        Iter::new(self.backing.root_link(), false, self.bounds())
            .next()
            .map(|(key, _)| key)
    }

    /// Counts the entries inside the window.
    ///
    /// The count is not cached; every call walks the window.
    #[must_use]
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Alias of [`count`](Self::count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.count()
    }

    /// Returns `true` if no key of the backing map lies inside the window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Binds `key` to `value`.
    ///
    /// Keys inside the window update the backing map and keep the window.
    /// Keys outside it promote the view to a full map first.
    #[must_use]
    pub fn assoc(&self, key: K, value: V) -> SortedMap<K, V, C> {
        if self.within_range(&key) {
            self.rewrap(self.backing.assoc(key, value))
        } else {
            SortedMap::Tree(self.promote().assoc(key, value))
        }
    }

    /// Binds `key` only when it is not bound yet, with the same window rules
    /// as [`assoc`](Self::assoc).
    ///
    /// # Errors
    ///
    /// Returns [`MapError::KeyAlreadyPresent`] when `key` is already bound in
    /// the window, or in the promoted map for a key outside it.
    pub fn assoc_ex(&self, key: K, value: V) -> Result<SortedMap<K, V, C>> {
        if self.within_range(&key) {
            Ok(self.rewrap(self.backing.assoc_ex(key, value)?))
        } else {
            self.promote().assoc_ex(key, value).map(SortedMap::Tree)
        }
    }

    /// Removes `key`, with the same window rules as [`assoc`](Self::assoc).
    #[must_use]
    pub fn without<Q>(&self, key: &Q) -> SortedMap<K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        if self.within_range(key) {
            self.rewrap(self.backing.without(key))
        } else {
            SortedMap::Tree(self.promote().without(key))
        }
    }

    /// Adds an entry, a two-slot vector, or a batch of entries, one
    /// [`assoc`](Self::assoc) at a time.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidArgument`] for a vector that is not
    /// exactly a key followed by a value.
    pub fn cons(&self, item: impl Into<ConsItem<K, V>>) -> Result<SortedMap<K, V, C>> {
        item.into()
            .fold_into(SortedMap::Range(self.clone()), |map, key, value| {
                map.assoc(key, value)
            })
    }

    /// Returns an empty map with the backing comparator.
    #[must_use]
    pub fn empty(&self) -> PersistentTreeMap<K, V, C> {
        self.backing.empty()
    }

    // =========================================================================
    // Sub-ranges
    // =========================================================================

    /// Narrows the window to keys strictly below `to_key`.
    #[must_use]
    pub fn head_map(&self, to_key: K) -> Self {
        self.narrow(None, Some(to_key))
    }

    /// Narrows the window to keys at or above `from_key`.
    #[must_use]
    pub fn tail_map(&self, from_key: K) -> Self {
        self.narrow(Some(from_key), None)
    }

    /// Narrows the window to `[from_key, to_key)`.
    ///
    /// An empty intersection yields an empty tree map with the same
    /// comparator.
    #[must_use]
    pub fn sub_map(&self, from_key: K, to_key: K) -> SortedMap<K, V, C> {
        let narrowed = self.narrow(Some(from_key), Some(to_key));
        if narrowed.is_empty_window() {
            tracing::debug!("empty sub_map window, returning an empty map");
            SortedMap::Tree(self.empty())
        } else {
            SortedMap::Range(narrowed)
        }
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Returns the window's entries in ascending (`true`) or descending
    /// order, or `None` if the window is empty.
    ///
    /// ```rust
    /// use submap::persistent::{PersistentTreeMap, Seq};
    ///
    /// let map: PersistentTreeMap<i32, ()> =
    ///     [1, 3, 5, 7, 9, 11].into_iter().map(|key| (key, ())).collect();
    /// let window = map.tail_map(5).head_map(10);
    ///
    /// let keys: Vec<i32> = window.seq(false).unwrap().entries().map(|(key, _)| key).collect();
    /// assert_eq!(keys, vec![9, 7, 5]);
    /// ```
    #[must_use]
    pub fn seq(&self, ascending: bool) -> Option<TraversalSeq<K, V, C>> {
        TraversalSeq::bounded(self.backing.root_link(), ascending, self.window())
    }

    /// Returns the window's entries in descending order.
    #[must_use]
    pub fn rseq(&self) -> Option<TraversalSeq<K, V, C>> {
        self.seq(false)
    }

    /// Returns the window's entries from the least key `>= key` (ascending)
    /// or the greatest key `<= key` (descending).
    ///
    /// A start key outside the window is clamped to the window's edge when
    /// that edge lies ahead of the walk, and gives `None` when it lies
    /// behind.
    #[must_use]
    pub fn seq_from(&self, key: &K, ascending: bool) -> Option<TraversalSeq<K, V, C>> {
        TraversalSeq::seek(
            self.backing.root_link(),
            self.comparator(),
            key,
            ascending,
            Some(self.window()),
        )
    }

    /// Returns a borrowing iterator over the window in ascending order.
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        Iter::new(self.backing.root_link(), true, self.bounds())
    }

    /// Returns an iterator over the window's keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the window's values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    // =========================================================================
    // Equality and Hashing
    // =========================================================================

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

    /// Returns the hash of the window's entries, cached after the first
    /// call.
    pub fn hash_code(&self) -> i32
    where
        K: Hash,
        V: Hash,
    {
        self.hash.get_or_compute(|| map_hash(self))
    }

    /// Returns the equivalence hash of the window's entries.
    pub fn hasheq(&self) -> i32
    where
        K: Hash,
        V: Hash,
    {
        map_hasheq(self)
    }
}

impl<K: Clone, V, C: Clone> Clone for RangeView<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
            hash: self.hash.clone(),
        }
    }
}

impl<K, V, C> MapLike<K, V> for RangeView<K, V, C>
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

impl<'a, K, V, C> IntoIterator for &'a RangeView<K, V, C>
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

impl<K, V, C, R> PartialEq<R> for RangeView<K, V, C>
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

impl<K, V, C> Eq for RangeView<K, V, C>
where
    K: Clone,
    V: Clone + Eq,
    C: Comparator<K> + Clone,
{
}

impl<K, V, C> Hash for RangeView<K, V, C>
where
    K: Clone + Hash,
    V: Clone + Hash,
    C: Comparator<K> + Clone,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash_code());
    }
}

impl<K, V, C> fmt::Debug for RangeView<K, V, C>
where
    K: Clone + fmt::Debug,
    V: Clone + fmt::Debug,
    C: Comparator<K> + Clone,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> fmt::Display for RangeView<K, V, C>
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
impl<K, V, C> serde::Serialize for RangeView<K, V, C>
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

// =============================================================================
// Tests
// =============================================================================

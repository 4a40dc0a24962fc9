//! Persistent (immutable) tree map based on Red-Black Tree.
//!
//! This module provides [`PersistentTreeMap`], an immutable sorted map that
//! uses structural sharing for efficient operations, and [`Node`], the
//! shared tree node its traversals hand out.
//!
//! # Overview
//!
//! - O(log N) `get`, `entry_at`, `assoc`, `without`
//! - O(log N) `first_key` / `last_key`
//! - O(log N) seek for [`seq_from`](PersistentTreeMap::seq_from), then O(1)
//!   amortized per step
//! - O(1) `len` and `is_empty`
//!
//! Keys are ordered by a [`Comparator`], [`NaturalOrder`] unless another one
//! is given with [`PersistentTreeMap::with_comparator`].
//!
//! # Examples
//!
//! ```rust
//! use submap::persistent::PersistentTreeMap;
//!
//! let map = PersistentTreeMap::new()
//!     .assoc(3, "three")
//!     .assoc(1, "one")
//!     .assoc(2, "two");
//!
//! let keys: Vec<&i32> = map.keys().collect();
//! assert_eq!(keys, vec![&1, &2, &3]);
//!
//! let updated = map.assoc(1, "ONE");
//! assert_eq!(map.get(&1), Some(&"one"));      // Original unchanged
//! assert_eq!(updated.get(&1), Some(&"ONE"));  // New version
//! ```
//!
//! # Internal Structure
//!
//! The Red-Black Tree maintains the following invariants on insert:
//! 1. Every node is either red or black
//! 2. The root is black
//! 3. Red nodes have only black children
//! 4. Every path from root to leaf has the same number of black nodes
//!
//! Deletion keeps search order and structural sharing but does not restore
//! the colour invariants.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::ReferenceCounter;
use super::comparator::{Comparator, NaturalOrder};
use super::cons::ConsItem;
use super::entry::MapEntry;
use super::equality::{HashCache, MapLike, map_equals, map_equiv, map_hash, map_hasheq};
use super::range_view::RangeView;
use super::seq::Seq;
use super::sorted_map::SortedMap;
use super::traversal::{Bounds, Iter, TraversalSeq};
use crate::error::{MapError, Result};

// =============================================================================
// Color Definition
// =============================================================================

/// The color of a Red-Black Tree node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Color {
    Red,
    Black,
}

// =============================================================================
// Node Definition
// =============================================================================

/// A shared handle to a tree node.
pub type NodeRef<K, V> = ReferenceCounter<Node<K, V>>;

/// An immutable Red-Black Tree node.
///
/// Nodes are never modified after construction. Any number of map versions
/// may share a node; it lives as long as the longest-lived of them. A node
/// is also the map entry handed out by [`TraversalSeq`].
pub struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    left: Option<NodeRef<K, V>>,
    right: Option<NodeRef<K, V>>,
}

impl<K, V> Node<K, V> {
    /// Creates a new red node with no children.
    const fn new_red(key: K, value: V) -> Self {
        Self {
            key,
            value,
            color: Color::Red,
            left: None,
            right: None,
        }
    }

    /// Returns the node's key.
    #[inline]
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Returns the node's value.
    #[inline]
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// Returns the left child, holding smaller keys.
    #[inline]
    pub fn left(&self) -> Option<&Self> {
        self.left.as_deref()
    }

    /// Returns the right child, holding greater keys.
    #[inline]
    pub fn right(&self) -> Option<&Self> {
        self.right.as_deref()
    }

    #[inline]
    pub(crate) const fn left_link(&self) -> Option<&NodeRef<K, V>> {
        self.left.as_ref()
    }

    #[inline]
    pub(crate) const fn right_link(&self) -> Option<&NodeRef<K, V>> {
        self.right.as_ref()
    }

    /// Checks if this node is red.
    fn is_red(&self) -> bool {
        self.color == Color::Red
    }
}

impl<K: Clone, V: Clone> Node<K, V> {
    /// Creates a copy of this node with a new color.
    fn with_color(&self, color: Color) -> Self {
        Self {
            color,
            ..self.clone()
        }
    }

    /// Creates a copy of this node with new children.
    fn with_children(&self, left: Option<NodeRef<K, V>>, right: Option<NodeRef<K, V>>) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
            color: self.color,
            left,
            right,
        }
    }
}

impl<K: Clone, V: Clone> Clone for Node<K, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
            color: self.color,
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }
}

impl<K, V> MapEntry for Node<K, V> {
    type Key = K;
    type Value = V;

    #[inline]
    fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    fn value(&self) -> &V {
        &self.value
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Node<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("Node")
            .field(&self.key)
            .field(&self.value)
            .finish()
    }
}

/// Helper function to check if an optional node is red.
fn is_red<K, V>(node: Option<&NodeRef<K, V>>) -> bool {
    node.is_some_and(|node| node.is_red())
}

// =============================================================================
// PersistentTreeMap Definition
// =============================================================================

/// A persistent (immutable) sorted map based on Red-Black Tree.
///
/// Every update returns a new map that shares all untouched subtrees with
/// the original. The map's hash is computed on first request and cached.
///
/// # Time Complexity
///
/// | Operation              | Complexity        |
/// |------------------------|-------------------|
/// | `new`                  | O(1)              |
/// | `get` / `entry_at`     | O(log N)          |
/// | `assoc`                | O(log N)          |
/// | `without`              | O(log N)          |
/// | `first_key`/`last_key` | O(log N)          |
/// | `seq_from`             | O(log N)          |
/// | `hash_code`            | O(N) once, O(1)   |
/// | `len`                  | O(1)              |
///
/// # Examples
///
/// ```rust
/// use submap::persistent::PersistentTreeMap;
///
/// let map = PersistentTreeMap::singleton(42, "answer");
/// assert_eq!(map.get(&42), Some(&"answer"));
/// assert_eq!(map.val_at(&7, &"missing"), &"missing");
/// ```
pub struct PersistentTreeMap<K, V, C = NaturalOrder> {
    root: Option<NodeRef<K, V>>,
    length: usize,
    comparator: C,
    hash: HashCache,
}

impl<K, V> PersistentTreeMap<K, V> {
    /// Creates a new empty map in natural key order.
    ///
    /// ```rust
    /// use submap::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, String> = PersistentTreeMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K: Clone + Ord, V: Clone> PersistentTreeMap<K, V> {
    /// Creates a map containing a single key-value pair.
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        Self::new().assoc(key, value)
    }
}

impl<K, V, C> PersistentTreeMap<K, V, C> {
    /// Creates a new empty map ordered by `comparator`.
    #[inline]
    #[must_use]
    pub const fn with_comparator(comparator: C) -> Self {
        Self {
            root: None,
            length: 0,
            comparator,
            hash: HashCache::new(),
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns the number of entries in the map. Alias of [`len`](Self::len).
    #[inline]
    #[must_use]
    pub const fn count(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the root node of the tree.
    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<&Node<K, V>> {
        self.root.as_deref()
    }

    #[inline]
    pub(crate) const fn root_link(&self) -> Option<&NodeRef<K, V>> {
        self.root.as_ref()
    }

    /// Returns the comparator ordering this map's keys.
    #[inline]
    pub const fn comparator(&self) -> &C {
        &self.comparator
    }
}

impl<K, V, C> PersistentTreeMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
{
    /// Builds a map from an entry sequence, assoc-ing each entry in order.
    ///
    /// ```rust
    /// use submap::persistent::{NaturalOrder, PersistentTreeMap};
    ///
    /// let source: PersistentTreeMap<i32, char> = [(1, 'a'), (2, 'b')].into_iter().collect();
    /// let copy = PersistentTreeMap::create(NaturalOrder, source.seq(false));
    /// assert_eq!(copy, source);
    /// ```
    pub fn create<S>(comparator: C, seq: Option<S>) -> Self
    where
        S: Seq,
        S::Item: MapEntry<Key = K, Value = V>,
    {
        let mut map = Self::with_comparator(comparator);
        let mut current = seq;
        while let Some(position) = current {
            let entry = position.first();
            map = map.assoc(entry.key().clone(), entry.value().clone());
            current = position.next();
        }
        map
    }

    /// Returns an empty map with the same comparator.
    #[must_use]
    pub fn empty(&self) -> Self {
        Self::with_comparator(self.comparator.clone())
    }

    /// Returns the node stored under `key`.
    ///
    /// The key may be any borrowed form of the map's key type, as long as the
    /// comparator orders it the same way.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn entry_at<Q>(&self, key: &Q) -> Option<&Node<K, V>>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match Comparator::<Q>::compare(&self.comparator, key, node.key.borrow()) {
                Ordering::Less => current = node.left(),
                Ordering::Greater => current = node.right(),
                Ordering::Equal => return Some(node),
            }
        }
        None
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// ```rust
    /// use submap::persistent::PersistentTreeMap;
    ///
    /// let map = PersistentTreeMap::new().assoc("hello".to_string(), 42);
    ///
    /// // Can use &str to look up String keys
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.entry_at(key).map(Node::value)
    }

    /// Returns the value for `key`, or `not_found` when the key is absent.
    #[must_use]
    pub fn val_at<'a, Q>(&'a self, key: &Q, not_found: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get(key).unwrap_or(not_found)
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.entry_at(key).is_some()
    }

    /// Returns a new map with `key` bound to `value`.
    ///
    /// Only the nodes on the path from the root to `key` are copied; every
    /// other subtree is shared with `self`.
    ///
    /// ```rust
    /// use submap::persistent::PersistentTreeMap;
    ///
    /// let map1 = PersistentTreeMap::new().assoc(1, "one");
    /// let map2 = map1.assoc(1, "ONE");
    ///
    /// assert_eq!(map1.get(&1), Some(&"one")); // Original unchanged
    /// assert_eq!(map2.get(&1), Some(&"ONE")); // New version
    /// ```
    #[must_use]
    pub fn assoc(&self, key: K, value: V) -> Self {
        let (new_root, added) = self.insert_into_node(self.root.as_ref(), key, value);

        let black_root = new_root.map(|node_ref| {
            if node_ref.is_red() {
                ReferenceCounter::new(node_ref.with_color(Color::Black))
            } else {
                node_ref
            }
        });

        Self {
            root: black_root,
            length: if added { self.length + 1 } else { self.length },
            comparator: self.comparator.clone(),
            hash: HashCache::new(),
        }
    }

    /// Binds `key` to `value` only when `key` is not bound yet.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::KeyAlreadyPresent`] when `key` is already bound.
    ///
    /// ```rust
    /// use submap::MapError;
    /// use submap::persistent::PersistentTreeMap;
    ///
    /// let map = PersistentTreeMap::new().assoc_ex(1, "one").unwrap();
    /// assert_eq!(map.assoc_ex(1, "uno"), Err(MapError::KeyAlreadyPresent));
    /// ```
    pub fn assoc_ex(&self, key: K, value: V) -> Result<Self> {
        if self.contains_key(&key) {
            return Err(MapError::KeyAlreadyPresent);
        }
        Ok(self.assoc(key, value))
    }

    /// Recursive helper for assoc.
    /// Returns (`new_node`, `was_added`) where `was_added` is true if a new entry was added.
    fn insert_into_node(
        &self,
        node: Option<&NodeRef<K, V>>,
        key: K,
        value: V,
    ) -> (Option<NodeRef<K, V>>, bool) {
        let Some(node_ref) = node else {
            return (Some(ReferenceCounter::new(Node::new_red(key, value))), true);
        };

        match self.comparator.compare(&key, &node_ref.key) {
            Ordering::Less => {
                let (new_left, added) = self.insert_into_node(node_ref.left.as_ref(), key, value);
                let new_node = node_ref.with_children(new_left, node_ref.right.clone());
                (Some(ReferenceCounter::new(Self::balance(new_node))), added)
            }
            Ordering::Greater => {
                let (new_right, added) =
                    self.insert_into_node(node_ref.right.as_ref(), key, value);
                let new_node = node_ref.with_children(node_ref.left.clone(), new_right);
                (Some(ReferenceCounter::new(Self::balance(new_node))), added)
            }
            Ordering::Equal => {
                let new_node = Node {
                    key,
                    value,
                    color: node_ref.color,
                    left: node_ref.left.clone(),
                    right: node_ref.right.clone(),
                };
                (Some(ReferenceCounter::new(new_node)), false)
            }
        }
    }

    /// Balances the tree after insertion.
    /// Handles the four cases of red-red violation.
    fn balance(node: Node<K, V>) -> Node<K, V> {
        // Left-Left
        if is_red(node.left.as_ref())
            && let Some(left) = &node.left
            && is_red(left.left.as_ref())
        {
            return Self::rotate_right_and_recolor(&node);
        }

        // Left-Right
        if is_red(node.left.as_ref())
            && let Some(left) = &node.left
            && is_red(left.right.as_ref())
        {
            let new_left = Self::rotate_left((**left).clone());
            let new_node =
                node.with_children(Some(ReferenceCounter::new(new_left)), node.right.clone());
            return Self::rotate_right_and_recolor(&new_node);
        }

        // Right-Right
        if is_red(node.right.as_ref())
            && let Some(right) = &node.right
            && is_red(right.right.as_ref())
        {
            return Self::rotate_left_and_recolor(&node);
        }

        // Right-Left
        if is_red(node.right.as_ref())
            && let Some(right) = &node.right
            && is_red(right.left.as_ref())
        {
            let new_right = Self::rotate_right((**right).clone());
            let new_node =
                node.with_children(node.left.clone(), Some(ReferenceCounter::new(new_right)));
            return Self::rotate_left_and_recolor(&new_node);
        }

        node
    }

    fn rotate_right(node: Node<K, V>) -> Node<K, V> {
        let Some(left) = node.left else {
            return node;
        };
        let lowered = Node {
            key: node.key,
            value: node.value,
            color: node.color,
            left: left.right.clone(),
            right: node.right,
        };
        Node {
            key: left.key.clone(),
            value: left.value.clone(),
            color: left.color,
            left: left.left.clone(),
            right: Some(ReferenceCounter::new(lowered)),
        }
    }

    fn rotate_left(node: Node<K, V>) -> Node<K, V> {
        let Some(right) = node.right else {
            return node;
        };
        let lowered = Node {
            key: node.key,
            value: node.value,
            color: node.color,
            left: node.left,
            right: right.left.clone(),
        };
        Node {
            key: right.key.clone(),
            value: right.value.clone(),
            color: right.color,
            left: Some(ReferenceCounter::new(lowered)),
            right: right.right.clone(),
        }
    }

    /// Resolves a red-red violation below a black node: the middle key
    /// rises as a red node over two black children.
    fn rotate_right_and_recolor(node: &Node<K, V>) -> Node<K, V> {
        let Some(left) = &node.left else {
            return node.clone();
        };
        let new_right = Node {
            key: node.key.clone(),
            value: node.value.clone(),
            color: Color::Black,
            left: left.right.clone(),
            right: node.right.clone(),
        };
        let new_left = left
            .left
            .as_ref()
            .map(|left_left| ReferenceCounter::new(left_left.with_color(Color::Black)));

        Node {
            key: left.key.clone(),
            value: left.value.clone(),
            color: Color::Red,
            left: new_left,
            right: Some(ReferenceCounter::new(new_right)),
        }
    }

    fn rotate_left_and_recolor(node: &Node<K, V>) -> Node<K, V> {
        let Some(right) = &node.right else {
            return node.clone();
        };
        let new_left = Node {
            key: node.key.clone(),
            value: node.value.clone(),
            color: Color::Black,
            left: node.left.clone(),
            right: right.left.clone(),
        };
        let new_right = right
            .right
            .as_ref()
            .map(|right_right| ReferenceCounter::new(right_right.with_color(Color::Black)));

        Node {
            key: right.key.clone(),
            value: right.value.clone(),
            color: Color::Red,
            left: Some(ReferenceCounter::new(new_left)),
            right: new_right,
        }
    }

    /// Returns a new map without `key`.
    ///
    /// Returns a clone of `self` (sharing the whole tree) when the key is
    /// absent.
    ///
    /// ```rust
    /// use submap::persistent::PersistentTreeMap;
    ///
    /// let map = PersistentTreeMap::new().assoc(1, "one").assoc(2, "two");
    /// let removed = map.without(&1);
    ///
    /// assert_eq!(map.len(), 2);     // Original unchanged
    /// assert_eq!(removed.len(), 1); // New version
    /// assert_eq!(removed.get(&1), None);
    /// ```
    #[must_use]
    pub fn without<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        if !self.contains_key(key) {
            return self.clone();
        }

        let new_root = self.remove_from_node(self.root.as_ref(), key);
        let black_root = new_root.map(|node| {
            if node.is_red() {
                ReferenceCounter::new(node.with_color(Color::Black))
            } else {
                node
            }
        });

        Self {
            root: black_root,
            length: self.length.saturating_sub(1),
            comparator: self.comparator.clone(),
            hash: HashCache::new(),
        }
    }

    /// Recursive helper for without.
    fn remove_from_node<Q>(&self, node: Option<&NodeRef<K, V>>, key: &Q) -> Option<NodeRef<K, V>>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let node_ref = node?;
        match Comparator::<Q>::compare(&self.comparator, key, node_ref.key.borrow()) {
            Ordering::Less => {
                let new_left = self.remove_from_node(node_ref.left.as_ref(), key);
                Some(ReferenceCounter::new(
                    node_ref.with_children(new_left, node_ref.right.clone()),
                ))
            }
            Ordering::Greater => {
                let new_right = self.remove_from_node(node_ref.right.as_ref(), key);
                Some(ReferenceCounter::new(
                    node_ref.with_children(node_ref.left.clone(), new_right),
                ))
            }
            Ordering::Equal => match (&node_ref.left, &node_ref.right) {
                (None, None) => None,
                (Some(left), None) => Some(left.clone()),
                (None, Some(right)) => Some(right.clone()),
                (Some(_), Some(right)) => {
                    let successor = Self::leftmost(right);
                    let new_right = self.remove_min(node_ref.right.as_ref());
                    Some(ReferenceCounter::new(Node {
                        key: successor.key.clone(),
                        value: successor.value.clone(),
                        color: node_ref.color,
                        left: node_ref.left.clone(),
                        right: new_right,
                    }))
                }
            },
        }
    }

    /// Removes the leftmost node of a subtree.
    fn remove_min(&self, node: Option<&NodeRef<K, V>>) -> Option<NodeRef<K, V>> {
        let node_ref = node?;
        match &node_ref.left {
            None => node_ref.right.clone(),
            Some(_) => {
                let new_left = self.remove_min(node_ref.left.as_ref());
                Some(ReferenceCounter::new(
                    node_ref.with_children(new_left, node_ref.right.clone()),
                ))
            }
        }
    }

    fn leftmost(node: &NodeRef<K, V>) -> &Node<K, V> {
        let mut current: &Node<K, V> = node;
        while let Some(left) = current.left() {
            current = left;
        }
        current
    }

    fn rightmost(node: &NodeRef<K, V>) -> &Node<K, V> {
        let mut current: &Node<K, V> = node;
        while let Some(right) = current.right() {
            current = right;
        }
        current
    }

    /// Returns the smallest key.
    ///
    /// ```rust
    /// use submap::persistent::PersistentTreeMap;
    ///
    /// let map = PersistentTreeMap::new().assoc(3, "three").assoc(1, "one");
    /// assert_eq!(map.first_key(), Some(&1));
    /// assert_eq!(map.last_key(), Some(&3));
    /// ```
    #[must_use]
    pub fn first_key(&self) -> Option<&K> {
        self.root.as_ref().map(|root| &Self::leftmost(root).key)
    }

    /// Returns the greatest key.
    #[must_use]
    pub fn last_key(&self) -> Option<&K> {
        self.root.as_ref().map(|root| &Self::rightmost(root).key)
    }

    /// Returns the entries in ascending (`true`) or descending key order as a
    /// lazy sequence, or `None` for an empty map.
    #[must_use]
    pub fn seq(&self, ascending: bool) -> Option<TraversalSeq<K, V, C>> {
        TraversalSeq::from_root(self.root.as_ref(), ascending)
    }

    /// Returns the entries in descending key order.
    #[must_use]
    pub fn rseq(&self) -> Option<TraversalSeq<K, V, C>> {
        self.seq(false)
    }

    /// Returns the entries starting at the least key `>= key` (ascending) or
    /// the greatest key `<= key` (descending).
    ///
    /// ```rust
    /// use submap::persistent::{PersistentTreeMap, Seq};
    ///
    /// let map: PersistentTreeMap<i32, ()> = [1, 3, 5].into_iter().map(|k| (k, ())).collect();
    /// assert_eq!(map.seq_from(&2, true).map(|seq| *seq.first().key()), Some(3));
    /// assert_eq!(map.seq_from(&2, false).map(|seq| *seq.first().key()), Some(1));
    /// assert!(map.seq_from(&6, true).is_none());
    /// ```
    #[must_use]
    pub fn seq_from(&self, key: &K, ascending: bool) -> Option<TraversalSeq<K, V, C>> {
        TraversalSeq::seek(self.root.as_ref(), &self.comparator, key, ascending, None)
    }

    /// Returns an iterator over entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        Iter::new(
            self.root.as_ref(),
            true,
            Bounds::unbounded(&self.comparator),
        )
    }

    /// Returns an iterator over keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over values in key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Returns a view of the entries with keys strictly below `to_key`.
    ///
    /// The view shares this map; nothing is copied.
    #[must_use]
    pub fn head_map(&self, to_key: K) -> RangeView<K, V, C> {
        RangeView::from_parts(self.clone(), None, Some(to_key))
    }

    /// Returns a view of the entries with keys at or above `from_key`.
    #[must_use]
    pub fn tail_map(&self, from_key: K) -> RangeView<K, V, C> {
        RangeView::from_parts(self.clone(), Some(from_key), None)
    }

    /// Returns the entries with keys in `[from_key, to_key)`.
    ///
    /// An empty or inverted window yields an empty map rather than a view.
    ///
    /// ```rust
    /// use submap::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, i32> = (0..10).map(|k| (k, k)).collect();
    /// assert_eq!(map.sub_map(3, 6).len(), 3);
    /// assert!(map.sub_map(6, 3).is_empty());
    /// ```
    #[must_use]
    pub fn sub_map(&self, from_key: K, to_key: K) -> SortedMap<K, V, C> {
        if self.comparator.compare(&to_key, &from_key) != Ordering::Greater {
            tracing::debug!("empty sub_map window, returning an empty map");
            return SortedMap::Tree(self.empty());
        }
        SortedMap::Range(RangeView::from_parts(
            self.clone(),
            Some(from_key),
            Some(to_key),
        ))
    }

    /// Adds an entry, a two-slot vector, or a batch of entries.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidArgument`](crate::MapError::InvalidArgument)
    /// for a vector that is not exactly a key followed by a value.
    ///
    /// ```rust
    /// use submap::persistent::{ConsItem, PairSlot, PersistentTreeMap};
    ///
    /// let map = PersistentTreeMap::new().cons((1, "one")).unwrap();
    /// let map = map
    ///     .cons(ConsItem::Vector(vec![PairSlot::Key(2), PairSlot::Value("two")]))
    ///     .unwrap();
    /// assert_eq!(map.len(), 2);
    ///
    /// assert!(map.cons(ConsItem::Vector(vec![PairSlot::Key(3)])).is_err());
    /// ```
    pub fn cons(&self, item: impl Into<ConsItem<K, V>>) -> Result<Self> {
        item.into()
            .fold_into(self.clone(), |map, key, value| map.assoc(key, value))
    }

    /// Structural equality against any map. See [`map_equals`].
    pub fn equals<R>(&self, other: &R) -> bool
    where
        R: MapLike<K, V> + ?Sized,
        V: PartialEq,
    {
        map_equals(self, other)
    }

    /// Map equivalence. See [`map_equiv`].
    pub fn equiv<R>(&self, other: &R) -> bool
    where
        R: MapLike<K, V> + ?Sized,
        V: PartialEq,
    {
        map_equiv(self, other)
    }

    /// Returns the map hash, computing it on first call only.
    ///
    /// ```rust
    /// use submap::persistent::PersistentTreeMap;
    ///
    /// let left = PersistentTreeMap::new().assoc(1, "a").assoc(2, "b");
    /// let right = PersistentTreeMap::new().assoc(2, "b").assoc(1, "a");
    /// assert_eq!(left.hash_code(), right.hash_code());
    /// ```
    pub fn hash_code(&self) -> i32
    where
        K: Hash,
        V: Hash,
    {
        self.hash.get_or_compute(|| map_hash(self))
    }

    /// Returns the equivalence hash. See [`map_hasheq`].
    pub fn hasheq(&self) -> i32
    where
        K: Hash,
        V: Hash,
    {
        map_hasheq(self)
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, C: Clone> Clone for PersistentTreeMap<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            length: self.length,
            comparator: self.comparator.clone(),
            hash: self.hash.clone(),
        }
    }
}

impl<K, V, C: Default> Default for PersistentTreeMap<K, V, C> {
    #[inline]
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K, V, C> MapLike<K, V> for PersistentTreeMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
{
    const PERSISTENT: bool = true;
    const MAP_EQUIVALENCE: bool = true;

    fn size(&self) -> usize {
        self.length
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

impl<K, V, C> FromIterator<(K, V)> for PersistentTreeMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::default(), |map, (key, value)| map.assoc(key, value))
    }
}

impl<'a, K, V, C> IntoIterator for &'a PersistentTreeMap<K, V, C>
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

impl<K, V, C, R> PartialEq<R> for PersistentTreeMap<K, V, C>
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

impl<K, V, C> Eq for PersistentTreeMap<K, V, C>
where
    K: Clone,
    V: Clone + Eq,
    C: Comparator<K> + Clone,
{
}

/// Feeds the cached [`hash_code`](PersistentTreeMap::hash_code) to the
/// hasher, so the hash agrees with equality across all map types of this
/// crate.
///
/// ```rust
/// use submap::persistent::PersistentTreeMap;
/// use std::collections::HashMap;
///
/// let mut outer: HashMap<PersistentTreeMap<i32, String>, &str> = HashMap::new();
/// let key = PersistentTreeMap::new()
///     .assoc(1, "one".to_string())
///     .assoc(2, "two".to_string());
/// outer.insert(key.clone(), "value");
/// assert_eq!(outer.get(&key), Some(&"value"));
/// ```
impl<K, V, C> Hash for PersistentTreeMap<K, V, C>
where
    K: Clone + Hash,
    V: Clone + Hash,
    C: Comparator<K> + Clone,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash_code());
    }
}

impl<K, V, C> fmt::Debug for PersistentTreeMap<K, V, C>
where
    K: Clone + fmt::Debug,
    V: Clone + fmt::Debug,
    C: Comparator<K> + Clone,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> fmt::Display for PersistentTreeMap<K, V, C>
where
    K: Clone + fmt::Display,
    V: Clone + fmt::Display,
    C: Comparator<K> + Clone,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_entries(formatter, self.iter())
    }
}

/// Writes `{k: v, ...}`.
pub(crate) fn write_entries<'a, K, V, I>(formatter: &mut fmt::Formatter<'_>, entries: I) -> fmt::Result
where
    K: fmt::Display + 'a,
    V: fmt::Display + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    write!(formatter, "{{")?;
    let mut first = true;
    for (key, value) in entries {
        if first {
            first = false;
        } else {
            write!(formatter, ", ")?;
        }
        write!(formatter, "{key}: {value}")?;
    }
    write!(formatter, "}}")
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V, C> serde::Serialize for PersistentTreeMap<K, V, C>
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

#[cfg(feature = "serde")]
struct PersistentTreeMapVisitor<K, V, C> {
    marker: std::marker::PhantomData<fn() -> PersistentTreeMap<K, V, C>>,
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::de::Visitor<'de> for PersistentTreeMapVisitor<K, V, C>
where
    K: serde::Deserialize<'de> + Clone,
    V: serde::Deserialize<'de> + Clone,
    C: Comparator<K> + Clone + Default,
{
    type Value = PersistentTreeMap<K, V, C>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = PersistentTreeMap::default();
        while let Some((key, value)) = access.next_entry()? {
            map = map.assoc(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::Deserialize<'de> for PersistentTreeMap<K, V, C>
where
    K: serde::Deserialize<'de> + Clone,
    V: serde::Deserialize<'de> + Clone,
    C: Comparator<K> + Clone + Default,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(PersistentTreeMapVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent::{PairSlot, Reversed};
    use rstest::rstest;

    fn collect_nodes<'a, K, V>(node: Option<&'a NodeRef<K, V>>, into: &mut Vec<&'a NodeRef<K, V>>) {
        if let Some(node_ref) = node {
            into.push(node_ref);
            collect_nodes(node_ref.left_link(), into);
            collect_nodes(node_ref.right_link(), into);
        }
    }

    /// Asserts in-order keys are strictly increasing under the comparator.
    fn assert_search_order<K: Clone + Ord + fmt::Debug, V: Clone>(map: &PersistentTreeMap<K, V>) {
        let keys: Vec<&K> = map.keys().collect();
        assert!(keys.windows(2).all(|pair| pair[0] < pair[1]), "{keys:?}");
        assert_eq!(keys.len(), map.len());
    }

    // =========================================================================
    // Display Tests
    // =========================================================================

    #[rstest]
    fn test_display_empty_treemap() {
        let map: PersistentTreeMap<i32, String> = PersistentTreeMap::new();
        assert_eq!(format!("{map}"), "{}");
    }

    #[rstest]
    fn test_display_multiple_elements_treemap_sorted() {
        let map = PersistentTreeMap::new()
            .assoc(3, "three".to_string())
            .assoc(1, "one".to_string())
            .assoc(2, "two".to_string());
        assert_eq!(format!("{map}"), "{1: one, 2: two, 3: three}");
        assert_eq!(format!("{map:?}"), r#"{1: "one", 2: "two", 3: "three"}"#);
    }

    // =========================================================================
    // Lookup and Update Tests
    // =========================================================================

    #[rstest]
    fn test_new_creates_empty() {
        let map: PersistentTreeMap<i32, String> = PersistentTreeMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert!(map.root().is_none());
        assert!(map.first_key().is_none());
    }

    #[rstest]
    fn test_assoc_and_get() {
        let map = PersistentTreeMap::new()
            .assoc(1, "one".to_string())
            .assoc(2, "two".to_string());

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&1), Some(&"one".to_string()));
        assert_eq!(map.get(&2), Some(&"two".to_string()));
        assert_eq!(map.get(&3), None);
    }

    #[rstest]
    fn test_assoc_overwrite_keeps_length() {
        let map1 = PersistentTreeMap::new().assoc(1, "one".to_string());
        let map2 = map1.assoc(1, "ONE".to_string());

        assert_eq!(map1.get(&1), Some(&"one".to_string()));
        assert_eq!(map2.get(&1), Some(&"ONE".to_string()));
        assert_eq!(map1.len(), 1);
        assert_eq!(map2.len(), 1);
    }

    #[rstest]
    fn test_assoc_ex_inserts_new_key_only() {
        let map = PersistentTreeMap::new().assoc(1, "one".to_string());

        let grown = map.assoc_ex(2, "two".to_string()).unwrap();
        assert_eq!(grown.len(), 2);
        assert_eq!(grown.get(&2), Some(&"two".to_string()));

        let error = grown.assoc_ex(1, "ONE".to_string()).unwrap_err();
        assert_eq!(error, MapError::KeyAlreadyPresent);
        assert_eq!(grown.get(&1), Some(&"one".to_string()));
    }

    #[rstest]
    fn test_entry_at_and_val_at() {
        let map = PersistentTreeMap::new().assoc("k".to_string(), 1);
        let node = map.entry_at("k").unwrap();
        assert_eq!(node.key(), "k");
        assert_eq!(*node.value(), 1);
        assert!(map.entry_at("missing").is_none());
        assert_eq!(*map.val_at("missing", &-1), -1);
        assert_eq!(*map.val_at("k", &-1), 1);
    }

    #[rstest]
    fn test_without() {
        let map = PersistentTreeMap::new()
            .assoc(1, "one".to_string())
            .assoc(2, "two".to_string());
        let removed = map.without(&1);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed.get(&1), None);
        assert_eq!(removed.get(&2), Some(&"two".to_string()));
        assert_eq!(map.len(), 2);
    }

    #[rstest]
    fn test_without_missing_key_shares_root() {
        let map: PersistentTreeMap<i32, i32> = (0..10).map(|key| (key, key)).collect();
        let same = map.without(&42);
        assert!(ReferenceCounter::ptr_eq(
            map.root_link().unwrap(),
            same.root_link().unwrap()
        ));
    }

    #[rstest]
    fn test_without_every_key_keeps_search_order() {
        let mut map: PersistentTreeMap<i32, i32> = (0..64).map(|key| (key * 7 % 64, key)).collect();
        for key in (0..64).step_by(3) {
            map = map.without(&key);
            assert_search_order(&map);
            assert!(!map.contains_key(&key));
        }
        assert_eq!(map.len(), 64 - 22);
    }

    #[rstest]
    fn test_first_and_last_key() {
        let map = PersistentTreeMap::new()
            .assoc(3, "three".to_string())
            .assoc(1, "one".to_string())
            .assoc(5, "five".to_string());

        assert_eq!(map.first_key(), Some(&1));
        assert_eq!(map.last_key(), Some(&5));
    }

    #[rstest]
    fn test_custom_comparator_orders_keys() {
        let map = PersistentTreeMap::with_comparator(Reversed(NaturalOrder))
            .assoc(1, 'a')
            .assoc(3, 'c')
            .assoc(2, 'b');
        let keys: Vec<i32> = map.keys().copied().collect();
        assert_eq!(keys, vec![3, 2, 1]);
        assert_eq!(map.first_key(), Some(&3));
        assert_eq!(map.get(&2), Some(&'b'));
    }

    #[rstest]
    fn test_ascending_inserts_stay_balanced() {
        fn height<K, V>(node: Option<&Node<K, V>>) -> usize {
            node.map_or(0, |node_ref| 1 + height(node_ref.left()).max(height(node_ref.right())))
        }

        let map: PersistentTreeMap<i32, i32> = (0..1024).map(|key| (key, key)).collect();

        // A red-black tree of 1024 keys is at most 2 * log2(1025) deep.
        assert!(height(map.root()) <= 20);
        assert_search_order(&map);
    }

    /// Black height of a subtree, or `None` if a red-black rule is broken.
    fn black_height<K, V>(node: Option<&Node<K, V>>) -> Option<usize> {
        let Some(node) = node else {
            return Some(1);
        };
        if node.is_red() && (node.left().is_some_and(Node::is_red) || node.right().is_some_and(Node::is_red)) {
            return None;
        }
        let left = black_height(node.left())?;
        let right = black_height(node.right())?;
        (left == right).then_some(left + usize::from(!node.is_red()))
    }

    #[rstest]
    #[case::ascending((0..500).collect())]
    #[case::descending((0..500).rev().collect())]
    #[case::interleaved((0..500).map(|key| if key % 2 == 0 { key } else { 1000 - key }).collect())]
    fn test_inserts_keep_red_black_invariants(#[case] keys: Vec<i32>) {
        let mut map = PersistentTreeMap::new();
        for key in keys {
            map = map.assoc(key, ());
            assert!(black_height(map.root()).is_some());
            assert!(map.root().is_none_or(|root| !root.is_red()));
        }
    }

    // =========================================================================
    // Structural Sharing Tests
    // =========================================================================

    #[rstest]
    fn test_assoc_copies_only_the_path_to_the_key() {
        let original: PersistentTreeMap<i32, i32> = (0..128).map(|key| (key, key)).collect();
        let updated = original.assoc(37, -1);

        let mut original_nodes = Vec::new();
        collect_nodes(original.root_link(), &mut original_nodes);
        let mut updated_nodes = Vec::new();
        collect_nodes(updated.root_link(), &mut updated_nodes);

        let fresh: Vec<i32> = updated_nodes
            .iter()
            .filter(|node| {
                !original_nodes
                    .iter()
                    .any(|old| ReferenceCounter::ptr_eq(*old, *node))
            })
            .map(|node| *node.key())
            .collect();

        let mut path = Vec::new();
        let mut current = original.root();
        while let Some(node) = current {
            path.push(*node.key());
            current = match 37.cmp(node.key()) {
                Ordering::Less => node.left(),
                Ordering::Greater => node.right(),
                Ordering::Equal => None,
            };
        }

        assert_eq!(fresh.len(), path.len());
        assert!(fresh.iter().all(|key| path.contains(key)));
        assert_eq!(original.get(&37), Some(&37));
    }

    // =========================================================================
    // Sub-range Tests
    // =========================================================================

    #[rstest]
    fn test_sub_map_yields_window() {
        let map: PersistentTreeMap<i32, i32> =
            [1, 3, 5, 7, 9, 11].into_iter().map(|key| (key, key)).collect();
        let window = map.sub_map(5, 10);
        let keys: Vec<&i32> = window.keys().collect();
        assert_eq!(keys, vec![&5, &7, &9]);
    }

    #[rstest]
    #[case(10, 5)]
    #[case(10, 10)]
    fn test_sub_map_empty_or_inverted_is_empty(#[case] from: i32, #[case] to: i32) {
        let map: PersistentTreeMap<i32, i32> = (0..20).map(|key| (key, key)).collect();
        let window = map.sub_map(from, to);
        assert_eq!(window.count(), 0);
        assert!(matches!(window, SortedMap::Tree(_)));
    }

    #[rstest]
    fn test_head_and_tail_map() {
        let map: PersistentTreeMap<i32, i32> = (0..10).map(|key| (key, key)).collect();
        assert_eq!(map.head_map(3).count(), 3);
        assert_eq!(map.tail_map(7).count(), 3);
        assert_eq!(map.tail_map(7).first_key(), Some(&7));
    }

    // =========================================================================
    // Sequence Tests
    // =========================================================================

    #[rstest]
    fn test_create_from_descending_seq() {
        let map: PersistentTreeMap<i32, char> =
            [(1, 'a'), (2, 'b'), (3, 'c')].into_iter().collect();
        let rebuilt = PersistentTreeMap::create(NaturalOrder, map.rseq());
        assert_eq!(rebuilt, map);
        let empty = PersistentTreeMap::<i32, char>::create(NaturalOrder, map.empty().seq(true));
        assert!(empty.is_empty());
    }

    #[rstest]
    fn test_seq_count_matches_len() {
        let map: PersistentTreeMap<i32, i32> = (0..37).map(|key| (key, key)).collect();
        assert_eq!(map.seq(true).unwrap().count(), 37);
        assert_eq!(map.rseq().unwrap().count(), 37);
    }

    // =========================================================================
    // Equality and Hash Tests
    // =========================================================================

    #[rstest]
    fn test_eq_ignores_insertion_order() {
        let map1 = PersistentTreeMap::new()
            .assoc(1, "one".to_string())
            .assoc(2, "two".to_string());
        let map2 = PersistentTreeMap::new()
            .assoc(2, "two".to_string())
            .assoc(1, "one".to_string());

        assert_eq!(map1, map2);
        assert_eq!(map1.hash_code(), map2.hash_code());
        assert_eq!(map1.hasheq(), map2.hasheq());
        assert!(map1.equiv(&map2));
    }

    #[rstest]
    fn test_hash_code_is_cached() {
        let map: PersistentTreeMap<i32, i32> = (0..10).map(|key| (key, key)).collect();
        assert_eq!(map.hash.peek(), None);
        let first = map.hash_code();
        assert_eq!(map.hash.peek(), Some(first).filter(|hash| *hash != -1));
        assert_eq!(map.hash_code(), first);
        assert_eq!(map_hash(&map), first);
    }

    #[rstest]
    fn test_assoc_starts_with_fresh_hash() {
        let map: PersistentTreeMap<i32, i32> = (0..10).map(|key| (key, key)).collect();
        let before = map.hash_code();
        let updated = map.assoc(3, 300);
        assert_eq!(updated.hash.peek(), None);
        assert_ne!(updated.hash_code(), before);
        assert_eq!(map.hash_code(), before);
    }

    // =========================================================================
    // Cons Tests
    // =========================================================================

    #[rstest]
    fn test_cons_entry_vector_and_entries() {
        let map = PersistentTreeMap::new()
            .cons((1, 10))
            .and_then(|map| map.cons(ConsItem::Vector(vec![PairSlot::Key(2), PairSlot::Value(20)])))
            .and_then(|map| map.cons(ConsItem::Entries(vec![(3, 30), (1, 11)])))
            .unwrap();

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&1), Some(&11));
        assert_eq!(map.get(&2), Some(&20));
    }

    #[rstest]
    fn test_cons_another_map() {
        let base = PersistentTreeMap::new().assoc(1, 10).assoc(5, 50);
        let other = PersistentTreeMap::new().assoc(5, 55).assoc(9, 90);

        let merged = base.cons(&other).unwrap();
        assert_eq!(merged.keys().copied().collect::<Vec<_>>(), vec![1, 5, 9]);
        assert_eq!(merged.get(&5), Some(&55));

        let from_window = base.cons(&other.head_map(6)).unwrap();
        assert_eq!(from_window.len(), 2);
        assert_eq!(from_window.get(&5), Some(&55));
    }

    #[rstest]
    fn test_cons_rejects_non_pair_vector() {
        let map: PersistentTreeMap<i32, i32> = PersistentTreeMap::new();
        let error = map
            .cons(ConsItem::Vector(vec![
                PairSlot::Key(1),
                PairSlot::Value(1),
                PairSlot::Value(2),
            ]))
            .unwrap_err();
        assert!(matches!(error, MapError::InvalidArgument(_)));
    }
}

// =============================================================================
// Send + Sync Tests (arc feature only)
// =============================================================================


// =============================================================================
// Serde Tests
// =============================================================================

//! Resumable in-order traversal over a persistent red-black tree.
//!
//! Both traversal forms in this module keep an explicit path stack instead
//! of recursing:
//!
//! - [`TraversalSeq`] owns its stack as a [`PersistentList`], so stepping
//!   produces a new sequence and every intermediate sequence stays valid.
//! - [`Iter`] borrows the tree and keeps a `Vec` stack; it is the cheap
//!   choice for a single `for` loop.
//!
//! Seeking to an arbitrary key walks from the root once (O(log N)) and
//! leaves on the stack exactly the nodes that still owe a visit. Each step
//! pops the current node and pushes the spine of its next subtree, so a
//! full walk is O(N) with O(log N) extra space.
//!
//! ```text
//!            7                 seek 4, ascending
//!          /   \
//!        3      11             path 7 -> 3 -> 5: push 7 (left), skip 3 (right),
//!       / \    /               push 5 (left), reach nil
//!      1   5  9
//!                              stack (top first): [5, 7]
//! ```

use std::cmp::Ordering;
use std::fmt;

use super::ReferenceCounter;
use super::comparator::{Comparator, NaturalOrder};
use super::list::PersistentList;
use super::seq::Seq;
use super::treemap::{Node, NodeRef};

// =============================================================================
// Window Definition
// =============================================================================

/// The `[start, end)` key window a bounded traversal must stay inside.
///
/// Either side may be open. Owned by bounded [`TraversalSeq`]s and shared
/// between every step of one traversal.
pub(crate) struct Window<K, C> {
    comparator: C,
    start: Option<K>,
    end: Option<K>,
}

impl<K, C: Comparator<K>> Window<K, C> {
    pub(crate) const fn new(comparator: C, start: Option<K>, end: Option<K>) -> Self {
        Self {
            comparator,
            start,
            end,
        }
    }

    fn bounds(&self) -> Bounds<'_, K, C> {
        Bounds {
            comparator: &self.comparator,
            start: self.start.as_ref(),
            end: self.end.as_ref(),
        }
    }
}

/// Borrowed view of a key window.
pub(crate) struct Bounds<'a, K, C> {
    comparator: &'a C,
    start: Option<&'a K>,
    end: Option<&'a K>,
}

impl<K, C> Clone for Bounds<'_, K, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, C> Copy for Bounds<'_, K, C> {}

impl<'a, K, C: Comparator<K>> Bounds<'a, K, C> {
    pub(crate) const fn new(comparator: &'a C, start: Option<&'a K>, end: Option<&'a K>) -> Self {
        Self {
            comparator,
            start,
            end,
        }
    }

    pub(crate) const fn unbounded(comparator: &'a C) -> Self {
        Self::new(comparator, None, None)
    }

    fn below_start(&self, key: &K) -> bool {
        self.start
            .is_some_and(|start| self.comparator.compare(key, start) == Ordering::Less)
    }

    fn at_or_past_end(&self, key: &K) -> bool {
        self.end
            .is_some_and(|end| self.comparator.compare(key, end) != Ordering::Less)
    }

    /// A key the traversal must not yield in the given direction.
    ///
    /// Keys are visited in order, so the first escaping key ends the walk.
    fn escapes(&self, key: &K, ascending: bool) -> bool {
        if ascending {
            self.at_or_past_end(key)
        } else {
            self.below_start(key)
        }
    }

    /// For a node outside the window, the only child that can still hold
    /// in-window keys. `None` when the node itself is inside.
    fn detour<'n, V>(&self, node: &'n NodeRef<K, V>) -> Option<Option<&'n NodeRef<K, V>>> {
        if self.at_or_past_end(node.key()) {
            Some(node.left_link())
        } else if self.below_start(node.key()) {
            Some(node.right_link())
        } else {
            None
        }
    }
}

// =============================================================================
// Seek
// =============================================================================

/// Walks from `root` towards `key` and returns the pending path, bottom of
/// the stack first (the last element is the first node to yield).
///
/// Nodes outside the window are never pushed: a node at or past `end` sends
/// the walk left, a node below `start` sends it right. A seek key below
/// `start` (ascending) or at or past `end` (descending) is thereby clamped
/// to the nearest in-window key.
pub(crate) fn seek_path<'a, K, V, C: Comparator<K>>(
    root: Option<&'a NodeRef<K, V>>,
    key: &K,
    ascending: bool,
    bounds: Bounds<'_, K, C>,
) -> Vec<&'a NodeRef<K, V>> {
    let mut path = Vec::new();

    if ascending && bounds.at_or_past_end(key) {
        return path;
    }
    if !ascending && bounds.below_start(key) {
        return path;
    }

    let mut current = root;
    while let Some(node) = current {
        if let Some(child) = bounds.detour(node) {
            current = child;
            continue;
        }

        match (bounds.comparator.compare(key, node.key()), ascending) {
            (Ordering::Equal, _) => {
                path.push(node);
                break;
            }
            (Ordering::Less, true) => {
                path.push(node);
                current = node.left_link();
            }
            (Ordering::Greater, true) => current = node.right_link(),
            (Ordering::Greater, false) => {
                path.push(node);
                current = node.right_link();
            }
            (Ordering::Less, false) => current = node.left_link(),
        }
    }

    path
}

/// The subtree a popped node continues into.
fn continuation<K, V>(node: &NodeRef<K, V>, ascending: bool) -> Option<&NodeRef<K, V>> {
    if ascending {
        node.right_link()
    } else {
        node.left_link()
    }
}

/// The child that leads towards the next key in traversal order.
fn towards_first<K, V>(node: &NodeRef<K, V>, ascending: bool) -> Option<&NodeRef<K, V>> {
    if ascending {
        node.left_link()
    } else {
        node.right_link()
    }
}

// =============================================================================
// TraversalSeq Definition
// =============================================================================

/// A lazy, immutable in-order sequence of tree entries.
///
/// The sequence is the path stack `current :: pending`: `current` is the
/// element [`first`](Seq::first) returns, and `pending` holds the ancestors
/// whose continuation subtree has not been visited yet, nearest first.
/// [`next`](Seq::next) never mutates; it builds a new stack that shares the
/// untouched tail of this one.
///
/// # Examples
///
/// ```rust
/// use submap::persistent::{PersistentTreeMap, Seq};
///
/// let map: PersistentTreeMap<i32, i32> = (0..10).map(|key| (key, key * key)).collect();
///
/// let from_four = map.seq_from(&4, true).unwrap();
/// let keys: Vec<i32> = from_four.iter().map(|node| *node.key()).collect();
/// assert_eq!(keys, vec![4, 5, 6, 7, 8, 9]);
///
/// let down_from_four = map.seq_from(&4, false).unwrap();
/// assert_eq!(down_from_four.count(), 5);
/// ```
pub struct TraversalSeq<K, V, C = NaturalOrder> {
    current: NodeRef<K, V>,
    pending: PersistentList<NodeRef<K, V>>,
    ascending: bool,
    window: Option<ReferenceCounter<Window<K, C>>>,
}

impl<K, V, C: Comparator<K>> TraversalSeq<K, V, C> {
    /// Starts an unbounded traversal at the first (ascending) or last
    /// (descending) node under `root`.
    pub(crate) fn from_root(root: Option<&NodeRef<K, V>>, ascending: bool) -> Option<Self> {
        let stack = Self::push_spine(PersistentList::new(), root, ascending, None);
        Self::from_stack(&stack, ascending, None)
    }

    /// Starts a traversal at the first (ascending) or last (descending)
    /// in-window node under `root`.
    pub(crate) fn bounded(
        root: Option<&NodeRef<K, V>>,
        ascending: bool,
        window: ReferenceCounter<Window<K, C>>,
    ) -> Option<Self> {
        let stack = Self::push_spine(PersistentList::new(), root, ascending, Some(window.bounds()));
        Self::from_stack(&stack, ascending, Some(window))
    }

    /// Seeks to `key` and starts a traversal there.
    ///
    /// Ascending traversals start at the least key `>= key`, descending ones
    /// at the greatest key `<= key`, both clamped to `window` when present.
    pub(crate) fn seek(
        root: Option<&NodeRef<K, V>>,
        comparator: &C,
        key: &K,
        ascending: bool,
        window: Option<ReferenceCounter<Window<K, C>>>,
    ) -> Option<Self> {
        let path = match &window {
            Some(window) => seek_path(root, key, ascending, window.bounds()),
            None => seek_path(root, key, ascending, Bounds::unbounded(comparator)),
        };
        let stack = path
            .into_iter()
            .fold(PersistentList::new(), |stack, node| stack.cons(node.clone()));
        Self::from_stack(&stack, ascending, window)
    }

    fn from_stack(
        stack: &PersistentList<NodeRef<K, V>>,
        ascending: bool,
        window: Option<ReferenceCounter<Window<K, C>>>,
    ) -> Option<Self> {
        let (current, pending) = stack.uncons()?;
        if let Some(window) = &window
            && window.bounds().escapes(current.key(), ascending)
        {
            return None;
        }
        Some(Self {
            current: current.clone(),
            pending,
            ascending,
            window,
        })
    }

    /// Pushes `node` and its spine towards the first key in traversal order,
    /// skipping nodes outside `bounds`.
    fn push_spine(
        stack: PersistentList<NodeRef<K, V>>,
        node: Option<&NodeRef<K, V>>,
        ascending: bool,
        bounds: Option<Bounds<'_, K, C>>,
    ) -> PersistentList<NodeRef<K, V>> {
        let mut stack = stack;
        let mut current = node;
        while let Some(node_ref) = current {
            if let Some(child) = bounds.and_then(|bounds| bounds.detour(node_ref)) {
                current = child;
                continue;
            }
            stack = stack.cons(node_ref.clone());
            current = towards_first(node_ref, ascending);
        }
        stack
    }

    /// Returns `true` if this sequence walks keys in ascending order.
    #[inline]
    #[must_use]
    pub const fn is_ascending(&self) -> bool {
        self.ascending
    }

    /// Returns an iterator over clones of the remaining `(key, value)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (K, V)> + use<K, V, C>
    where
        K: Clone,
        V: Clone,
    {
        let mut current = Some(self.clone());
        std::iter::from_fn(move || {
            let seq = current.take()?;
            let entry = (seq.current.key().clone(), seq.current.value().clone());
            current = seq.next();
            Some(entry)
        })
    }
}

impl<K, V, C: Comparator<K>> Seq for TraversalSeq<K, V, C> {
    type Item = Node<K, V>;

    #[inline]
    fn first(&self) -> &Node<K, V> {
        &self.current
    }

    fn next(&self) -> Option<Self> {
        let ascending = self.ascending;
        let stack = Self::push_spine(
            self.pending.clone(),
            continuation(&self.current, ascending),
            ascending,
            self.window.as_deref().map(Window::bounds),
        );
        Self::from_stack(&stack, ascending, self.window.clone())
    }
}

impl<K, V, C> Clone for TraversalSeq<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
            pending: self.pending.clone(),
            ascending: self.ascending,
            window: self.window.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for TraversalSeq<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TraversalSeq")
            .field("current", &(self.current.key(), self.current.value()))
            .field("pending", &self.pending.len())
            .field("ascending", &self.ascending)
            .finish()
    }
}

// =============================================================================
// Borrowed Iterator
// =============================================================================

/// A borrowing in-order iterator over tree entries, optionally bounded.
///
/// Out-of-window nodes are never pushed, so the stack running dry is the
/// only end condition.
pub struct Iter<'a, K, V, C = NaturalOrder> {
    stack: Vec<&'a NodeRef<K, V>>,
    ascending: bool,
    bounds: Bounds<'a, K, C>,
}

impl<'a, K, V, C: Comparator<K>> Iter<'a, K, V, C> {
    pub(crate) fn new(
        root: Option<&'a NodeRef<K, V>>,
        ascending: bool,
        bounds: Bounds<'a, K, C>,
    ) -> Self {
        let mut iterator = Self {
            stack: Vec::new(),
            ascending,
            bounds,
        };
        iterator.push_spine(root);
        iterator
    }

    fn push_spine(&mut self, node: Option<&'a NodeRef<K, V>>) {
        let mut current = node;
        while let Some(node_ref) = current {
            if let Some(child) = self.bounds.detour(node_ref) {
                current = child;
                continue;
            }
            self.stack.push(node_ref);
            current = towards_first(node_ref, self.ascending);
        }
    }
}

impl<'a, K, V, C: Comparator<K>> Iterator for Iter<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_spine(continuation(node, self.ascending));
        Some((node.key(), node.value()))
    }
}

impl<K, V, C: Comparator<K>> std::iter::FusedIterator for Iter<'_, K, V, C> {}

// =============================================================================
// Tests
// =============================================================================

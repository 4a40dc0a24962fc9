//! Persistent (immutable) sorted maps.
//!
//! This module provides immutable map structures that use structural
//! sharing to minimize copying:
//!
//! - [`PersistentTreeMap`]: Persistent sorted map (Red-Black Tree)
//! - [`RangeView`]: `[start, end)` window over a [`PersistentTreeMap`]
//! - [`SortedMap`]: Either of the two, as returned by window updates
//! - [`TraversalSeq`]: Lazy in-order entry sequence with an explicit path stack
//! - [`KeySeq`] / [`ValSeq`]: Key and value projections of an entry sequence
//! - [`PersistentList`]: Persistent singly-linked list, the path stack
//!
//! # Structural Sharing
//!
//! `assoc` and `without` copy only the nodes on the path to the changed key.
//! Views and sequences hold references into the tree and never copy it.
//!
//! # Examples
//!
//! ## `PersistentTreeMap`
//!
//! ```rust
//! use submap::persistent::PersistentTreeMap;
//!
//! let map = PersistentTreeMap::new()
//!     .assoc(3, "three")
//!     .assoc(1, "one")
//!     .assoc(2, "two");
//!
//! // Entries are always in sorted order
//! let keys: Vec<&i32> = map.keys().collect();
//! assert_eq!(keys, vec![&1, &2, &3]);
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.assoc(1, "ONE");
//! assert_eq!(map.get(&1), Some(&"one"));     // Original unchanged
//! assert_eq!(updated.get(&1), Some(&"ONE")); // New version
//! ```
//!
//! ## `RangeView` and `TraversalSeq`
//!
//! ```rust
//! use submap::persistent::{KeySeq, PersistentTreeMap, Seq};
//!
//! let map: PersistentTreeMap<i32, i32> = (0..100).map(|key| (key, key)).collect();
//! let window = map.tail_map(10).head_map(20);
//!
//! // Seek to 15 and walk down to the window's start.
//! let keys = KeySeq::create(window.seq_from(&15, false)).unwrap();
//! assert_eq!(keys.iter().collect::<Vec<_>>(), vec![15, 14, 13, 12, 11, 10]);
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled (default), this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled, this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub type ReferenceCounter<T> = std::sync::Arc<T>;

/// Reference-counted smart pointer type (`Rc` without the `arc` feature).
#[cfg(not(feature = "arc"))]
pub type ReferenceCounter<T> = std::rc::Rc<T>;

mod comparator;
mod cons;
mod entry;
mod equality;
mod list;
mod projection;
mod range_view;
mod seq;
mod sorted_map;
mod surface;
mod traversal;
mod treemap;

pub use comparator::{Comparator, NaturalOrder, Reversed};
pub use cons::{ConsItem, PairSlot};
pub use entry::MapEntry;
pub use equality::{
    HashCache, MapLike, element_hash, element_hasheq, map_equals, map_equiv, map_hash, map_hasheq,
};
pub use list::{PersistentList, PersistentListIterator};
pub use projection::{KeySeq, ValSeq};
pub use range_view::RangeView;
pub use seq::{Seq, SeqIter};
pub use sorted_map::SortedMap;
pub use surface::MapSurface;
pub use traversal::{Iter, TraversalSeq};
pub use treemap::{Node, NodeRef, PersistentTreeMap};

// =============================================================================
// Tests
// =============================================================================

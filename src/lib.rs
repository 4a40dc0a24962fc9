//! # submap
//!
//! Persistent sorted maps with bounded range views.
//!
//! ## Overview
//!
//! Every map in this crate is immutable: `assoc` and `without` return a new
//! version that shares all untouched structure with the old one. The crate
//! provides:
//!
//! - **`PersistentTreeMap`**: a persistent red-black tree ordered by a
//!   pluggable comparator
//! - **`RangeView`**: a `[start, end)` window over a tree map that never
//!   copies it
//! - **`TraversalSeq`**: a lazy in-order sequence driven by an explicit
//!   path stack, seekable to any key in O(log N)
//! - **`KeySeq` / `ValSeq`**: projections over entry sequences
//! - **Map equality and hashing** that only look at the (key, value) pairs,
//!   whatever the concrete map type
//!
//! ## Feature Flags
//!
//! - `arc` (default): share nodes through `Arc`, making every map `Send + Sync`
//! - `serde`: `Serialize`/`Deserialize` for the persistent maps
//! - `fxhash`: hash map elements with `rustc-hash` instead of `DefaultHasher`
//! - `full`: enable all features
//!
//! ## Example
//!
//! ```rust
//! use submap::prelude::*;
//!
//! let map: PersistentTreeMap<i32, &str> =
//!     [(1, "a"), (3, "b"), (5, "c"), (7, "d"), (9, "e"), (11, "f")]
//!         .into_iter()
//!         .collect();
//!
//! let window = map.sub_map(5, 10);
//! let keys: Vec<&i32> = window.keys().collect();
//! assert_eq!(keys, vec![&5, &7, &9]);
//!
//! // Updating a key outside the window gives back a full tree map.
//! let promoted = window.assoc(15, "g");
//! assert!(matches!(promoted, SortedMap::Tree(_)));
//! assert_eq!(promoted.count(), 4);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// ```rust
/// use submap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::MapError;
    pub use crate::persistent::*;
}

pub mod error;
pub mod persistent;

pub use error::{MapError, Result};

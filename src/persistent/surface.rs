//! A conventional map-shaped surface over the persistent maps.
//!
//! Code written against a mutable map interface can read a persistent map
//! through [`MapSurface`]. Reads answer from the map; writes are refused with
//! [`MapError::UnsupportedOperation`], since a persistent map is never
//! changed in place. Use `assoc` and `without` to derive updated versions.
//!
//! ```rust
//! use submap::persistent::{MapSurface, PersistentTreeMap};
//! use submap::MapError;
//!
//! let map: PersistentTreeMap<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();
//! assert!(map.contains_value(&2));
//! assert_eq!(map.key_list(), vec!["a", "b"]);
//! assert_eq!(map.put("c", 3), Err(MapError::UnsupportedOperation("put")));
//! ```

use super::comparator::Comparator;
use super::equality::MapLike;
use super::range_view::RangeView;
use super::sorted_map::SortedMap;
use super::treemap::PersistentTreeMap;
use crate::error::{MapError, Result};

fn refuse<T>(operation: &'static str) -> Result<T> {
    tracing::debug!(operation, "refused write through the map surface");
    Err(MapError::UnsupportedOperation(operation))
}

/// Read-mostly map interface: every read is answered, every write refused.
pub trait MapSurface<K, V>: MapLike<K, V> {
    /// Returns the value for `key`.
    fn surface_get(&self, key: &K) -> Option<&V> {
        self.lookup(key)
    }

    /// Returns `true` if the map holds no entries.
    fn is_empty_map(&self) -> bool {
        self.size() == 0
    }

    /// Returns `true` if any entry holds `value`. Walks the map.
    fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        !self.for_each_entry_while(|_, candidate| candidate != value)
    }

    /// Returns `true` if the key set holds `key`.
    fn key_set_contains(&self, key: &K) -> bool {
        self.lookup(key).is_some()
    }

    /// Returns `true` if the entry set holds `(key, value)`.
    fn entry_set_contains(&self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.lookup(key).is_some_and(|found| found == value)
    }

    /// Returns the keys in the map's iteration order.
    fn key_list(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut keys = Vec::with_capacity(self.size());
        self.for_each_entry_while(|key, _| {
            keys.push(key.clone());
            true
        });
        keys
    }

    /// Returns the values in the map's iteration order.
    fn value_list(&self) -> Vec<V>
    where
        V: Clone,
    {
        let mut values = Vec::with_capacity(self.size());
        self.for_each_entry_while(|_, value| {
            values.push(value.clone());
            true
        });
        values
    }

    /// Always fails.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::UnsupportedOperation`].
    fn put(&self, _key: K, _value: V) -> Result<Option<V>> {
        refuse("put")
    }

    /// Always fails.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::UnsupportedOperation`].
    fn put_all<I>(&self, _entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        refuse("put_all")
    }

    /// Always fails.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::UnsupportedOperation`].
    fn remove(&self, _key: &K) -> Result<Option<V>> {
        refuse("remove")
    }

    /// Always fails.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::UnsupportedOperation`].
    fn clear(&self) -> Result<()> {
        refuse("clear")
    }
}

impl<K, V, C> MapSurface<K, V> for PersistentTreeMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
{
}

impl<K, V, C> MapSurface<K, V> for RangeView<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
{
}

impl<K, V, C> MapSurface<K, V> for SortedMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
{
}

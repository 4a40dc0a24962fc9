//! Map entry accessors.

use super::ReferenceCounter;

/// Read access to a (key, value) pair.
///
/// Tree nodes are entries, so traversal sequences hand out nodes directly
/// instead of allocating pairs.
///
/// ```rust
/// use submap::persistent::MapEntry;
///
/// let entry = ("answer", 42);
/// assert_eq!(*entry.key(), "answer");
/// assert_eq!(*entry.value(), 42);
/// ```
pub trait MapEntry {
    /// The key type.
    type Key;
    /// The value type.
    type Value;

    /// Returns the entry's key.
    fn key(&self) -> &Self::Key;

    /// Returns the entry's value.
    fn value(&self) -> &Self::Value;
}

impl<K, V> MapEntry for (K, V) {
    type Key = K;
    type Value = V;

    #[inline]
    fn key(&self) -> &K {
        &self.0
    }

    #[inline]
    fn value(&self) -> &V {
        &self.1
    }
}

impl<E: MapEntry> MapEntry for ReferenceCounter<E> {
    type Key = E::Key;
    type Value = E::Value;

    #[inline]
    fn key(&self) -> &Self::Key {
        (**self).key()
    }

    #[inline]
    fn value(&self) -> &Self::Value {
        (**self).value()
    }
}

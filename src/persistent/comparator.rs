//! Key ordering strategies for sorted persistent structures.
//!
//! Every sorted structure in this crate is parameterized by a
//! [`Comparator`]. The default, [`NaturalOrder`], defers to [`Ord`]; any
//! `Fn(&K, &K) -> Ordering` closure or function pointer works as well.
//!
//! # Examples
//!
//! ```rust
//! use std::cmp::Ordering;
//! use submap::persistent::{Comparator, NaturalOrder, PersistentTreeMap, Reversed};
//!
//! assert_eq!(NaturalOrder.compare(&1, &2), Ordering::Less);
//! assert_eq!(Reversed(NaturalOrder).compare(&1, &2), Ordering::Greater);
//!
//! let by_length = |left: &String, right: &String| left.len().cmp(&right.len());
//! let map = PersistentTreeMap::with_comparator(by_length)
//!     .assoc("ccc".to_string(), 3)
//!     .assoc("a".to_string(), 1);
//! assert_eq!(map.first_key(), Some(&"a".to_string()));
//! ```

use std::cmp::Ordering;

/// A total order over keys of type `K`.
///
/// Implementations must be consistent: `compare(a, b)` is the reverse of
/// `compare(b, a)`, and the order is transitive. A comparator that breaks
/// these rules leaves lookups and traversals unspecified, but never unsafe.
pub trait Comparator<K: ?Sized> {
    /// Compares two keys.
    fn compare(&self, left: &K, right: &K) -> Ordering;
}

/// The natural order of keys, as given by [`Ord`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        left.cmp(right)
    }
}

/// Reverses the order of the wrapped comparator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Reversed<C>(pub C);

impl<K: ?Sized, C: Comparator<K>> Comparator<K> for Reversed<C> {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        self.0.compare(right, left)
    }
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        self(left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 2, Ordering::Less)]
    #[case(2, 2, Ordering::Equal)]
    #[case(3, 2, Ordering::Greater)]
    fn test_natural_order(#[case] left: i32, #[case] right: i32, #[case] expected: Ordering) {
        assert_eq!(NaturalOrder.compare(&left, &right), expected);
    }

    #[rstest]
    fn test_reversed_flips_natural_order() {
        let comparator = Reversed(NaturalOrder);
        assert_eq!(comparator.compare(&1, &2), Ordering::Greater);
        assert_eq!(comparator.compare(&2, &2), Ordering::Equal);
    }

    #[rstest]
    fn test_closure_comparator() {
        let by_abs = |left: &i32, right: &i32| left.abs().cmp(&right.abs());
        assert_eq!(by_abs.compare(&-5, &3), Ordering::Greater);
        assert_eq!(by_abs.compare(&-3, &3), Ordering::Equal);
    }

    #[rstest]
    fn test_function_pointer_comparator() {
        fn descending(left: &u8, right: &u8) -> Ordering {
            right.cmp(left)
        }
        let comparator: fn(&u8, &u8) -> Ordering = descending;
        assert_eq!(comparator.compare(&1, &9), Ordering::Greater);
    }
}

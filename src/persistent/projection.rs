//! Key and value projections over entry sequences.
//!
//! [`KeySeq`] and [`ValSeq`] wrap any [`Seq`] of [`MapEntry`] items and
//! expose only the key or only the value of each entry. They hold no state
//! of their own: stepping a projection steps the wrapped sequence.

use std::fmt;

use super::entry::MapEntry;
use super::seq::Seq;

/// The keys of an entry sequence, in the sequence's order.
///
/// # Examples
///
/// ```rust
/// use submap::persistent::{KeySeq, PersistentTreeMap, Seq};
///
/// let map: PersistentTreeMap<i32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
/// let keys = KeySeq::create(map.seq(true)).unwrap();
/// assert_eq!(keys.iter().collect::<Vec<_>>(), vec![1, 2]);
///
/// assert!(KeySeq::create(map.empty().seq(true)).is_none());
/// ```
#[derive(Clone)]
pub struct KeySeq<S> {
    entries: S,
}

impl<S> KeySeq<S>
where
    S: Seq,
    S::Item: MapEntry,
{
    /// Wraps a possibly empty entry sequence.
    #[must_use]
    pub fn create(entries: Option<S>) -> Option<Self> {
        entries.map(|entries| Self { entries })
    }

    /// Returns the wrapped entry sequence.
    pub const fn entries(&self) -> &S {
        &self.entries
    }
}

impl<S> Seq for KeySeq<S>
where
    S: Seq,
    S::Item: MapEntry,
{
    type Item = <S::Item as MapEntry>::Key;

    #[inline]
    fn first(&self) -> &Self::Item {
        self.entries.first().key()
    }

    fn next(&self) -> Option<Self> {
        Self::create(self.entries.next())
    }

    fn count(&self) -> usize {
        self.entries.count()
    }
}

impl<S> fmt::Debug for KeySeq<S>
where
    S: Seq,
    S::Item: MapEntry,
    <S::Item as MapEntry>::Key: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("KeySeq")
            .field("first", self.first())
            .finish_non_exhaustive()
    }
}

/// The values of an entry sequence, in the sequence's order.
///
/// ```rust
/// use submap::persistent::{PersistentTreeMap, Seq, ValSeq};
///
/// let map: PersistentTreeMap<i32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
/// let values = ValSeq::create(map.rseq()).unwrap();
/// assert_eq!(values.iter().collect::<Vec<_>>(), vec!["b", "a"]);
/// ```
#[derive(Clone)]
pub struct ValSeq<S> {
    entries: S,
}

impl<S> ValSeq<S>
where
    S: Seq,
    S::Item: MapEntry,
{
    /// Wraps a possibly empty entry sequence.
    #[must_use]
    pub fn create(entries: Option<S>) -> Option<Self> {
        entries.map(|entries| Self { entries })
    }

    /// Returns the wrapped entry sequence.
    pub const fn entries(&self) -> &S {
        &self.entries
    }
}

impl<S> Seq for ValSeq<S>
where
    S: Seq,
    S::Item: MapEntry,
{
    type Item = <S::Item as MapEntry>::Value;

    #[inline]
    fn first(&self) -> &Self::Item {
        self.entries.first().value()
    }

    fn next(&self) -> Option<Self> {
        Self::create(self.entries.next())
    }

    fn count(&self) -> usize {
        self.entries.count()
    }
}

impl<S> fmt::Debug for ValSeq<S>
where
    S: Seq,
    S::Item: MapEntry,
    <S::Item as MapEntry>::Value: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ValSeq")
            .field("first", self.first())
            .finish_non_exhaustive()
    }
}

//! The lazy sequence contract.
//!
//! A [`Seq`] is an immutable cursor: it always has a current element, and
//! advancing produces a *new* sequence rather than mutating the old one.
//! Exhaustion is expressed as `None` from [`Seq::next`], so a live `Seq` is
//! never empty. Holding on to an intermediate sequence keeps it valid; it
//! can be walked again from that point at any time.

/// An immutable, non-empty lazy sequence.
///
/// # Examples
///
/// ```rust
/// use submap::persistent::{PersistentTreeMap, Seq};
///
/// let map: PersistentTreeMap<i32, char> = [(2, 'b'), (1, 'a')].into_iter().collect();
/// let seq = map.seq(true).unwrap();
/// assert_eq!(*seq.first().key(), 1);
///
/// let rest = seq.next().unwrap();
/// assert_eq!(*rest.first().key(), 2);
/// assert!(rest.next().is_none());
///
/// // The original sequence is untouched.
/// assert_eq!(seq.count(), 2);
/// ```
pub trait Seq: Sized + Clone {
    /// The element type.
    type Item: ?Sized;

    /// Returns the current element.
    fn first(&self) -> &Self::Item;

    /// Returns the sequence after the current element, or `None` when the
    /// current element is the last one.
    #[must_use]
    fn next(&self) -> Option<Self>;

    /// Counts the elements by walking to the end.
    ///
    /// # Complexity
    ///
    /// O(n)
    fn count(&self) -> usize {
        let mut total = 1;
        let mut current = self.next();
        while let Some(seq) = current {
            total += 1;
            current = seq.next();
        }
        total
    }

    /// Returns an iterator over clones of the remaining elements.
    fn iter(&self) -> SeqIter<Self>
    where
        Self::Item: Clone,
    {
        SeqIter {
            current: Some(self.clone()),
        }
    }
}

/// Iterator adapter over a [`Seq`], yielding owned elements.
pub struct SeqIter<S> {
    current: Option<S>,
}

impl<S> SeqIter<S> {
    /// Creates an iterator over a possibly empty sequence.
    pub const fn new(seq: Option<S>) -> Self {
        Self { current: seq }
    }
}

impl<S> Iterator for SeqIter<S>
where
    S: Seq,
    S::Item: Clone,
{
    type Item = S::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let seq = self.current.take()?;
        let element = seq.first().clone();
        self.current = seq.next();
        Some(element)
    }
}

impl<S> std::iter::FusedIterator for SeqIter<S>
where
    S: Seq,
    S::Item: Clone,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent::PersistentTreeMap;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(5)]
    fn test_seq_iter_over_possibly_empty_sequence(#[case] length: i32) {
        let map: PersistentTreeMap<i32, i32> = (0..length).map(|key| (key, key * 2)).collect();
        let keys: Vec<i32> = SeqIter::new(map.seq(true))
            .map(|node| *node.key())
            .collect();
        assert_eq!(keys, (0..length).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_iter_leaves_the_sequence_unchanged() {
        let map: PersistentTreeMap<i32, i32> = (0..3).map(|key| (key, key)).collect();
        let seq = map.seq(false).unwrap();
        assert_eq!(seq.iter().count(), 3);
        assert_eq!(*seq.first().key(), 2);
        assert_eq!(seq.count(), 3);
    }
}

//! Adding entries to a map in one of several shapes.
//!
//! [`ConsItem`] is the closed set of things a map accepts through `cons`:
//! a single entry, a two-slot vector holding a key then a value, or a batch
//! of entries. Another map, any iterator of entries, or an entry sequence
//! all become a batch. Anything else cannot be expressed, so the only
//! runtime failure left is a vector of the wrong shape.

use super::entry::MapEntry;
use super::seq::{Seq, SeqIter};
use crate::error::{MapError, Result};

/// One slot of a vector passed to `cons`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PairSlot<K, V> {
    /// The key slot, which must come first.
    Key(K),
    /// The value slot, which must come second.
    Value(V),
}

/// An item that can be added to a map with `cons`.
///
/// # Examples
///
/// ```rust
/// use submap::persistent::{ConsItem, PairSlot, PersistentTreeMap};
///
/// let map = PersistentTreeMap::new()
///     .cons(ConsItem::Entries(vec![(1, 'a'), (2, 'b')]))
///     .unwrap();
/// assert_eq!(map.len(), 2);
///
/// let error = map
///     .cons(ConsItem::Vector(vec![PairSlot::Value('x'), PairSlot::Key(3)]))
///     .unwrap_err();
/// assert_eq!(
///     error.to_string(),
///     "invalid argument: Vector arg to map conj must be a pair"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsItem<K, V> {
    /// A single key-value entry.
    Entry(K, V),
    /// A vector that must hold exactly a key followed by a value.
    Vector(Vec<PairSlot<K, V>>),
    /// Entries added in order; later entries win on duplicate keys.
    Entries(Vec<(K, V)>),
}

const NOT_A_PAIR: &str = "Vector arg to map conj must be a pair";

impl<K, V> ConsItem<K, V> {
    /// Applies `assoc` for every entry this item carries, threading the map
    /// through each call.
    pub(crate) fn fold_into<M, F>(self, map: M, mut assoc: F) -> Result<M>
    where
        F: FnMut(M, K, V) -> M,
    {
        match self {
            Self::Entry(key, value) => Ok(assoc(map, key, value)),
            Self::Vector(slots) => {
                let (key, value) = into_pair(slots)?;
                Ok(assoc(map, key, value))
            }
            Self::Entries(entries) => Ok(entries
                .into_iter()
                .fold(map, |map, (key, value)| assoc(map, key, value))),
        }
    }
}

impl<K: Clone, V: Clone> ConsItem<K, V> {
    /// Collects entries of any shape into a batch.
    ///
    /// ```rust
    /// use submap::persistent::{ConsItem, PersistentTreeMap};
    ///
    /// let source = PersistentTreeMap::new().assoc(1, 'a').assoc(2, 'b');
    /// let item = ConsItem::from_entries(source.seq(true).unwrap().entries());
    /// assert_eq!(item, ConsItem::Entries(vec![(1, 'a'), (2, 'b')]));
    /// ```
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: MapEntry<Key = K, Value = V>,
    {
        Self::Entries(
            entries
                .into_iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        )
    }

    /// Collects the remaining elements of a possibly empty entry sequence.
    pub fn from_seq<S>(seq: Option<S>) -> Self
    where
        S: Seq,
        S::Item: MapEntry<Key = K, Value = V> + Clone,
    {
        Self::from_entries(SeqIter::new(seq))
    }
}

fn into_pair<K, V>(slots: Vec<PairSlot<K, V>>) -> Result<(K, V)> {
    let mut slots = slots.into_iter();
    match (slots.next(), slots.next(), slots.next()) {
        (Some(PairSlot::Key(key)), Some(PairSlot::Value(value)), None) => Ok((key, value)),
        _ => {
            tracing::debug!("rejected cons of a vector that is not a key-value pair");
            Err(MapError::invalid_argument(NOT_A_PAIR))
        }
    }
}

impl<K, V> From<(K, V)> for ConsItem<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self::Entry(key, value)
    }
}

impl<K, V> From<Vec<(K, V)>> for ConsItem<K, V> {
    fn from(entries: Vec<(K, V)>) -> Self {
        Self::Entries(entries)
    }
}

/// Every entry of another map, in that map's iteration order.
impl<'a, M, K, V> From<&'a M> for ConsItem<K, V>
where
    M: ?Sized,
    &'a M: IntoIterator<Item = (&'a K, &'a V)>,
    K: Clone + 'a,
    V: Clone + 'a,
{
    fn from(map: &'a M) -> Self {
        Self::Entries(
            map.into_iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent::PersistentTreeMap;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn collect(item: ConsItem<i32, char>) -> Result<Vec<(i32, char)>> {
        item.fold_into(Vec::new(), |mut entries, key, value| {
            entries.push((key, value));
            entries
        })
    }

    #[rstest]
    fn test_entry_adds_one() {
        assert_eq!(collect((1, 'a').into()).unwrap(), vec![(1, 'a')]);
    }

    #[rstest]
    fn test_entries_are_added_in_order() {
        let entries = vec![(2, 'b'), (1, 'a'), (2, 'c')];
        assert_eq!(collect(entries.clone().into()).unwrap(), entries);
    }

    #[rstest]
    fn test_empty_entries_leave_map_unchanged() {
        assert!(collect(ConsItem::Entries(Vec::new())).unwrap().is_empty());
    }

    #[rstest]
    fn test_vector_pair_is_accepted() {
        let item = ConsItem::Vector(vec![PairSlot::Key(7), PairSlot::Value('z')]);
        assert_eq!(collect(item).unwrap(), vec![(7, 'z')]);
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![PairSlot::Key(1)])]
    #[case(vec![PairSlot::Value('a'), PairSlot::Key(1)])]
    #[case(vec![PairSlot::Key(1), PairSlot::Key(2)])]
    #[case(vec![PairSlot::Key(1), PairSlot::Value('a'), PairSlot::Value('b')])]
    fn test_vector_of_wrong_shape_is_rejected(#[case] slots: Vec<PairSlot<i32, char>>) {
        let error = collect(ConsItem::Vector(slots)).unwrap_err();
        assert_eq!(error, MapError::invalid_argument(NOT_A_PAIR));
    }

    #[rstest]
    fn test_another_map_becomes_a_batch() {
        let source: BTreeMap<i32, char> = [(3, 'c'), (1, 'a')].into_iter().collect();
        assert_eq!(collect((&source).into()).unwrap(), vec![(1, 'a'), (3, 'c')]);

        let tree: PersistentTreeMap<i32, char> = source.clone().into_iter().collect();
        let window = tree.tail_map(2);
        assert_eq!(collect((&window).into()).unwrap(), vec![(3, 'c')]);
    }

    #[rstest]
    #[case(true, vec![(1, 'a'), (2, 'b')])]
    #[case(false, vec![(2, 'b'), (1, 'a')])]
    fn test_entry_sequence_becomes_a_batch(
        #[case] ascending: bool,
        #[case] expected: Vec<(i32, char)>,
    ) {
        let tree = PersistentTreeMap::new().assoc(2, 'b').assoc(1, 'a');
        assert_eq!(collect(ConsItem::from_seq(tree.seq(ascending))).unwrap(), expected);

        let empty: PersistentTreeMap<i32, char> = PersistentTreeMap::new();
        assert_eq!(ConsItem::from_seq(empty.seq(ascending)), ConsItem::Entries(Vec::new()));
    }

    #[rstest]
    fn test_from_entries_accepts_owned_pairs() {
        let item = ConsItem::from_entries(vec![(5, 'e'), (4, 'd')]);
        assert_eq!(collect(item).unwrap(), vec![(5, 'e'), (4, 'd')]);
    }
}

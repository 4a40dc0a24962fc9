//! Property-based tests for map equality and hashing.
//!
//! Equality and hashing look only at the set of (key, value) pairs: these
//! laws vary insertion order, concrete map type and window shape and check
//! that neither changes the answer.

use std::collections::{BTreeMap, HashMap};

use proptest::prelude::*;
use submap::persistent::{
    PersistentTreeMap, RangeView, SortedMap, map_equals, map_equiv, map_hash, map_hasheq,
};

fn entries(max_size: usize) -> impl Strategy<Value = Vec<(u8, i64)>> {
    prop::collection::vec((any::<u8>(), any::<i64>()), 0..max_size)
}

fn dedup_last_wins(entries: &[(u8, i64)]) -> Vec<(u8, i64)> {
    let unique: BTreeMap<u8, i64> = entries.iter().copied().collect();
    unique.into_iter().collect()
}

proptest! {
    /// Law: insertion order changes neither equality nor either hash.
    #[test]
    fn prop_insertion_order_is_invisible(entries in entries(48), seed: u64) {
        let unique = dedup_last_wins(&entries);
        let mut shuffled = unique.clone();
        let length = shuffled.len();
        if length > 1 {
            // Deterministic rotation plus reversal stands in for a shuffle.
            let offset = usize::try_from(seed % length as u64).unwrap();
            shuffled.rotate_left(offset);
            shuffled.reverse();
        }

        let left: PersistentTreeMap<u8, i64> = unique.into_iter().collect();
        let right: PersistentTreeMap<u8, i64> = shuffled.into_iter().collect();

        prop_assert_eq!(&left, &right);
        prop_assert!(left.equiv(&right));
        prop_assert_eq!(left.hash_code(), right.hash_code());
        prop_assert_eq!(left.hasheq(), right.hasheq());
    }

    /// Law: equal maps of different concrete types hash equally.
    #[test]
    fn prop_equality_and_hash_across_types(entries in entries(48)) {
        let tree: PersistentTreeMap<u8, i64> = entries.iter().copied().collect();
        let hashed: HashMap<u8, i64> = entries.iter().copied().collect();
        let ordered: BTreeMap<u8, i64> = entries.iter().copied().collect();
        let whole_view: RangeView<u8, i64> = RangeView::new(tree.clone(), None, None).unwrap();

        prop_assert!(map_equals(&tree, &hashed));
        prop_assert!(map_equals(&hashed, &tree));
        prop_assert!(map_equals(&whole_view, &ordered));
        prop_assert!(map_equiv(&tree, &whole_view));
        prop_assert!(map_equiv(&tree, &hashed));

        prop_assert_eq!(tree.hash_code(), map_hash(&hashed));
        prop_assert_eq!(whole_view.hash_code(), map_hash(&ordered));
        prop_assert_eq!(tree.hasheq(), map_hasheq(&hashed));
    }

    /// Law: a window equals the full map built from the same entries.
    #[test]
    fn prop_window_equals_its_promotion(entries in entries(48), start: u8, width: u8) {
        let tree: PersistentTreeMap<u8, i64> = entries.iter().copied().collect();
        let end = start.saturating_add(width);
        let window = tree.sub_map(start, end);
        let copied: PersistentTreeMap<u8, i64> =
            window.iter().map(|(key, value)| (*key, *value)).collect();

        prop_assert_eq!(&window, &copied);
        prop_assert_eq!(window.hash_code(), copied.hash_code());
        if let SortedMap::Range(view) = &window {
            prop_assert_eq!(view.count(), copied.len());
        }
    }

    /// Law: the cached hash never changes and matches a fresh computation.
    #[test]
    fn prop_hash_code_is_idempotent(entries in entries(48)) {
        let tree: PersistentTreeMap<u8, i64> = entries.into_iter().collect();
        let first = tree.hash_code();
        prop_assert_eq!(tree.hash_code(), first);
        prop_assert_eq!(tree.clone().hash_code(), first);
        prop_assert_eq!(map_hash(&tree), first);
    }

    /// Law: a value change is visible to equality.
    #[test]
    fn prop_value_change_breaks_equality(entries in entries(48), key: u8, value: i64) {
        let tree: PersistentTreeMap<u8, i64> = entries.into_iter().collect();
        let updated = tree.assoc(key, value);
        let unchanged = tree.get(&key) == Some(&value);
        prop_assert_eq!(updated == tree, unchanged);
    }
}

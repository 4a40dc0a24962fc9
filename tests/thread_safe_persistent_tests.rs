//! Integration tests for sharing maps, views and sequences across threads.
//!
//! With the `arc` feature every structure is `Send + Sync`, so a map, a
//! window over it, or a half-walked sequence can be handed to other threads
//! while the original keeps being used.

#![cfg(feature = "arc")]

use rstest::rstest;
use std::sync::{Arc, Barrier};
use std::thread;
use submap::persistent::{PersistentTreeMap, RangeView, Seq, SortedMap, map_hash};

fn numbers() -> PersistentTreeMap<u32, String> {
    (0..1_000).map(|key| (key, key.to_string())).collect()
}

// =============================================================================
// Structural Sharing Across Threads
// =============================================================================

#[rstest]
fn test_treemap_cross_thread_versions() {
    let original = Arc::new(numbers());

    let handles: Vec<_> = (0..4u32)
        .map(|index| {
            let map = Arc::clone(&original);
            thread::spawn(move || {
                let updated = map.assoc(index, format!("thread-{index}"));
                assert_eq!(updated.get(&index), Some(&format!("thread-{index}")));
                assert_eq!(map.get(&index), Some(&index.to_string()));
                updated
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect();

    for (index, map) in (0u32..).zip(&results) {
        assert_eq!(map.get(&index), Some(&format!("thread-{index}")));
        assert_eq!(map.len(), 1_000);
    }
    assert_eq!(original.get(&0), Some(&"0".to_string()));
}

#[rstest]
fn test_views_are_shared_across_threads() {
    let map = numbers();
    let SortedMap::Range(view) = map.sub_map(100, 200) else {
        panic!("expected a range view");
    };
    let view = Arc::new(view);

    let handles: Vec<_> = (0..4u32)
        .map(|index| {
            let view = Arc::clone(&view);
            thread::spawn(move || {
                let seek = 100 + index * 25;
                let walked = view
                    .seq_from(&seek, true)
                    .map(|seq| seq.count())
                    .unwrap_or_default();
                assert_eq!(walked, usize::try_from(200 - seek).unwrap());
                view.count()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("Thread panicked"), 100);
    }
}

#[rstest]
fn test_half_walked_sequence_moves_to_another_thread() {
    let map = numbers();
    let mut seq = map.seq(true).unwrap();
    for _ in 0..500 {
        seq = seq.next().unwrap();
    }
    drop(map);

    let remaining = thread::spawn(move || {
        let first = *seq.first().key();
        (first, seq.count())
    })
    .join()
    .expect("Thread panicked");

    assert_eq!(remaining, (500, 500));
}

// =============================================================================
// Hash Cache Races
// =============================================================================

#[rstest]
fn test_concurrent_first_hash_code_agrees() {
    const THREADS: usize = 8;
    let map = Arc::new(numbers());
    let view = Arc::new(RangeView::new((*map).clone(), Some(10), Some(900)).unwrap());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let map = Arc::clone(&map);
            let view = Arc::clone(&view);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (map.hash_code(), view.hash_code())
            })
        })
        .collect();

    let hashes: Vec<(i32, i32)> = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect();

    let expected = (map_hash(&*map), map_hash(&*view));
    assert!(hashes.iter().all(|hashes| *hashes == expected));
    assert_eq!(map.hash_code(), expected.0);
}

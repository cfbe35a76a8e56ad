// Copyright (c) 2025 Prefix Gate Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Integration tests for the concurrent trie.
//! Exercises the trie from many threads at once through the public API.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use prefix_gate_lib::data_structures::concurrent_trie::{ConcurrentTrie, TrieError};

const THREAD_COUNT: usize = 8;

#[test]
fn test_same_key_race() {
    const PUTS_PER_THREAD: usize = 100;

    let trie = Arc::new(ConcurrentTrie::new());
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let trie = Arc::clone(&trie);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..PUTS_PER_THREAD)
                    .map(|i| {
                        trie.put("com.acme.shared", thread_id * PUTS_PER_THREAD + i)
                            .unwrap()
                            .map(|previous| *previous)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let previous: Vec<Option<usize>> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();

    let final_value = *trie.get("com.acme.shared").unwrap();
    assert!(final_value < THREAD_COUNT * PUTS_PER_THREAD);

    // The swaps form a single chain: exactly one put saw an empty slot, and
    // every value except the surviving one was handed back exactly once.
    assert_eq!(previous.iter().filter(|p| p.is_none()).count(), 1);
    let mut seen: HashSet<usize> = HashSet::new();
    for value in previous.into_iter().flatten() {
        assert!(seen.insert(value), "value {value} returned twice");
    }
    assert!(seen.insert(final_value));
    assert_eq!(seen.len(), THREAD_COUNT * PUTS_PER_THREAD);

    // Exactly one node path exists for the key.
    assert_eq!(trie.len(), 1);
    let mut node = Arc::clone(trie.root());
    for _ in "com.acme.shared".chars() {
        assert_eq!(node.child_count(), 1);
        node = node.first_child().unwrap();
    }
    assert_eq!(node.key(), "com.acme.shared");
    assert_eq!(node.child_count(), 0);
}

#[test]
fn test_overlapping_keys_from_many_threads() {
    let trie = Arc::new(ConcurrentTrie::new());
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let packages = ["java.", "java.util.", "java.util.concurrent.", "javax.", "jdk."];

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let trie = Arc::clone(&trie);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for (i, package) in packages.iter().enumerate() {
                    trie.put(package, i).unwrap();
                    trie.put(&format!("{package}Class{thread_id}"), i).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(trie.len(), packages.len() * (THREAD_COUNT + 1));
    assert_eq!(
        trie.get_longest_prefix_value("java.util.concurrent.Executor").as_deref(),
        Some(&2)
    );
    assert_eq!(trie.get_longest_prefix_value("javax.net.Socket").as_deref(), Some(&3));

    // Iteration order stays lexicographic after concurrent construction.
    let keys: Vec<String> = trie.keys().collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn test_iteration_while_mutating() {
    let trie = Arc::new(ConcurrentTrie::new());
    let stable: Vec<String> = (0..200).map(|i| format!("stable.{i:03}")).collect();
    for key in &stable {
        trie.put(key, 0_usize).unwrap();
    }

    let done = Arc::new(AtomicBool::new(false));
    let writers: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let trie = Arc::clone(&trie);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut i = 0;
                while !done.load(Ordering::Relaxed) {
                    let key = format!("volatile.{thread_id}.{i}");
                    trie.put(&key, i).unwrap();
                    trie.remove(&key);
                    trie.put(&format!("stable.{:03}", i % 200), i + 1).unwrap();
                    i += 1;
                }
            })
        })
        .collect();

    for _ in 0..20 {
        let seen: HashSet<String> = trie
            .iter()
            .map(|entry| entry.key().to_string())
            .filter(|key| key.starts_with("stable."))
            .collect();
        // Stable keys never lose their value, so none may be skipped.
        for key in &stable {
            assert!(seen.contains(key), "missing {key}");
        }
    }

    done.store(true, Ordering::Relaxed);
    for writer in writers {
        writer.join().unwrap();
    }
}

#[test]
fn test_iterator_remove_with_concurrent_readers() {
    let trie = Arc::new(ConcurrentTrie::new());
    for i in 0..100 {
        trie.put(&format!("k{i:02}"), i).unwrap();
    }

    let reader = {
        let trie = Arc::clone(&trie);
        thread::spawn(move || {
            for _ in 0..50 {
                for i in 0..100 {
                    if let Some(value) = trie.get(&format!("k{i:02}")) {
                        assert_eq!(*value, i);
                    }
                }
            }
        })
    };

    let mut iter = trie.iter();
    assert_eq!(
        iter.remove(),
        Err(TrieError::IllegalState(
            "remove() requires a preceding next() that has not been removed"
        ))
    );
    let mut removed = 0;
    while let Some(entry) = iter.next() {
        if entry.key().ends_with('0') {
            assert!(iter.remove().unwrap().is_some());
            assert!(iter.remove().is_err());
            removed += 1;
        }
    }
    reader.join().unwrap();

    assert_eq!(removed, 10);
    assert_eq!(trie.len(), 90);
}

#[test]
fn test_empty_key_is_root() {
    let trie = ConcurrentTrie::new();
    trie.put("", "everything").unwrap();
    assert_eq!(trie.get("").as_deref(), Some(&"everything"));
    assert_eq!(trie.root().child_count(), 0);
    assert_eq!(
        trie.get_longest_prefix_value("anything").as_deref(),
        Some(&"everything")
    );
}

#[test]
fn test_deep_trie_drops_on_small_stack() {
    let handle = thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let trie = ConcurrentTrie::new();
            let key = "a".repeat(200_000);
            trie.put(&key, 1_u8).unwrap();
            trie.put(&key[..100_000], 2).unwrap();

            assert_eq!(trie.get(&key).as_deref(), Some(&1));
            assert_eq!(
                trie.get_longest_prefix_value(&key[..150_000]).as_deref(),
                Some(&2)
            );
            assert_eq!(trie.len(), 2);
            drop(trie);
        })
        .unwrap();
    handle.join().unwrap();
}

// Copyright (c) 2025 Prefix Gate Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Depth-first preorder iteration over a concurrent trie.
//!
//! The iterator walks the live tree: it visits a node, then its children in
//! ascending character order, climbing back through parents once a subtree is
//! exhausted. Only nodes holding a value when they are reached are yielded.
//!
//! Because nodes are never removed, a node that is valued when the walk starts
//! and still valued when the cursor reaches it is always yielded. Values
//! written or cleared by other threads during the walk may or may not be seen.
//!
//! All cursor-moving methods take `&mut self`, so a single iterator can only
//! be driven by one thread at a time, while other threads keep mutating the
//! trie freely.

use std::iter::FusedIterator;
use std::mem;
use std::sync::Arc;

use super::entry::Entry;
use super::error::{TrieError, TrieResult};
use super::node::Node;

enum Cursor<V> {
    /// Nothing visited yet; the root comes first.
    Start,
    /// The last node the walk landed on.
    At(Arc<Node<V>>),
    /// Traversal complete.
    Done,
}

/// Preorder iterator over the valued nodes of a trie.
pub struct Iter<V> {
    /// Keeps the whole tree alive for the duration of the walk.
    root: Arc<Node<V>>,
    cursor: Cursor<V>,
    /// Valued node found by `has_next` and not yet returned.
    pending: Option<Arc<Node<V>>>,
    /// Node returned by the last `next`, eligible for `remove`.
    last_returned: Option<Arc<Node<V>>>,
}

impl<V> Iter<V> {
    pub(crate) fn new(root: Arc<Node<V>>) -> Self {
        Self {
            root,
            cursor: Cursor::Start,
            pending: None,
            last_returned: None,
        }
    }

    /// Returns `true` if another valued node remains.
    ///
    /// The node found is remembered, so a following `next` yields it even if
    /// the walk would otherwise have moved on.
    pub fn has_next(&mut self) -> bool {
        if self.pending.is_none() {
            while let Some(node) = self.step() {
                if node.has_value() {
                    self.pending = Some(node);
                    break;
                }
            }
        }
        self.pending.is_some()
    }

    /// Clears the value of the entry most recently returned by `next`.
    ///
    /// Returns the value that was cleared (`None` if another thread emptied
    /// the slot first). Fails with [`TrieError::IllegalState`] when `next`
    /// has not returned an entry since the last `remove`.
    pub fn remove(&mut self) -> TrieResult<Option<Arc<V>>> {
        let node = self.last_returned.take().ok_or(TrieError::IllegalState(
            "remove() requires a preceding next() that has not been removed",
        ))?;
        Ok(node.clear_value())
    }

    /// Moves the cursor to the next node in preorder, valued or not.
    fn step(&mut self) -> Option<Arc<Node<V>>> {
        let next = match mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Start => Some(Arc::clone(&self.root)),
            Cursor::At(node) => successor(&node),
            Cursor::Done => None,
        };
        if let Some(node) = &next {
            self.cursor = Cursor::At(Arc::clone(node));
        }
        next
    }
}

/// The preorder successor of `node`: its first child, else the next sibling
/// of the closest ancestor (inclusive) that has one.
fn successor<V>(node: &Arc<Node<V>>) -> Option<Arc<Node<V>>> {
    if let Some(child) = node.first_child() {
        return Some(child);
    }

    let mut current = Arc::clone(node);
    loop {
        if let Some(sibling) = current.next_sibling() {
            return Some(sibling);
        }
        current = current.parent()?;
    }
}

impl<V> Iterator for Iter<V> {
    type Item = Entry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        let node = self.pending.take()?;
        self.last_returned = Some(Arc::clone(&node));
        Some(Entry::new(node))
    }
}

impl<V> FusedIterator for Iter<V> {}

#[cfg(test)]
mod tests {
    use crate::data_structures::concurrent_trie::{ConcurrentTrie, TrieError};

    fn sample() -> ConcurrentTrie<u32> {
        [("b", 3), ("ab", 2), ("a", 1), ("abd", 4), ("c", 5)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_preorder_sequence() {
        let trie = sample();
        let keys: Vec<String> = trie.iter().map(|e| e.key().to_string()).collect();
        assert_eq!(keys, ["a", "ab", "abd", "b", "c"]);
    }

    #[test]
    fn test_skips_valueless_nodes() {
        let trie: ConcurrentTrie<u32> = ConcurrentTrie::new();
        trie.put("abcd", 1).unwrap();
        trie.put("abxy", 2).unwrap();

        let keys: Vec<String> = trie.iter().map(|e| e.key().to_string()).collect();
        assert_eq!(keys, ["abcd", "abxy"]);
    }

    #[test]
    fn test_includes_root_value_first() {
        let trie = sample();
        trie.put("", 0).unwrap();
        let first = trie.iter().next().unwrap();
        assert_eq!(first.key(), "");
        assert_eq!(first.value().as_deref(), Some(&0));
    }

    #[test]
    fn test_has_next_is_idempotent() {
        let trie = sample();
        let mut iter = trie.iter();
        assert!(iter.has_next());
        assert!(iter.has_next());
        assert_eq!(iter.next().unwrap().key(), "a");
    }

    #[test]
    fn test_exhaustion_is_fused() {
        let trie: ConcurrentTrie<u32> = ConcurrentTrie::new();
        trie.put("x", 1).unwrap();

        let mut iter = trie.iter();
        assert!(iter.next().is_some());
        assert!(!iter.has_next());
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_remove_clears_last_returned() {
        let trie = sample();
        let mut iter = trie.iter();
        let first = iter.next().unwrap();
        assert_eq!(first.key(), "a");
        assert_eq!(iter.remove().unwrap().as_deref(), Some(&1));

        // Iteration continues where it left off.
        assert_eq!(iter.next().unwrap().key(), "ab");
        assert_eq!(trie.get("a"), None);
        assert_eq!(trie.get("ab").as_deref(), Some(&2));
    }

    #[test]
    fn test_remove_misuse() {
        let trie = sample();
        let mut iter = trie.iter();
        assert!(matches!(iter.remove(), Err(TrieError::IllegalState(_))));

        iter.next().unwrap();
        assert!(iter.remove().is_ok());
        assert!(matches!(iter.remove(), Err(TrieError::IllegalState(_))));

        // The cursor is unaffected by the failed calls.
        assert_eq!(iter.next().unwrap().key(), "ab");
    }

    #[test]
    fn test_remove_after_has_next_targets_returned_entry() {
        let trie = sample();
        let mut iter = trie.iter();
        iter.next().unwrap();
        assert!(iter.has_next());
        iter.remove().unwrap();

        assert_eq!(trie.get("a"), None);
        assert_eq!(trie.get("ab").as_deref(), Some(&2));
    }
}

// Copyright (c) 2025 Prefix Gate Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Node implementation for the concurrent trie.
//!
//! Every node represents one character position along some key. The root sits
//! at depth 0 and stands for the empty key; every other node is a child node
//! that remembers the string it was created from, so it can recover both its
//! own character and the key leading to it without walking back to the root.
//!
//! Each node synchronizes independently:
//!
//! * the value slot is an [`ArcSwapOption`], so loads and swaps are atomic and
//!   readers never see a partially written value;
//! * the children map is a `BTreeMap` behind a per-node [`RwLock`], which keeps
//!   siblings ordered by character and makes create-if-absent atomic.
//!
//! Parent links are [`Weak`]; ownership only flows from parent to child.

use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use parking_lot::RwLock;
use tracing::trace;

use super::entry::Entry;

/// Where a child node came from.
struct Origin<V> {
    /// Non-owning link back to the parent.
    parent: Weak<Node<V>>,

    /// The key that caused this node to be created.
    superstring: Arc<str>,

    /// The character at this node's depth in `superstring`.
    character: char,

    /// Byte offset in `superstring` just past `character`.
    end: usize,
}

/// A node in the concurrent trie.
///
/// Nodes are created lazily while storing keys and are never removed from the
/// tree; clearing a value only empties the slot.
pub struct Node<V> {
    depth: usize,
    origin: Option<Origin<V>>,
    value: ArcSwapOption<V>,
    children: RwLock<BTreeMap<char, Arc<Node<V>>>>,
}

impl<V> Node<V> {
    /// Creates a root node: depth 0, no parent, empty key.
    pub fn root() -> Self {
        Self {
            depth: 0,
            origin: None,
            value: ArcSwapOption::empty(),
            children: RwLock::new(BTreeMap::new()),
        }
    }

    fn child(parent: &Arc<Self>, superstring: &Arc<str>, character: char, end: usize) -> Self {
        Self {
            depth: parent.depth + 1,
            origin: Some(Origin {
                parent: Arc::downgrade(parent),
                superstring: Arc::clone(superstring),
                character,
                end,
            }),
            value: ArcSwapOption::empty(),
            children: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of characters between the root and this node.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `true` for the root node.
    pub fn is_root(&self) -> bool {
        self.origin.is_none()
    }

    /// The character this node stands for, or `None` for the root.
    pub fn character(&self) -> Option<char> {
        self.origin.as_ref().map(|origin| origin.character)
    }

    /// The key leading from the root to this node.
    pub fn key(&self) -> &str {
        match &self.origin {
            Some(origin) => &origin.superstring[..origin.end],
            None => "",
        }
    }

    /// Byte length of [`Node::key`], which is also where the next character
    /// starts in any key passing through this node.
    fn key_end(&self) -> usize {
        self.origin.as_ref().map_or(0, |origin| origin.end)
    }

    /// The character following this node's position in `key`, if any.
    fn next_character(&self, key: &str) -> Option<char> {
        key.get(self.key_end()..)?.chars().next()
    }

    /// Returns the parent node, or `None` for the root.
    pub fn parent(&self) -> Option<Arc<Self>> {
        self.origin.as_ref()?.parent.upgrade()
    }

    /// Looks up the child for the character at this node's depth in `key`,
    /// creating it if it does not exist yet.
    ///
    /// `key` must pass through this node. Returns `None` when `key` has no
    /// character at this depth. When several threads race to create the same
    /// child, exactly one node is inserted and all of them get that node.
    pub fn get_or_create_child_node(self: &Arc<Self>, key: &Arc<str>) -> Option<Arc<Self>> {
        let character = self.next_character(key)?;

        if let Some(child) = self.children.read().get(&character) {
            return Some(Arc::clone(child));
        }

        let mut children = self.children.write();
        let child = children.entry(character).or_insert_with(|| {
            trace!(depth = self.depth + 1, %character, "creating trie node");
            Arc::new(Self::child(
                self,
                key,
                character,
                self.key_end() + character.len_utf8(),
            ))
        });
        Some(Arc::clone(child))
    }

    /// Looks up the child for the character at this node's depth in `key`
    /// without creating anything.
    pub fn get_child_node(&self, key: &str) -> Option<Arc<Self>> {
        let character = self.next_character(key)?;
        self.children.read().get(&character).cloned()
    }

    /// The child with the smallest character, if any.
    pub fn first_child(&self) -> Option<Arc<Self>> {
        self.children.read().values().next().cloned()
    }

    /// The sibling with the next-higher character under the same parent.
    ///
    /// Always `None` for the root.
    pub fn next_sibling(&self) -> Option<Arc<Self>> {
        let origin = self.origin.as_ref()?;
        let parent = origin.parent.upgrade()?;
        let siblings = parent.children.read();
        let next = siblings
            .range((Excluded(origin.character), Unbounded))
            .next()
            .map(|(_, sibling)| Arc::clone(sibling));
        next
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.read().len()
    }

    /// Atomically loads the current value.
    pub fn value(&self) -> Option<Arc<V>> {
        self.value.load_full()
    }

    /// Returns `true` if the value slot is occupied.
    pub fn has_value(&self) -> bool {
        self.value.load().is_some()
    }

    /// Atomically replaces the value slot, returning what was there.
    pub fn swap_value(&self, value: Option<Arc<V>>) -> Option<Arc<V>> {
        self.value.swap(value)
    }

    /// Stores `value`, returning the previous value.
    pub fn set_value(&self, value: V) -> Option<Arc<V>> {
        self.swap_value(Some(Arc::new(value)))
    }

    /// Empties the value slot, returning the previous value.
    pub fn clear_value(&self) -> Option<Arc<V>> {
        self.swap_value(None)
    }

    /// A live entry for this node, or `None` if it holds no value.
    pub fn entry(self: &Arc<Self>) -> Option<Entry<V>> {
        if self.has_value() {
            Some(Entry::new(Arc::clone(self)))
        } else {
            None
        }
    }
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Self::root()
    }
}

/// Tears the subtree down with an explicit work list, so stack use does not
/// grow with key length.
impl<V> Drop for Node<V> {
    fn drop(&mut self) {
        let mut pending: Vec<Arc<Self>> =
            mem::take(self.children.get_mut()).into_values().collect();
        while let Some(child) = pending.pop() {
            // Subtrees still referenced elsewhere (entries, iterators) stay alive.
            if let Some(mut child) = Arc::into_inner(child) {
                pending.extend(mem::take(child.children.get_mut()).into_values());
            }
        }
    }
}

impl<V> fmt::Debug for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("depth", &self.depth)
            .field("key", &self.key())
            .field("has_value", &self.has_value())
            .field("children", &self.child_count())
            .finish()
    }
}

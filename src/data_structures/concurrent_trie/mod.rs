// Copyright (c) 2025 Prefix Gate Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Concurrent longest-prefix trie.
//!
//! A string-keyed map whose keys share storage along common prefixes, with
//! an extra query: given a string, find the value stored under the longest
//! key that is a prefix of it. This is what resolves the most specific rule
//! for a fully-qualified class name in the serialization filter.
//!
//! # Concurrency
//!
//! Every operation may be called from any thread without external locking.
//! There is no trie-wide lock: each node guards its own children map and
//! holds its value in an atomic slot. Nodes are never removed, so readers
//! and iterators can walk the tree while writers add to it.
//!
//! Removing a key clears its value but keeps the path nodes. A workload that
//! stores and removes many distinct short-lived keys therefore grows without
//! bound.
//!
//! # Example
//!
//! ```
//! use prefix_gate_lib::data_structures::concurrent_trie::ConcurrentTrie;
//!
//! let trie = ConcurrentTrie::new();
//! trie.put("java.", "platform").unwrap();
//! trie.put("java.util.", "collections").unwrap();
//!
//! let best = trie.get_longest_prefix_value("java.util.HashMap");
//! assert_eq!(best.as_deref(), Some(&"collections"));
//! assert_eq!(trie.get("java.util.HashMap"), None);
//! ```

mod entry;
mod error;
mod iter;
mod node;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use entry::Entry;
pub use error::{TrieError, TrieResult};
pub use iter::Iter;
pub use node::Node;

/// Configuration options for the concurrent trie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrentTrieConfig {
    /// Maximum key length in characters; `None` means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_key_length: Option<usize>,
}

impl ConcurrentTrieConfig {
    /// Creates a configuration without a key length limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits keys accepted by `put` to `max_key_length` characters.
    pub fn with_max_key_length(mut self, max_key_length: usize) -> Self {
        self.max_key_length = Some(max_key_length);
        self
    }
}

/// A thread-safe map from strings to values with longest-prefix lookup.
///
/// Values are stored behind `Arc` so readers can hold on to a value while
/// other threads replace it.
pub struct ConcurrentTrie<V> {
    /// The root node, standing for the empty key.
    root: Arc<Node<V>>,

    /// Configuration options
    config: ConcurrentTrieConfig,
}

impl<V> ConcurrentTrie<V> {
    /// Creates a new empty trie with default configuration.
    pub fn new() -> Self {
        Self::with_config(ConcurrentTrieConfig::default())
    }

    /// Creates a new empty trie with the specified configuration.
    pub fn with_config(config: ConcurrentTrieConfig) -> Self {
        Self {
            root: Arc::new(Node::root()),
            config,
        }
    }

    /// Returns the configuration this trie was built with.
    pub fn config(&self) -> &ConcurrentTrieConfig {
        &self.config
    }

    /// Returns the root node.
    pub fn root(&self) -> &Arc<Node<V>> {
        &self.root
    }

    /// Associates `value` with `key`, returning the previous value.
    ///
    /// The empty key is stored on the root itself.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::KeyTooLong`] if the key exceeds the configured
    /// maximum length. Nothing is created in that case.
    pub fn put(&self, key: &str, value: V) -> TrieResult<Option<Arc<V>>> {
        if let Some(max_length) = self.config.max_key_length {
            let length = key.chars().count();
            if length > max_length {
                return Err(TrieError::KeyTooLong { length, max_length });
            }
        }
        Ok(self.store(key, value))
    }

    fn store(&self, key: &str, value: V) -> Option<Arc<V>> {
        self.get_or_create_node(key).set_value(value)
    }

    fn get_or_create_node(&self, key: &str) -> Arc<Node<V>> {
        let mut node = Arc::clone(&self.root);
        if key.is_empty() {
            return node;
        }

        let key: Arc<str> = Arc::from(key);
        while let Some(child) = node.get_or_create_child_node(&key) {
            node = child;
        }
        node
    }

    /// Finds the node for exactly `key` without creating anything.
    fn find_node(&self, key: &str) -> Option<Arc<Node<V>>> {
        let mut node = Arc::clone(&self.root);
        for _ in key.chars() {
            node = node.get_child_node(key)?;
        }
        Some(node)
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.find_node(key)?.value()
    }

    /// Returns the live entry stored under `key`.
    pub fn get_entry(&self, key: &str) -> Option<Entry<V>> {
        self.find_node(key)?.entry()
    }

    /// Returns `true` if a value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.find_node(key).is_some_and(|node| node.has_value())
    }

    /// Clears the value stored under `key`, returning it.
    ///
    /// The node itself stays in the tree.
    pub fn remove(&self, key: &str) -> Option<Arc<V>> {
        self.find_node(key)?.clear_value()
    }

    /// Walks along `key` and collects the nodes that held a value when
    /// visited, shallowest first. The root always leads, valued or not.
    fn valued_prefix_nodes(&self, key: &str) -> Vec<Arc<Node<V>>> {
        let mut valued = vec![Arc::clone(&self.root)];

        let mut node = Arc::clone(&self.root);
        for _ in key.chars() {
            node = match node.get_child_node(key) {
                Some(child) => child,
                None => break,
            };
            if node.has_value() {
                valued.push(Arc::clone(&node));
            }
        }
        valued
    }

    /// Returns the value stored under the longest key that is a prefix of
    /// `key` (including `key` itself).
    ///
    /// If no such key holds a value, this is whatever the root holds, which
    /// may be nothing. A prefix cleared by another thread during the lookup
    /// is passed over in favour of the next shorter one.
    pub fn get_longest_prefix_value(&self, key: &str) -> Option<Arc<V>> {
        self.valued_prefix_nodes(key)
            .iter()
            .rev()
            .find_map(|node| node.value())
    }

    /// Entry counterpart of [`ConcurrentTrie::get_longest_prefix_value`].
    pub fn get_longest_prefix_entry(&self, key: &str) -> Option<Entry<V>> {
        deepest_entry(&self.valued_prefix_nodes(key))
    }

    /// Lookup through a type-erased key. Keys that are not strings are absent.
    pub fn get_dyn(&self, key: &dyn Any) -> Option<Arc<V>> {
        self.get(downcast_key(key)?)
    }

    /// Type-erased counterpart of [`ConcurrentTrie::contains_key`].
    pub fn contains_key_dyn(&self, key: &dyn Any) -> bool {
        downcast_key(key).is_some_and(|key| self.contains_key(key))
    }

    /// Type-erased counterpart of [`ConcurrentTrie::remove`].
    pub fn remove_dyn(&self, key: &dyn Any) -> Option<Arc<V>> {
        self.remove(downcast_key(key)?)
    }

    /// Returns a preorder iterator over the entries holding values.
    pub fn iter(&self) -> Iter<V> {
        Iter::new(Arc::clone(&self.root))
    }

    /// Collects the entries currently holding values, in preorder.
    pub fn entry_set(&self) -> Vec<Entry<V>> {
        self.iter().collect()
    }

    /// Keys currently holding values, in preorder.
    pub fn keys(&self) -> impl Iterator<Item = String> {
        self.iter().map(|entry| entry.key().to_owned())
    }

    /// Values currently stored, in key preorder.
    pub fn values(&self) -> impl Iterator<Item = Arc<V>> {
        self.iter().filter_map(|entry| entry.value())
    }

    /// Number of keys holding values. This walks the whole tree.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if no node currently holds a value.
    pub fn is_empty(&self) -> bool {
        !self.iter().has_next()
    }

    /// Clears every value, returning how many were cleared.
    ///
    /// The tree structure is kept.
    pub fn clear(&self) -> usize {
        let mut iter = self.iter();
        let mut cleared = 0;
        while iter.next().is_some() {
            if let Ok(Some(_)) = iter.remove() {
                cleared += 1;
            }
        }
        cleared
    }
}

/// The entry of the deepest node in `nodes` that still holds a value.
fn deepest_entry<V>(nodes: &[Arc<Node<V>>]) -> Option<Entry<V>> {
    nodes.iter().rev().find_map(|node| node.entry())
}

fn downcast_key(key: &dyn Any) -> Option<&str> {
    if let Some(key) = key.downcast_ref::<String>() {
        return Some(key.as_str());
    }
    if let Some(key) = key.downcast_ref::<&'static str>() {
        return Some(*key);
    }
    key.downcast_ref::<Box<str>>().map(|key| &**key)
}

impl<V> Default for ConcurrentTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ConcurrentTrie<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentTrie")
            .field("config", &self.config)
            .field("len", &self.len())
            .finish()
    }
}

impl<'a, V> IntoIterator for &'a ConcurrentTrie<V> {
    type Item = Entry<V>;
    type IntoIter = Iter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: AsRef<str>, V> FromIterator<(K, V)> for ConcurrentTrie<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let trie = Self::new();
        for (key, value) in iter {
            trie.store(key.as_ref(), value);
        }
        trie
    }
}

impl<K: AsRef<str>, V> Extend<(K, V)> for ConcurrentTrie<V> {
    /// Stores every pair. Keys over the configured length limit are skipped.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            if let Err(e) = self.put(key.as_ref(), value) {
                warn!(key = key.as_ref(), error = %e, "skipping key while extending trie");
            }
        }
    }
}

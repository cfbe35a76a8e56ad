//! Live key/value view over a trie node.

use std::fmt;
use std::sync::Arc;

use super::node::Node;

/// A key/value pair backed by a trie node.
///
/// The entry is a view, not a snapshot: [`Entry::value`] reads the node's
/// current value and [`Entry::set_value`] writes straight through to it.
pub struct Entry<V> {
    node: Arc<Node<V>>,
}

impl<V> Entry<V> {
    pub(crate) fn new(node: Arc<Node<V>>) -> Self {
        Self { node }
    }

    /// The full key of this entry.
    pub fn key(&self) -> &str {
        self.node.key()
    }

    /// The node's current value. `None` if it was cleared after this entry
    /// was handed out.
    pub fn value(&self) -> Option<Arc<V>> {
        self.node.value()
    }

    /// Replaces the node's value, returning the previous one.
    pub fn set_value(&self, value: V) -> Option<Arc<V>> {
        self.node.set_value(value)
    }

    /// The node backing this entry.
    pub fn node(&self) -> &Arc<Node<V>> {
        &self.node
    }
}

impl<V> Clone for Entry<V> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<V: PartialEq> PartialEq for Entry<V> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key() && self.value() == other.value()
    }
}

impl<V: fmt::Debug> fmt::Debug for Entry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key())
            .field("value", &self.value())
            .finish()
    }
}

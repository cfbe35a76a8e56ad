//! Data structures for Prefix Gate.
//!
//! This module contains specialized data structures optimized for
//! concurrent access without a structure-wide lock.

pub mod concurrent_trie;

// Re-export common data structures
pub use concurrent_trie::{ConcurrentTrie, ConcurrentTrieConfig, TrieError, TrieResult};

//! Error types for the class-name serialization filter.

use crate::data_structures::concurrent_trie::TrieError;

/// Errors that can occur while building or updating a class filter.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum FilterError {
    /// The rule pattern is not a class name or package wildcard.
    #[error("Invalid filter pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The rule could not be stored.
    #[error("Trie error: {0}")]
    Trie(#[from] TrieError),
}

/// Result type for class filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

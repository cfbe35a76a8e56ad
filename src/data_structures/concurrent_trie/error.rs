// Copyright (c) 2025 Prefix Gate Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Error types for the concurrent trie.

/// Errors that can occur in concurrent trie operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum TrieError {
    /// The key is longer than the configured maximum.
    #[error("Key of {length} characters exceeds maximum key length of {max_length}")]
    KeyTooLong {
        /// Length of the rejected key, in characters.
        length: usize,
        /// The configured maximum.
        max_length: usize,
    },

    /// An operation was called when the receiver was not in a state to accept it.
    #[error("Illegal state: {0}")]
    IllegalState(&'static str),
}

/// Result type for concurrent trie operations.
pub type TrieResult<T> = Result<T, TrieError>;

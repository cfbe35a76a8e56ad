//! Prefix Gate Library
//!
//! This library contains a concurrent longest-prefix trie and the
//! class-name serialization filter built on top of it, together with the
//! configuration and error handling shared by the `prefix_gate` binary.
//!
//! # Architecture
//!
//! - [`data_structures::concurrent_trie`]: the trie, with per-node locking and
//!   atomic value slots instead of a structure-wide lock
//! - [`serial_filter`]: allow/deny decisions for fully-qualified class names
//! - [`config`]: layered file and environment configuration
//! - [`error`]: error types and tracing-based error reporting

pub mod config;
pub mod data_structures;
pub mod error;
pub mod serial_filter;

// Internal modules that are not part of the public API
#[cfg(test)]
pub(crate) mod tests;

/// Version information for Prefix Gate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Test modules for Prefix Gate.
//!
//! This module contains the crate-internal test suites:
//! - Unit tests for configuration and error handling
//! - Property-based tests for the concurrent trie using proptest
//! - Table-driven tests for the class filter using test-case
//! - Test fixtures and utilities

pub mod test_utils;

// Re-export commonly used testing tools to simplify imports in test modules
pub use test_utils::{class_name_strategy, create_test_dir, key_strategy, TestFixture};

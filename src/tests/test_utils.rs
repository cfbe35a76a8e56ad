//! Test utilities and fixtures for Prefix Gate.
//!
//! This module provides reusable strategies for property-based testing and a
//! fixture for tests that need configuration files or environment variables.

use proptest::prelude::*;
use proptest::strategy::{BoxedStrategy, Strategy};
use tempfile::TempDir;

/// Create a temporary directory for test files.
pub fn create_test_dir() -> std::io::Result<TempDir> {
    tempfile::tempdir()
}

/// Generate keys over a small alphabet so that generated sets share
/// prefixes, including the empty key.
///
/// # Parameters
///
/// * `max_length` - The maximum length of the generated keys.
pub fn key_strategy(max_length: usize) -> BoxedStrategy<String> {
    proptest::collection::vec(prop::sample::select(vec!['a', 'b', 'c', 'é']), 0..=max_length)
        .prop_map(|chars| chars.into_iter().collect::<String>())
        .boxed()
}

/// Generate fully-qualified class names such as `abc.de.Widget`.
pub fn class_name_strategy() -> BoxedStrategy<String> {
    r"[a-c]{1,3}(\.[a-c]{1,3}){0,2}\.[A-C][a-c]{0,3}".boxed()
}

/// Test fixture for tests that read configuration from disk and the
/// environment.
pub struct TestFixture {
    /// Temporary directory for test files
    pub temp_dir: TempDir,
    /// Vector of environment variables to cleanup after tests
    env_vars: Vec<String>,
}

impl TestFixture {
    /// Create a new test fixture.
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = create_test_dir()?;
        Ok(Self {
            temp_dir,
            env_vars: Vec::new(),
        })
    }

    /// Set an environment variable for this test.
    ///
    /// The variable will be cleaned up when the fixture is dropped.
    pub fn set_env<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key_str = key.into();
        std::env::set_var(&key_str, value.into());
        self.env_vars.push(key_str);
    }

    /// Write `contents` to `name` inside the fixture directory.
    pub fn create_file<C: AsRef<[u8]>>(
        &self,
        name: &str,
        contents: C,
    ) -> std::io::Result<std::path::PathBuf> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

impl Drop for TestFixture {
    fn drop(&mut self) {
        // Clean up any environment variables we set
        for key in &self.env_vars {
            std::env::remove_var(key);
        }
    }
}

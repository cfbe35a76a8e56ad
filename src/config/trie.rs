//! Trie configuration validation.

use super::{ConfigResult, Validate};
use crate::data_structures::concurrent_trie::ConcurrentTrieConfig;
use crate::error::config::ConfigError;

impl Validate for ConcurrentTrieConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_key_length == Some(0) {
            return Err(ConfigError::ValidationError(
                "max_key_length must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

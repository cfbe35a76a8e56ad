//! Class filter configuration module.
//!
//! Rules are listed in order; a later rule for the same pattern replaces an
//! earlier one.

use serde::{Deserialize, Serialize};

use super::{ConfigResult, Validate};
use crate::error::config::ConfigError;
use crate::serial_filter::{FilterMode, Rule, Verdict};

/// Class filter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// How denials are acted upon
    pub mode: FilterMode,

    /// Verdict for classes no rule matches
    pub default_verdict: Verdict,

    /// Filter rules
    pub rules: Vec<RuleConfig>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            mode: FilterMode::Enforce,
            default_verdict: Verdict::Allow,
            rules: Vec::new(),
        }
    }
}

impl Validate for FilterConfig {
    fn validate(&self) -> ConfigResult<()> {
        for rule in &self.rules {
            Rule::parse(&rule.pattern)
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        }
        Ok(())
    }
}

impl FilterConfig {
    /// Checks that every rule fits in a trie limited to `max_key_length`
    /// characters per key.
    pub fn validate_key_lengths(&self, max_key_length: Option<usize>) -> ConfigResult<()> {
        let Some(max_length) = max_key_length else {
            return Ok(());
        };
        for rule in &self.rules {
            let parsed = Rule::parse(&rule.pattern)
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
            let length = parsed.stem().chars().count();
            if length > max_length {
                return Err(ConfigError::ValidationError(format!(
                    "Rule '{}' exceeds max_key_length of {max_length} ({length} characters)",
                    rule.pattern
                )));
            }
        }
        Ok(())
    }
}

/// A single configured rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Class name or package wildcard, e.g. `com.acme.Widget` or `com.acme.*`
    pub pattern: String,

    /// Verdict for matching classes
    pub verdict: Verdict,
}

impl RuleConfig {
    /// Creates a rule configuration.
    pub fn new<S: Into<String>>(pattern: S, verdict: Verdict) -> Self {
        Self {
            pattern: pattern.into(),
            verdict,
        }
    }
}

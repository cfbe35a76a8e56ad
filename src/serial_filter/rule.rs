//! Filter rules, verdicts and modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{FilterError, FilterResult};

/// What a rule says about the classes it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The class may be deserialized.
    Allow,
    /// The class may not be deserialized.
    Deny,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Deny => f.write_str("deny"),
        }
    }
}

/// How the filter acts on a `Deny` verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Denied classes are rejected.
    #[default]
    Enforce,
    /// Denied classes are logged but still permitted.
    Discover,
    /// The filter permits everything without looking at rules.
    Inactive,
}

impl FilterMode {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::Enforce => 0,
            Self::Discover => 1,
            Self::Inactive => 2,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Discover,
            2 => Self::Inactive,
            _ => Self::Enforce,
        }
    }
}

/// A parsed filter pattern.
///
/// * `com.acme.Widget` matches exactly that class.
/// * `com.acme.*` matches every class whose name starts with `com.acme.`,
///   which covers the package and all of its sub-packages.
/// * `*` matches every class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Matches one fully-qualified class name.
    Exact(String),
    /// Matches every class name starting with the stem.
    Prefix(String),
}

impl Rule {
    /// Parses a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidPattern`] for empty patterns, patterns
    /// containing whitespace or empty name segments, and wildcards anywhere
    /// other than right after a package separator at the end.
    pub fn parse(pattern: &str) -> FilterResult<Self> {
        let invalid = |reason| FilterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if pattern.chars().any(char::is_whitespace) {
            return Err(invalid("pattern contains whitespace"));
        }
        if pattern == "*" {
            return Ok(Self::Prefix(String::new()));
        }

        let (name, wildcard) = match pattern.find('*') {
            None => (pattern, false),
            Some(index) if index + 1 != pattern.len() => {
                return Err(invalid("wildcard must be the last character"));
            }
            Some(index) => match pattern[..index].strip_suffix('.') {
                Some(package) => (package, true),
                None => return Err(invalid("wildcard must follow a package separator")),
            },
        };

        if name.split('.').any(str::is_empty) {
            return Err(invalid("empty package or class name segment"));
        }

        Ok(if wildcard {
            Self::Prefix(format!("{name}."))
        } else {
            Self::Exact(name.to_string())
        })
    }

    /// The trie key this rule is stored under.
    pub fn stem(&self) -> &str {
        match self {
            Self::Exact(name) | Self::Prefix(name) => name,
        }
    }

    /// Returns `true` for wildcard rules.
    pub fn is_prefix(&self) -> bool {
        matches!(self, Self::Prefix(_))
    }
}

impl FromStr for Rule {
    type Err = FilterError;

    fn from_str(pattern: &str) -> FilterResult<Self> {
        Self::parse(pattern)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => f.write_str(name),
            Self::Prefix(stem) => write!(f, "{stem}*"),
        }
    }
}

//! Class filter backed by two concurrent tries.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::FilterResult;
use super::rule::{FilterMode, Rule, Verdict};
use crate::config::filter::FilterConfig;
use crate::data_structures::concurrent_trie::{ConcurrentTrie, ConcurrentTrieConfig};

/// Outcome of checking one class name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// The class name as it was passed in.
    pub class_name: String,
    /// The verdict of the most specific matching rule, or the default.
    pub verdict: Verdict,
    /// The pattern of the rule that decided, `None` for the default verdict.
    pub matched_rule: Option<String>,
    /// Whether deserialization may proceed under the current mode.
    pub permitted: bool,
}

/// What a class name refers to once array descriptors are unwrapped.
enum Target<'a> {
    Class(&'a str),
    Primitive,
}

/// Reduces `[Lcom.acme.Widget;` to `com.acme.Widget` and `[[I` to a
/// primitive. Anything else is taken as a plain class name.
fn target(class_name: &str) -> Target<'_> {
    let element = class_name.trim_start_matches('[');
    if element.len() == class_name.len() {
        return Target::Class(class_name);
    }
    if let Some(name) = element.strip_prefix('L').and_then(|s| s.strip_suffix(';')) {
        return Target::Class(name);
    }
    match element {
        "Z" | "B" | "C" | "S" | "I" | "J" | "F" | "D" => Target::Primitive,
        _ => Target::Class(class_name),
    }
}

/// Decides which classes may be deserialized.
///
/// Rules are looked up from most to least specific: an exact class rule,
/// then the longest matching package wildcard, then the default verdict.
/// Rules can be added and removed while other threads are checking classes.
pub struct ClassFilter {
    exact: ConcurrentTrie<Verdict>,
    prefixes: ConcurrentTrie<Verdict>,
    mode: AtomicU8,
    default_verdict: Verdict,
}

impl ClassFilter {
    /// Creates a filter without rules.
    pub fn new(mode: FilterMode, default_verdict: Verdict) -> Self {
        Self::with_trie_config(mode, default_verdict, ConcurrentTrieConfig::default())
    }

    fn with_trie_config(
        mode: FilterMode,
        default_verdict: Verdict,
        trie_config: ConcurrentTrieConfig,
    ) -> Self {
        Self {
            exact: ConcurrentTrie::with_config(trie_config.clone()),
            prefixes: ConcurrentTrie::with_config(trie_config),
            mode: AtomicU8::new(mode.to_u8()),
            default_verdict,
        }
    }

    /// Builds a filter from configuration.
    ///
    /// Later rules for the same pattern replace earlier ones.
    ///
    /// # Errors
    ///
    /// Fails on the first rule whose pattern is invalid or too long.
    pub fn from_config(
        config: &FilterConfig,
        trie_config: &ConcurrentTrieConfig,
    ) -> FilterResult<Self> {
        let filter =
            Self::with_trie_config(config.mode, config.default_verdict, trie_config.clone());
        for rule in &config.rules {
            if let Some(previous) = filter.add_rule(&rule.pattern, rule.verdict)? {
                warn!(
                    pattern = %rule.pattern,
                    %previous,
                    verdict = %rule.verdict,
                    "duplicate filter rule replaces earlier verdict"
                );
            }
        }
        info!(
            rules = config.rules.len(),
            mode = ?config.mode,
            default = %config.default_verdict,
            "loaded class filter rules"
        );
        Ok(filter)
    }

    /// The current mode.
    pub fn mode(&self) -> FilterMode {
        FilterMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Switches the mode for subsequent checks.
    pub fn set_mode(&self, mode: FilterMode) {
        info!(?mode, "class filter mode changed");
        self.mode.store(mode.to_u8(), Ordering::Release);
    }

    /// The verdict used when no rule matches.
    pub fn default_verdict(&self) -> Verdict {
        self.default_verdict
    }

    fn trie_for(&self, rule: &Rule) -> &ConcurrentTrie<Verdict> {
        if rule.is_prefix() {
            &self.prefixes
        } else {
            &self.exact
        }
    }

    /// Adds or replaces a rule, returning the verdict it replaced.
    pub fn add_rule(&self, pattern: &str, verdict: Verdict) -> FilterResult<Option<Verdict>> {
        let rule = Rule::parse(pattern)?;
        let previous = self.trie_for(&rule).put(rule.stem(), verdict)?;
        debug!(%rule, %verdict, "added filter rule");
        Ok(previous.map(|previous| *previous))
    }

    /// Removes a rule, returning its verdict if it existed.
    pub fn remove_rule(&self, pattern: &str) -> FilterResult<Option<Verdict>> {
        let rule = Rule::parse(pattern)?;
        let previous = self.trie_for(&rule).remove(rule.stem());
        debug!(%rule, removed = previous.is_some(), "removed filter rule");
        Ok(previous.map(|previous| *previous))
    }

    /// All rules currently in effect, ordered by pattern.
    pub fn rules(&self) -> Vec<(Rule, Verdict)> {
        let exact = self
            .exact
            .iter()
            .filter_map(|entry| Some((Rule::Exact(entry.key().to_owned()), *entry.value()?)));
        let prefixes = self
            .prefixes
            .iter()
            .filter_map(|entry| Some((Rule::Prefix(entry.key().to_owned()), *entry.value()?)));

        let mut rules: Vec<_> = exact.chain(prefixes).collect();
        rules.sort_by_cached_key(|(rule, _)| rule.to_string());
        rules
    }

    /// Checks whether `class_name` may be deserialized.
    pub fn check(&self, class_name: &str) -> Decision {
        let mode = self.mode();
        if mode == FilterMode::Inactive {
            return Decision {
                class_name: class_name.to_owned(),
                verdict: Verdict::Allow,
                matched_rule: None,
                permitted: true,
            };
        }

        let (verdict, matched_rule) = match target(class_name) {
            Target::Primitive => (Verdict::Allow, None),
            Target::Class(name) => self.resolve(name),
        };
        let permitted = verdict == Verdict::Allow || mode == FilterMode::Discover;

        debug!(class = class_name, %verdict, rule = ?matched_rule, "class filter decision");
        if verdict == Verdict::Deny {
            if permitted {
                warn!(
                    class = class_name,
                    rule = ?matched_rule,
                    "class would be rejected; permitted in discover mode"
                );
            } else {
                warn!(
                    class = class_name,
                    rule = ?matched_rule,
                    "rejected deserialization of class"
                );
            }
        }

        Decision {
            class_name: class_name.to_owned(),
            verdict,
            matched_rule,
            permitted,
        }
    }

    /// Shorthand for `check(class_name).permitted`.
    pub fn is_permitted(&self, class_name: &str) -> bool {
        self.check(class_name).permitted
    }

    fn resolve(&self, name: &str) -> (Verdict, Option<String>) {
        if let Some(verdict) = self.exact.get(name) {
            return (*verdict, Some(name.to_owned()));
        }
        if let Some(entry) = self.prefixes.get_longest_prefix_entry(name) {
            if let Some(verdict) = entry.value() {
                return (*verdict, Some(format!("{}*", entry.key())));
            }
        }
        (self.default_verdict, None)
    }
}

impl Default for ClassFilter {
    fn default() -> Self {
        Self::new(FilterMode::default(), Verdict::Allow)
    }
}

impl fmt::Debug for ClassFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassFilter")
            .field("mode", &self.mode())
            .field("default_verdict", &self.default_verdict)
            .field("exact_rules", &self.exact.len())
            .field("prefix_rules", &self.prefixes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_unwraps_arrays() {
        assert!(matches!(target("com.acme.Widget"), Target::Class("com.acme.Widget")));
        assert!(matches!(target("[Lcom.acme.Widget;"), Target::Class("com.acme.Widget")));
        assert!(matches!(target("[[[Ljava.lang.String;"), Target::Class("java.lang.String")));
        assert!(matches!(target("[I"), Target::Primitive));
        assert!(matches!(target("[[J"), Target::Primitive));
        assert!(matches!(target("[Lbroken"), Target::Class("[Lbroken")));
    }

    #[test]
    fn test_default_verdict_applies_without_rules() {
        let filter = ClassFilter::new(FilterMode::Enforce, Verdict::Deny);
        let decision = filter.check("com.acme.Widget");
        assert_eq!(decision.verdict, Verdict::Deny);
        assert_eq!(decision.matched_rule, None);
        assert!(!decision.permitted);
    }

    #[test]
    fn test_add_and_remove_rule() {
        let filter = ClassFilter::default();
        assert_eq!(filter.add_rule("com.acme.*", Verdict::Deny).unwrap(), None);
        assert_eq!(
            filter.add_rule("com.acme.*", Verdict::Allow).unwrap(),
            Some(Verdict::Deny)
        );
        assert_eq!(filter.remove_rule("com.acme.*").unwrap(), Some(Verdict::Allow));
        assert_eq!(filter.remove_rule("com.acme.*").unwrap(), None);
        assert!(filter.add_rule("com.*.Widget", Verdict::Deny).is_err());
    }
}

//! Class-name serialization filter.
//!
//! Decides whether a fully-qualified class name may be deserialized, using the
//! most specific configured rule. Rules are either exact class names or
//! package wildcards; wildcards are resolved with a longest-prefix lookup in a
//! [`ConcurrentTrie`](crate::data_structures::concurrent_trie::ConcurrentTrie).
//!
//! # Example
//!
//! ```
//! use prefix_gate_lib::serial_filter::{ClassFilter, FilterMode, Verdict};
//!
//! let filter = ClassFilter::new(FilterMode::Enforce, Verdict::Allow);
//! filter.add_rule("org.apache.commons.collections.functors.*", Verdict::Deny).unwrap();
//! filter.add_rule("org.apache.commons.collections.functors.SafeFunctor", Verdict::Allow).unwrap();
//!
//! assert!(!filter.is_permitted("org.apache.commons.collections.functors.InvokerTransformer"));
//! assert!(filter.is_permitted("org.apache.commons.collections.functors.SafeFunctor"));
//! assert!(filter.is_permitted("java.util.HashMap"));
//! ```

mod error;
mod filter;
mod rule;

pub use error::{FilterError, FilterResult};
pub use filter::{ClassFilter, Decision};
pub use rule::{FilterMode, Rule, Verdict};

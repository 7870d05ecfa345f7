//! Placeholder value validation
//!
//! Values typed into textbox placeholders are checked against a chain of
//! rule-sets. Each rule is a regular expression or host predicate together
//! with the outcome it expects and a severity.
//!
//! # Core Concepts
//!
//! - [`RuleSet`]: named, ordered, immutable list of [`ValidatorRule`]s
//! - [`RuleSetCatalog`]: built-in presets plus custom rule-sets with imports
//! - [`evaluate`]: severity-ranked verdict over several rule-sets
//! - [`is_valid_value`]: acceptance check that ignores warnings
//!
//! # Example
//!
//! ```rust,ignore
//! use docvar_validator::{evaluate, RuleSetCatalog, ValidationStatus};
//!
//! let catalog = RuleSetCatalog::with_presets();
//! let sets = catalog.resolve(&["port_number".to_string()])?;
//! assert_eq!(evaluate("8080", &sets).status, ValidationStatus::Good);
//! ```

#![warn(unreachable_pub)]

mod catalog;
mod error;
mod evaluate;
mod presets;
mod rule;

pub use catalog::{RuleDescriptor, RuleSetCatalog, RuleSetDescriptor};
pub use error::{ValidatorError, ValidatorResult};
pub use evaluate::{evaluate, is_valid_value, ValidationStatus, Verdict};
pub use presets::{preset, presets};
pub use rule::{
    must_match, must_not_match, should_match, should_not_match, PredicateFn, PredicateRegistry,
    RuleSet, RuleSetReport, RuleTest, Severity, ValidatorRule,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

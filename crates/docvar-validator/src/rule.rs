//! Rules and rule-sets
//!
//! A [`RuleSet`] is an immutable, ordered collection of [`ValidatorRule`]s.
//! Each rule pairs a test (regular expression or host predicate) with the
//! polarity it expects and the severity of a mismatch.

use crate::error::{ValidatorError, ValidatorResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Host supplied predicate used by `match_function` rules
pub type PredicateFn = Arc<dyn Fn(&str) -> Result<bool, String> + Send + Sync>;

/// How much a failing rule matters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, never blocks acceptance
    #[serde(alias = "warn")]
    Warning,

    /// Blocks acceptance
    #[default]
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The boolean test of a rule
#[derive(Clone)]
pub enum RuleTest {
    /// Unanchored regular expression search
    Pattern(Regex),

    /// Named predicate registered by the host
    Predicate {
        /// Registration name
        name: String,
        /// The predicate itself
        function: PredicateFn,
    },
}

impl RuleTest {
    /// Compile a pattern test
    pub fn pattern(rule_set: &str, pattern: &str) -> ValidatorResult<Self> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|e| ValidatorError::invalid_pattern(rule_set, pattern, e))
    }

    /// Run the test against a value
    ///
    /// Predicates that return `Err` or panic are reported as
    /// [`ValidatorError::PredicateFailed`].
    pub fn matches(&self, value: &str) -> ValidatorResult<bool> {
        match self {
            Self::Pattern(regex) => Ok(regex.is_match(value)),
            Self::Predicate { name, function } => {
                match catch_unwind(AssertUnwindSafe(|| function(value))) {
                    Ok(Ok(result)) => Ok(result),
                    Ok(Err(message)) => Err(ValidatorError::predicate_failed(name, message)),
                    Err(_) => Err(ValidatorError::predicate_failed(name, "predicate panicked")),
                }
            }
        }
    }

    /// Stable textual identity, used to de-duplicate imported rules
    #[must_use]
    pub fn source(&self) -> String {
        match self {
            Self::Pattern(regex) => format!("regex:{}", regex.as_str()),
            Self::Predicate { name, .. } => format!("fn:{name}"),
        }
    }
}

impl fmt::Debug for RuleTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Predicate { name, .. } => f.debug_struct("Predicate").field("name", name).finish(),
        }
    }
}

/// Single validation rule
#[derive(Debug, Clone)]
pub struct ValidatorRule {
    /// Severity of a rejection
    pub severity: Severity,
    /// Boolean test
    pub test: RuleTest,
    /// Desired outcome of the test
    pub should_match: bool,
    /// Message shown when the rule rejects a value
    pub error_message: String,
}

impl ValidatorRule {
    /// Create a rule
    #[must_use]
    pub fn new(
        severity: Severity,
        test: RuleTest,
        should_match: bool,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            test,
            should_match,
            error_message: error_message.into(),
        }
    }

    /// Whether this rule rejects `value`
    ///
    /// A failing predicate counts as a rejection.
    #[must_use]
    pub fn rejects(&self, value: &str) -> bool {
        match self.test.matches(value) {
            Ok(matched) => matched != self.should_match,
            Err(e) => {
                tracing::warn!("{e}; treating value '{value}' as rejected");
                true
            }
        }
    }

    fn dedup_key(&self) -> (Severity, String, bool, String) {
        (
            self.severity,
            self.test.source(),
            self.should_match,
            self.error_message.clone(),
        )
    }
}

/// Named, ordered, immutable collection of rules
#[derive(Debug, Clone)]
pub struct RuleSet {
    id: String,
    display_name: String,
    rules: Vec<ValidatorRule>,
}

impl RuleSet {
    /// Create rule-set
    ///
    /// # Errors
    /// Returns [`ValidatorError::EmptyRuleSet`] if `rules` is empty
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        rules: Vec<ValidatorRule>,
    ) -> ValidatorResult<Self> {
        let id = id.into();
        if rules.is_empty() {
            return Err(ValidatorError::EmptyRuleSet(id));
        }
        Ok(Self {
            id,
            display_name: display_name.into(),
            rules,
        })
    }

    /// Create rule-set from own and imported rules, dropping duplicates
    pub(crate) fn merged(
        id: String,
        display_name: String,
        rules: impl IntoIterator<Item = ValidatorRule>,
    ) -> ValidatorResult<Self> {
        let mut seen = std::collections::HashSet::new();
        let unique = rules
            .into_iter()
            .filter(|rule| seen.insert(rule.dedup_key()))
            .collect();
        Self::new(id, display_name, unique)
    }

    /// Identifier used by placeholder descriptors
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human readable name
    #[inline]
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Rules in declaration order
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[ValidatorRule] {
        &self.rules
    }

    /// Run every rule against `value`
    #[must_use]
    pub fn check(&self, value: &str) -> RuleSetReport {
        let mut report = RuleSetReport {
            rule_set_id: self.id.clone(),
            display_name: self.display_name.clone(),
            warnings: Vec::new(),
            errors: Vec::new(),
        };
        for rule in &self.rules {
            if rule.rejects(value) {
                match rule.severity {
                    Severity::Warning => report.warnings.push(rule.error_message.clone()),
                    Severity::Error => report.errors.push(rule.error_message.clone()),
                }
            }
        }
        report
    }

    /// Whether no error-level rule rejects `value`
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        self.rules
            .iter()
            .filter(|rule| rule.severity == Severity::Error)
            .all(|rule| !rule.rejects(value))
    }
}

/// Outcome of running one rule-set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSetReport {
    /// Rule-set id
    pub rule_set_id: String,
    /// Rule-set display name
    pub display_name: String,
    /// Messages of rejecting warning rules
    pub warnings: Vec<String>,
    /// Messages of rejecting error rules
    pub errors: Vec<String>,
}

impl RuleSetReport {
    /// No rule rejected at all
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }

    /// At least one error-level rejection
    #[inline]
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Predicates made available to `match_function` rules
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    predicates: HashMap<String, PredicateFn>,
}

impl PredicateRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predicate under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&str) -> Result<bool, String> + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(predicate));
    }

    /// Look up a predicate
    #[must_use]
    pub fn get(&self, name: &str) -> Option<PredicateFn> {
        self.predicates.get(name).cloned()
    }

    /// Registered names
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.predicates.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Rule that must match `pattern`
pub fn must_match(pattern: &str, message: &str) -> ValidatorResult<ValidatorRule> {
    rule(Severity::Error, pattern, true, message)
}

/// Rule that must not match `pattern`
pub fn must_not_match(pattern: &str, message: &str) -> ValidatorResult<ValidatorRule> {
    rule(Severity::Error, pattern, false, message)
}

/// Rule that should match `pattern`
pub fn should_match(pattern: &str, message: &str) -> ValidatorResult<ValidatorRule> {
    rule(Severity::Warning, pattern, true, message)
}

/// Rule that should not match `pattern`
pub fn should_not_match(pattern: &str, message: &str) -> ValidatorResult<ValidatorRule> {
    rule(Severity::Warning, pattern, false, message)
}

fn rule(
    severity: Severity,
    pattern: &str,
    should_match: bool,
    message: &str,
) -> ValidatorResult<ValidatorRule> {
    Ok(ValidatorRule::new(
        severity,
        RuleTest::pattern("<builtin>", pattern)?,
        should_match,
        message,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicate(name: &str, f: impl Fn(&str) -> Result<bool, String> + Send + Sync + 'static) -> RuleTest {
        RuleTest::Predicate {
            name: name.to_string(),
            function: Arc::new(f),
        }
    }

    #[test]
    fn rule_rejects_on_polarity_mismatch() {
        let rule = must_match("^[0-9]+$", "digits only").unwrap();
        assert!(!rule.rejects("123"));
        assert!(rule.rejects("12a"));

        let rule = must_not_match(r"\s", "no whitespace").unwrap();
        assert!(!rule.rejects("abc"));
        assert!(rule.rejects("a c"));
    }

    #[test]
    fn failing_predicate_counts_as_rejection() {
        let rule = ValidatorRule::new(
            Severity::Error,
            predicate("broken", |_| Err("no".to_string())),
            true,
            "broken",
        );
        assert!(rule.rejects("anything"));

        let rule = ValidatorRule::new(
            Severity::Error,
            predicate("broken_negated", |_| Err("no".to_string())),
            false,
            "broken",
        );
        assert!(rule.rejects("anything"));
    }

    #[test]
    fn panicking_predicate_is_contained() {
        let test = predicate("panics", |_| panic!("predicate bug"));
        let result = test.matches("x");
        assert!(matches!(result, Err(ValidatorError::PredicateFailed { .. })));
    }

    #[test]
    fn rule_set_check_splits_by_severity() {
        let set = RuleSet::new(
            "port",
            "TCP/UDP port",
            vec![
                must_match("^[0-9]+$", "Only numbers are allowed").unwrap(),
                should_match("^[0-9]{1,4}$", "Short port expected").unwrap(),
            ],
        )
        .unwrap();

        let report = set.check("65535");
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings, vec!["Short port expected".to_string()]);
        assert!(set.accepts("65535"));

        let report = set.check("http");
        assert_eq!(report.errors.len(), 1);
        assert!(!set.accepts("http"));
    }

    #[test]
    fn empty_rule_set_is_rejected() {
        let result = RuleSet::new("empty", "Empty", vec![]);
        assert!(matches!(result, Err(ValidatorError::EmptyRuleSet(_))));
    }

    #[test]
    fn merged_drops_duplicate_rules() {
        let rule = must_match("^a", "starts with a").unwrap();
        let set = RuleSet::merged(
            "dup".to_string(),
            "Dup".to_string(),
            vec![rule.clone(), rule],
        )
        .unwrap();
        assert_eq!(set.rules().len(), 1);
    }

    #[test]
    fn severity_accepts_warn_alias() {
        let severity: Severity = serde_json::from_str("\"warn\"").unwrap();
        assert_eq!(severity, Severity::Warning);
        let severity: Severity = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(severity, Severity::Error);
    }
}

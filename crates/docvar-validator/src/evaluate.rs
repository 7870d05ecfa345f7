//! Severity-ranked evaluation of a value against several rule-sets
//!
//! A value is checked against every attached rule-set. One rule-set without
//! any rejection is enough for [`ValidationStatus::Good`]. Otherwise the
//! rule-sets that only produced warnings decide between
//! [`ValidationStatus::Warning`] and [`ValidationStatus::Error`].

use crate::rule::{RuleSet, RuleSetReport};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Overall outcome of validating a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// At least one rule-set accepted the value without any rejection
    Good,
    /// No clean pass, but some rule-set only produced warnings
    Warning,
    /// Every rule-set produced at least one error
    Error,
    /// No rule-sets attached, everything is accepted
    NoValidator,
}

impl ValidationStatus {
    /// Suffix of the `validation-*` class applied to inline editors
    #[must_use]
    pub fn css_suffix(self) -> &'static str {
        match self {
            Self::Good => "ok",
            Self::Warning => "warn",
            Self::Error => "error",
            Self::NoValidator => "none",
        }
    }

    /// Whether the value may be persisted
    #[inline]
    #[must_use]
    pub fn is_acceptable(self) -> bool {
        !matches!(self, Self::Error)
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::NoValidator => "no validator",
        };
        write!(f, "{s}")
    }
}

/// Status plus a message suitable for a tooltip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// Overall status
    pub status: ValidationStatus,
    /// Human readable explanation, one line per message
    pub message: String,
}

impl Verdict {
    fn new(status: ValidationStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Evaluate `value` against `rule_sets`
#[must_use]
pub fn evaluate(value: &str, rule_sets: &[Arc<RuleSet>]) -> Verdict {
    if rule_sets.is_empty() {
        return Verdict::new(ValidationStatus::NoValidator, "No validators defined");
    }

    let reports: Vec<RuleSetReport> = rule_sets.iter().map(|set| set.check(value)).collect();

    let clean: Vec<&str> = reports
        .iter()
        .filter(|r| r.is_clean())
        .map(|r| r.display_name.as_str())
        .collect();
    if !clean.is_empty() {
        return Verdict::new(
            ValidationStatus::Good,
            format!("Matches {}", clean.join(", ")),
        );
    }

    let warning_only: Vec<&RuleSetReport> = reports.iter().filter(|r| !r.has_errors()).collect();
    if warning_only.is_empty() {
        let lines = reports
            .iter()
            .flat_map(|r| r.errors.iter().map(move |m| format!("{}: {m}", r.display_name)));
        Verdict::new(ValidationStatus::Error, collect_lines(lines))
    } else {
        let lines = warning_only
            .iter()
            .flat_map(|r| r.warnings.iter().map(move |m| format!("{}: {m}", r.display_name)));
        Verdict::new(ValidationStatus::Warning, collect_lines(lines))
    }
}

/// Fast acceptance check considering only error-level rules
///
/// Accepts when no rule-set is attached or at least one rule-set has no
/// error-level rejection.
#[must_use]
pub fn is_valid_value(value: &str, rule_sets: &[Arc<RuleSet>]) -> bool {
    rule_sets.is_empty() || rule_sets.iter().any(|set| set.accepts(value))
}

fn collect_lines(lines: impl Iterator<Item = String>) -> String {
    lines.collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{must_match, must_not_match, should_match, should_not_match};

    fn set(id: &str, rules: Vec<crate::rule::ValidatorRule>) -> Arc<RuleSet> {
        Arc::new(RuleSet::new(id, id, rules).unwrap())
    }

    #[test]
    fn no_rule_sets_accepts_everything() {
        let verdict = evaluate("anything", &[]);
        assert_eq!(verdict.status, ValidationStatus::NoValidator);
        assert!(is_valid_value("anything", &[]));
    }

    #[test]
    fn clean_pass_short_circuits() {
        let alnum = set("alnum", vec![must_match("^[a-z0-9]+$", "Alphanumeric only").unwrap()]);
        let digits = set("digits", vec![must_match("^[0-9]+$", "Digits only").unwrap()]);

        let verdict = evaluate("abc123", &[alnum, digits]);
        assert_eq!(verdict.status, ValidationStatus::Good);
        assert!(verdict.message.contains("alnum"));
        assert!(!verdict.message.contains("digits"));
    }

    #[test]
    fn warning_only_rule_sets_produce_warning() {
        let a = set("short", vec![should_match("^.{0,3}$", "Should be short").unwrap()]);
        let b = set("lower", vec![should_not_match("[A-Z]", "Should be lowercase").unwrap()]);

        let verdict = evaluate("ABCDEF", &[a, b]);
        assert_eq!(verdict.status, ValidationStatus::Warning);
        assert_eq!(verdict.message, "short: Should be short\nlower: Should be lowercase");
        assert!(is_valid_value("ABCDEF", &[]));
    }

    #[test]
    fn error_rule_sets_report_only_errors() {
        let a = set(
            "numeric",
            vec![
                must_match("^[0-9]+$", "Only digits").unwrap(),
                should_match("^.{0,2}$", "Prefer two chars").unwrap(),
            ],
        );
        let b = set("no_space", vec![must_not_match(" ", "No spaces").unwrap()]);

        let verdict = evaluate("a b c", &[a.clone(), b.clone()]);
        assert_eq!(verdict.status, ValidationStatus::Error);
        assert_eq!(verdict.message, "numeric: Only digits\nno_space: No spaces");
        assert!(!is_valid_value("a b c", &[a, b]));
    }

    #[test]
    fn warning_only_set_wins_over_error_set() {
        let strict = set("strict", vec![must_match("^[0-9]+$", "Only digits").unwrap()]);
        let lenient = set("lenient", vec![should_match("^[0-9]+$", "Prefer digits").unwrap()]);

        let verdict = evaluate("abc", &[strict.clone(), lenient.clone()]);
        assert_eq!(verdict.status, ValidationStatus::Warning);
        assert_eq!(verdict.message, "lenient: Prefer digits");
        assert!(is_valid_value("abc", &[strict, lenient]));
    }

    #[test]
    fn css_suffixes() {
        assert_eq!(ValidationStatus::Good.css_suffix(), "ok");
        assert_eq!(ValidationStatus::Warning.css_suffix(), "warn");
        assert_eq!(ValidationStatus::Error.css_suffix(), "error");
        assert_eq!(ValidationStatus::NoValidator.css_suffix(), "none");
    }
}

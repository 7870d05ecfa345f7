//! Error types for rule-set compilation and predicate evaluation

/// Errors raised while compiling rule-sets or evaluating predicates
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    /// Rule-set was declared without rules
    #[error("rule-set '{0}' needs at least one rule, but received an empty list")]
    EmptyRuleSet(String),

    /// Regular expression does not compile
    #[error("invalid regular expression '{pattern}' in rule-set '{rule_set}': {source}")]
    InvalidPattern {
        rule_set: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Rule defines both or neither of `regex` and `match_function`
    #[error("rule {index} of rule-set '{rule_set}' must define exactly one of 'regex' and 'match_function'")]
    AmbiguousTest { rule_set: String, index: usize },

    /// `match_function` names a predicate the host never registered
    #[error("rule-set '{rule_set}' references unknown predicate '{name}'")]
    UnknownPredicate { rule_set: String, name: String },

    /// `import_rules_from` names a rule-set that does not exist
    #[error("rule-set '{rule_set}' imports rules from unknown rule-set '{import}'")]
    UnknownImport { rule_set: String, import: String },

    /// Lookup of a rule-set id failed
    #[error("no rule-set named '{0}'")]
    UnknownRuleSet(String),

    /// Two custom rule-sets share an id
    #[error("rule-set '{0}' is defined more than once")]
    DuplicateRuleSet(String),

    /// Host predicate returned an error or panicked
    #[error("predicate '{name}' failed: {message}")]
    PredicateFailed { name: String, message: String },

    /// Host default function returned an error or panicked
    #[error("default function '{name}' failed: {message}")]
    DefaultFunctionFailed { name: String, message: String },
}

impl ValidatorError {
    /// Create invalid pattern error
    pub fn invalid_pattern(
        rule_set: impl Into<String>,
        pattern: impl Into<String>,
        source: regex::Error,
    ) -> Self {
        Self::InvalidPattern {
            rule_set: rule_set.into(),
            pattern: pattern.into(),
            source,
        }
    }

    /// Create predicate failure
    pub fn predicate_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PredicateFailed {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for validator operations
pub type ValidatorResult<T> = Result<T, ValidatorError>;

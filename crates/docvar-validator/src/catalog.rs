//! Rule-set catalog
//!
//! Compiles custom rule-set descriptors on top of the built-in presets and
//! resolves the ids attached to placeholders.

use crate::error::{ValidatorError, ValidatorResult};
use crate::presets;
use crate::rule::{PredicateRegistry, RuleSet, RuleTest, Severity, ValidatorRule};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Custom rule-set as written in the descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetDescriptor {
    /// Id referenced by placeholders
    pub id: String,

    /// Human readable name
    #[serde(alias = "name")]
    pub display_name: String,

    /// Own rules
    pub rules: Vec<RuleDescriptor>,

    /// Ids of rule-sets whose rules are included transitively
    #[serde(default)]
    pub import_rules_from: Vec<String>,
}

/// Single rule as written in the descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDescriptor {
    /// Severity of a rejection
    #[serde(default)]
    pub severity: Severity,

    /// Regular expression test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    /// Name of a host predicate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_function: Option<String>,

    /// Desired outcome of the test
    pub should_match: bool,

    /// Message shown on rejection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RuleDescriptor {
    fn compile(
        &self,
        rule_set: &str,
        index: usize,
        predicates: &PredicateRegistry,
    ) -> ValidatorResult<ValidatorRule> {
        let verb = if self.should_match { "Should" } else { "Should not" };
        let (test, default_message) = match (&self.regex, &self.match_function) {
            (Some(pattern), None) if !pattern.is_empty() => (
                RuleTest::pattern(rule_set, pattern)?,
                format!("{verb} match the regular expression '{pattern}'"),
            ),
            (None, Some(name)) if !name.is_empty() => {
                let function =
                    predicates
                        .get(name)
                        .ok_or_else(|| ValidatorError::UnknownPredicate {
                            rule_set: rule_set.to_string(),
                            name: name.clone(),
                        })?;
                (
                    RuleTest::Predicate {
                        name: name.clone(),
                        function,
                    },
                    format!("{verb} return true when passed to the function '{name}'"),
                )
            }
            _ => {
                return Err(ValidatorError::AmbiguousTest {
                    rule_set: rule_set.to_string(),
                    index,
                })
            }
        };
        let message = self
            .error_message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or(default_message);
        Ok(ValidatorRule::new(self.severity, test, self.should_match, message))
    }
}

/// Rule-set with unresolved imports
struct PendingRuleSet {
    display_name: String,
    rules: Vec<ValidatorRule>,
    imports: Vec<String>,
}

/// All rule-sets addressable by id
#[derive(Debug, Clone, Default)]
pub struct RuleSetCatalog {
    sets: HashMap<String, Arc<RuleSet>>,
}

impl RuleSetCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create catalog holding the built-in presets
    #[must_use]
    pub fn with_presets() -> Self {
        let sets = presets::presets()
            .iter()
            .map(|set| (set.id().to_string(), Arc::clone(set)))
            .collect();
        Self { sets }
    }

    /// Compile custom rule-sets on top of the presets
    ///
    /// A broken descriptor only drops that rule-set. Its error is returned
    /// next to the catalog so the caller can report every problem at once.
    #[must_use]
    pub fn compile(
        descriptors: &[RuleSetDescriptor],
        predicates: &PredicateRegistry,
    ) -> (Self, Vec<ValidatorError>) {
        let mut errors = Vec::new();
        let mut pending: HashMap<String, PendingRuleSet> = presets::presets()
            .iter()
            .map(|set| {
                (
                    set.id().to_string(),
                    PendingRuleSet {
                        display_name: set.display_name().to_string(),
                        rules: set.rules().to_vec(),
                        imports: Vec::new(),
                    },
                )
            })
            .collect();

        let mut custom_ids = Vec::new();
        let mut seen = HashSet::new();
        for descriptor in descriptors {
            if !seen.insert(descriptor.id.clone()) {
                errors.push(ValidatorError::DuplicateRuleSet(descriptor.id.clone()));
                continue;
            }
            if descriptor.rules.is_empty() {
                errors.push(ValidatorError::EmptyRuleSet(descriptor.id.clone()));
                continue;
            }
            let rules: ValidatorResult<Vec<_>> = descriptor
                .rules
                .iter()
                .enumerate()
                .map(|(i, rule)| rule.compile(&descriptor.id, i, predicates))
                .collect();
            match rules {
                Ok(rules) => {
                    pending.insert(
                        descriptor.id.clone(),
                        PendingRuleSet {
                            display_name: descriptor.display_name.clone(),
                            rules,
                            imports: descriptor.import_rules_from.clone(),
                        },
                    );
                    custom_ids.push(descriptor.id.clone());
                }
                Err(e) => errors.push(e),
            }
        }

        let mut catalog = Self::with_presets();
        for id in custom_ids {
            match resolve_imports(&pending, &id) {
                Ok(rules) => {
                    let display_name = pending[&id].display_name.clone();
                    match RuleSet::merged(id.clone(), display_name, rules) {
                        Ok(set) => {
                            debug!("Compiled rule-set '{}' with {} rules", id, set.rules().len());
                            catalog.insert(set);
                        }
                        Err(e) => errors.push(e),
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        for e in &errors {
            warn!("{e}");
        }
        (catalog, errors)
    }

    /// Add or replace a rule-set
    pub fn insert(&mut self, set: RuleSet) {
        self.sets.insert(set.id().to_string(), Arc::new(set));
    }

    /// Look up a rule-set
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<RuleSet>> {
        self.sets.get(id).cloned()
    }

    /// Resolve a list of ids, keeping their order
    ///
    /// # Errors
    /// Returns [`ValidatorError::UnknownRuleSet`] for the first unknown id
    pub fn resolve(&self, ids: &[String]) -> ValidatorResult<Vec<Arc<RuleSet>>> {
        ids.iter()
            .map(|id| {
                self.get(id)
                    .ok_or_else(|| ValidatorError::UnknownRuleSet(id.clone()))
            })
            .collect()
    }

    /// Number of rule-sets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Sorted ids
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sets.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Collect the rules of `root` and everything it imports
///
/// Each rule-set contributes once, so import loops terminate.
fn resolve_imports(
    pending: &HashMap<String, PendingRuleSet>,
    root: &str,
) -> ValidatorResult<Vec<ValidatorRule>> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![root.to_string()];

    while let Some(id) = stack.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        let Some(set) = pending.get(&id) else {
            return Err(ValidatorError::UnknownImport {
                rule_set: root.to_string(),
                import: id,
            });
        };
        order.push(id.clone());
        for import in set.imports.iter().rev() {
            if !visited.contains(import) {
                stack.push(import.clone());
            }
        }
    }

    Ok(order
        .iter()
        .flat_map(|id| pending[id].rules.iter().cloned())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::{evaluate, ValidationStatus};

    fn parse(yaml: &str) -> Vec<RuleSetDescriptor> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn presets_are_available() {
        let catalog = RuleSetCatalog::with_presets();
        assert!(catalog.get("ipv4_address").is_some());
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn custom_rule_set_with_synthesised_message() {
        let descriptors = parse(
            r#"
- id: lowercase
  display_name: Lowercase
  rules:
    - regex: "[A-Z]"
      should_match: false
"#,
        );
        let (catalog, errors) = RuleSetCatalog::compile(&descriptors, &PredicateRegistry::new());
        assert!(errors.is_empty());

        let set = catalog.get("lowercase").unwrap();
        assert_eq!(set.rules()[0].severity, Severity::Error);
        assert_eq!(
            set.rules()[0].error_message,
            "Should not match the regular expression '[A-Z]'"
        );
        assert_eq!(evaluate("Abc", &[set]).status, ValidationStatus::Error);
    }

    #[test]
    fn imports_are_transitive_and_loops_terminate() {
        let descriptors = parse(
            r#"
- id: a
  name: A
  import_rules_from: [b]
  rules:
    - regex: "^a"
      should_match: true
- id: b
  name: B
  import_rules_from: [c, a]
  rules:
    - regex: "b"
      should_match: true
      severity: warn
- id: c
  name: C
  import_rules_from: [port_number]
  rules:
    - regex: "^a"
      should_match: true
"#,
        );
        let (catalog, errors) = RuleSetCatalog::compile(&descriptors, &PredicateRegistry::new());
        assert!(errors.is_empty(), "{errors:?}");

        // a + b + c (duplicate of a dropped) + two port_number rules
        assert_eq!(catalog.get("a").unwrap().rules().len(), 4);
        assert_eq!(catalog.get("b").unwrap().rules().len(), 4);
    }

    #[test]
    fn unknown_import_drops_only_that_rule_set() {
        let descriptors = parse(
            r#"
- id: broken
  name: Broken
  import_rules_from: [missing]
  rules:
    - regex: "x"
      should_match: true
- id: fine
  name: Fine
  rules:
    - regex: "x"
      should_match: true
"#,
        );
        let (catalog, errors) = RuleSetCatalog::compile(&descriptors, &PredicateRegistry::new());
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidatorError::UnknownImport { .. }));
        assert!(catalog.get("broken").is_none());
        assert!(catalog.get("fine").is_some());
    }

    #[test]
    fn rule_needs_exactly_one_test() {
        let descriptors = parse(
            r#"
- id: both
  name: Both
  rules:
    - regex: "x"
      match_function: is_even
      should_match: true
- id: neither
  name: Neither
  rules:
    - should_match: true
"#,
        );
        let (catalog, errors) = RuleSetCatalog::compile(&descriptors, &PredicateRegistry::new());
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidatorError::AmbiguousTest { .. })));
        assert!(catalog.get("both").is_none());
    }

    #[test]
    fn predicates_resolve_from_registry() {
        let mut predicates = PredicateRegistry::new();
        predicates.register("is_even", |v: &str| {
            v.parse::<i64>()
                .map(|n| n % 2 == 0)
                .map_err(|e| e.to_string())
        });
        let descriptors = parse(
            r#"
- id: even
  name: Even number
  rules:
    - match_function: is_even
      should_match: true
      error_message: Must be even
- id: odd
  name: Odd number
  rules:
    - match_function: is_odd
      should_match: true
"#,
        );
        let (catalog, errors) = RuleSetCatalog::compile(&descriptors, &predicates);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidatorError::UnknownPredicate { .. }));

        let even = catalog.get("even").unwrap();
        assert_eq!(evaluate("4", &[even.clone()]).status, ValidationStatus::Good);
        assert_eq!(evaluate("3", &[even.clone()]).status, ValidationStatus::Error);
        // predicate error is a rejection
        assert_eq!(evaluate("four", &[even]).status, ValidationStatus::Error);
    }

    #[test]
    fn custom_overrides_preset_and_duplicates_are_reported() {
        let descriptors = parse(
            r#"
- id: port_number
  name: Port
  rules:
    - regex: "^80$"
      should_match: true
- id: port_number
  name: Port again
  rules:
    - regex: "^443$"
      should_match: true
"#,
        );
        let (catalog, errors) = RuleSetCatalog::compile(&descriptors, &PredicateRegistry::new());
        assert!(matches!(errors[..], [ValidatorError::DuplicateRuleSet(_)]));
        let set = catalog.get("port_number").unwrap();
        assert_eq!(set.display_name(), "Port");
        assert_eq!(set.rules().len(), 1);
    }

    #[test]
    fn resolve_keeps_order_and_rejects_unknown() {
        let catalog = RuleSetCatalog::with_presets();
        let sets = catalog
            .resolve(&["uuid".to_string(), "email".to_string()])
            .unwrap();
        assert_eq!(sets[0].id(), "uuid");
        assert_eq!(sets[1].id(), "email");
        assert!(catalog.resolve(&["missing".to_string()]).is_err());
    }
}

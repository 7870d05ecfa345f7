//! Value expansion
//!
//! All dependency tokens are substituted in a single left-to-right pass, so
//! text produced by one substitution is never scanned again.

use docvar_registry::{Placeholder, TokenClass};
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Substitute every token of `dependencies` in `value` with their expanded values
pub(crate) fn expand_value(value: &str, dependencies: &[&Placeholder]) -> Result<String, regex::Error> {
    let mut replacements: HashMap<&str, &str> = HashMap::new();
    for dependency in dependencies {
        for class in TokenClass::ALL {
            replacements.insert(
                dependency.tokens.get(class).literal(),
                dependency.expanded_value.as_str(),
            );
        }
    }
    if replacements.is_empty() {
        return Ok(value.to_string());
    }

    // longest literal wins where tokens overlap
    let mut literals: Vec<&str> = replacements.keys().copied().collect();
    literals.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = literals
        .iter()
        .map(|literal| regex::escape(literal))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = Regex::new(&alternation)?;

    let expanded = pattern.replace_all(value, |caps: &Captures<'_>| {
        let token = &caps[0];
        replacements.get(token).copied().unwrap_or(token).to_string()
    });
    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvar_test_utils::textbox;

    #[test]
    fn substituted_text_is_not_rescanned() {
        let mut a = textbox("A", "xBx");
        a.expanded_value = "xBx".to_string();
        let mut b = textbox("B", "b");
        b.expanded_value = "[xAx]".to_string();

        let result = expand_value("xAx / xBx", &[&a, &b]).unwrap();
        assert_eq!(result, "xBx / [xAx]");
    }

    #[test]
    fn no_dependencies_returns_value() {
        assert_eq!(expand_value("plain xAx", &[]).unwrap(), "plain xAx");
    }
}

//! Token search patterns
//!
//! A token is `prefix + NAME + suffix`. The name is escaped as a literal, so
//! names never act as regular expressions.

use crate::error::TokenError;
use crate::settings::{Settings, TokenClass};
use regex::{NoExpand, Regex};
use std::collections::BTreeMap;

/// Compiled search pattern for one token
#[derive(Debug, Clone)]
pub struct TokenPattern {
    literal: String,
    regex: Regex,
    global: bool,
}

impl TokenPattern {
    /// Create global pattern for `prefix + name + suffix`
    #[must_use]
    pub fn new(name: &str, prefix: &str, suffix: &str) -> Self {
        let literal = format!("{prefix}{name}{suffix}");
        let regex = Regex::new(&regex::escape(&literal))
            .unwrap_or_else(|_| unreachable!("escaped literals always compile"));
        Self {
            literal,
            regex,
            global: true,
        }
    }

    /// Same pattern restricted to the first match
    ///
    /// Such a pattern may only be used for presence checks.
    #[must_use]
    pub fn first_only(mut self) -> Self {
        self.global = false;
        self
    }

    /// Literal token text
    #[inline]
    #[must_use]
    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Underlying regular expression
    #[inline]
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Whether substitution replaces every occurrence
    #[inline]
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.global
    }

    /// Whether `haystack` contains the token
    #[must_use]
    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }

    /// Number of occurrences in `haystack`
    #[must_use]
    pub fn count(&self, haystack: &str) -> usize {
        self.regex.find_iter(haystack).count()
    }

    /// Replace every occurrence with `replacement` taken literally
    ///
    /// Returns the new text and the number of replaced occurrences.
    ///
    /// # Errors
    /// Returns [`TokenError::NotGlobal`] for patterns made with
    /// [`TokenPattern::first_only`]
    pub fn replace_all(&self, haystack: &str, replacement: &str) -> Result<(String, usize), TokenError> {
        if !self.global {
            return Err(TokenError::NotGlobal(self.literal.clone()));
        }
        let count = self.count(haystack);
        if count == 0 {
            return Ok((haystack.to_string(), 0));
        }
        let replaced = self.regex.replace_all(haystack, NoExpand(replacement));
        Ok((replaced.into_owned(), count))
    }
}

/// Token patterns of one placeholder for every class
#[derive(Debug, Clone)]
pub struct PlaceholderTokens {
    patterns: BTreeMap<TokenClass, TokenPattern>,
}

impl PlaceholderTokens {
    /// Compile patterns of `name` for every class in `settings`
    #[must_use]
    pub fn new(name: &str, settings: &Settings) -> Self {
        let patterns = TokenClass::ALL
            .into_iter()
            .map(|class| {
                let (prefix, suffix) = settings.affixes(class);
                (class, TokenPattern::new(name, prefix, suffix))
            })
            .collect();
        Self { patterns }
    }

    /// Pattern of one class
    #[must_use]
    pub fn get(&self, class: TokenClass) -> &TokenPattern {
        &self.patterns[&class]
    }

    /// Pattern used for dependency scanning and value expansion
    #[inline]
    #[must_use]
    pub fn normal(&self) -> &TokenPattern {
        self.get(TokenClass::Normal)
    }
}

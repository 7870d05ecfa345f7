//! Host supplied functions
//!
//! Descriptors name predicates (`match_function`) and default producers
//! (`default_function`). The host registers the implementations here before
//! parsing; nothing is evaluated from descriptor text.

use docvar_validator::PredicateRegistry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Default value producer of a textbox
pub type DefaultFn = Arc<dyn Fn() -> Result<String, String> + Send + Sync>;

/// Functions the host makes available to descriptors
#[derive(Clone, Default)]
pub struct Capabilities {
    predicates: PredicateRegistry,
    default_functions: HashMap<String, DefaultFn>,
}

impl Capabilities {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validation predicate
    #[must_use]
    pub fn with_predicate<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> Result<bool, String> + Send + Sync + 'static,
    {
        self.predicates.register(name, predicate);
        self
    }

    /// Register a default value producer
    #[must_use]
    pub fn with_default_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn() -> Result<String, String> + Send + Sync + 'static,
    {
        self.default_functions.insert(name.into(), Arc::new(function));
        self
    }

    /// Registered predicates
    #[inline]
    #[must_use]
    pub fn predicates(&self) -> &PredicateRegistry {
        &self.predicates
    }

    /// Look up a default value producer
    #[must_use]
    pub fn default_function(&self, name: &str) -> Option<DefaultFn> {
        self.default_functions.get(name).cloned()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.default_functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Capabilities")
            .field("predicates", &self.predicates)
            .field("default_functions", &names)
            .finish()
    }
}

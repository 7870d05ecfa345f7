//! Placeholder registry
//!
//! Builds [`Placeholder`] records from a [`Descriptor`] and owns them for the
//! lifetime of a page view. Records keep descriptor order.

use crate::capabilities::Capabilities;
use crate::descriptor::{Descriptor, KindDescriptor, PlaceholderDescriptor};
use crate::error::{ParseError, ParseResult};
use crate::model::{
    CheckboxData, DropdownData, Placeholder, PlaceholderKind, TextDefault, TextboxData,
};
use crate::settings::Settings;
use docvar_state::StateStore;
use docvar_validator::{is_valid_value, RuleSetCatalog};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

static NAME_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^[A-Z]([A-Z0-9_]*[A-Z0-9])?$").expect("name shape pattern compiles")
});

/// All placeholders of a page view
#[derive(Debug, Clone, Default)]
pub struct PlaceholderRegistry {
    placeholders: IndexMap<String, Placeholder>,
    settings: Settings,
    catalog: RuleSetCatalog,
}

impl PlaceholderRegistry {
    /// Create empty registry
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            placeholders: IndexMap::new(),
            settings,
            catalog: RuleSetCatalog::with_presets(),
        }
    }

    /// Build every placeholder of a descriptor
    ///
    /// Broken rule-sets and placeholders are skipped. Their errors are
    /// returned next to the registry.
    #[must_use]
    pub fn parse(descriptor: &Descriptor, capabilities: &Capabilities) -> (Self, Vec<ParseError>) {
        let (catalog, validator_errors) =
            RuleSetCatalog::compile(&descriptor.validators, capabilities.predicates());
        let mut errors: Vec<ParseError> = validator_errors.into_iter().map(ParseError::from).collect();

        let mut registry = Self {
            placeholders: IndexMap::new(),
            settings: descriptor.settings.clone(),
            catalog,
        };

        for (index, raw) in descriptor.placeholder_list.iter().enumerate() {
            let result = serde_json::from_value::<PlaceholderDescriptor>(raw.clone())
                .map_err(|source| ParseError::InvalidPlaceholder { index, source })
                .and_then(|d| registry.build(&d, capabilities));
            match result {
                Ok(placeholder) => registry.insert(placeholder).unwrap_or_else(|e| errors.push(e)),
                Err(e) => {
                    warn!("Skipping placeholder: {e}");
                    errors.push(e);
                }
            }
        }

        info!(
            "Parsed {} placeholders ({} problems)",
            registry.placeholders.len(),
            errors.len()
        );
        (registry, errors)
    }

    fn build(
        &self,
        descriptor: &PlaceholderDescriptor,
        capabilities: &Capabilities,
    ) -> ParseResult<Placeholder> {
        let name = descriptor.name.as_str();
        if !NAME_SHAPE.is_match(name) {
            warn!(
                "Placeholder name '{name}' is not recommended, use only uppercase letters, digits and underscores"
            );
        }

        let kind = match &descriptor.kind {
            KindDescriptor::Textbox {
                default_value,
                default_function,
                validators,
            } => {
                let default = match (default_value, default_function) {
                    (Some(value), None) => TextDefault::Static(value.clone()),
                    (None, Some(function)) => TextDefault::Function {
                        name: function.clone(),
                        function: capabilities.default_function(function).ok_or_else(|| {
                            ParseError::UnknownDefaultFunction {
                                name: name.to_string(),
                                function: function.clone(),
                            }
                        })?,
                    },
                    _ => {
                        return Err(ParseError::AmbiguousDefault {
                            name: name.to_string(),
                        })
                    }
                };
                let validators = self
                    .catalog
                    .resolve(validators)
                    .map_err(|e| ParseError::validator(name, e))?;
                if let TextDefault::Static(value) = &default {
                    if !is_valid_value(value, &validators) {
                        let verdict = docvar_validator::evaluate(value, &validators);
                        return Err(ParseError::DefaultRejected {
                            name: name.to_string(),
                            value: value.clone(),
                            message: verdict.message,
                        });
                    }
                }
                PlaceholderKind::Textbox(TextboxData {
                    default,
                    validators,
                })
            }
            KindDescriptor::Checkbox {
                value_checked,
                value_unchecked,
                checked_by_default,
            } => PlaceholderKind::Checkbox(CheckboxData {
                value_checked: value_checked.clone(),
                value_unchecked: value_unchecked.clone(),
                checked_by_default: *checked_by_default,
                current_is_checked: *checked_by_default,
            }),
            KindDescriptor::Dropdown {
                options,
                default_index,
            } => {
                if options.is_empty() {
                    return Err(ParseError::EmptyOptions(name.to_string()));
                }
                if *default_index >= options.len() {
                    return Err(ParseError::DefaultIndexOutOfRange {
                        name: name.to_string(),
                        index: *default_index,
                        len: options.len(),
                    });
                }
                PlaceholderKind::Dropdown(DropdownData {
                    options: options.clone(),
                    default_index: *default_index,
                    current_index: *default_index,
                })
            }
        };

        let mut placeholder = Placeholder::new(name, kind, &self.settings);
        placeholder.description = descriptor.description.clone();
        placeholder.read_only = descriptor.read_only;
        placeholder.allow_inner_html = descriptor.allow_inner_html;
        placeholder.allow_recursive = descriptor.allow_nested;
        debug!(
            "Built {} placeholder '{}' = '{}'",
            placeholder.kind.kind_name(),
            placeholder.name,
            placeholder.current_value
        );
        Ok(placeholder)
    }

    /// Add a placeholder at the end
    ///
    /// # Errors
    /// Returns [`ParseError::DuplicateName`] if the name is taken
    pub fn insert(&mut self, mut placeholder: Placeholder) -> ParseResult<()> {
        if self.placeholders.contains_key(&placeholder.name) {
            return Err(ParseError::DuplicateName(placeholder.name));
        }
        placeholder.order_index = self.placeholders.len();
        self.placeholders.insert(placeholder.name.clone(), placeholder);
        Ok(())
    }

    /// Load persisted state into every placeholder
    pub fn load_state(&mut self, store: &StateStore) {
        for placeholder in self.placeholders.values_mut() {
            placeholder.load_state(store);
        }
    }

    /// Restore every placeholder to its default
    pub fn reset_to_defaults(&mut self) {
        for placeholder in self.placeholders.values_mut() {
            placeholder.reset_to_default();
        }
    }

    /// Global settings
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable global settings
    #[inline]
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Compiled rule-sets
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &RuleSetCatalog {
        &self.catalog
    }

    /// Look up a placeholder
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Placeholder> {
        self.placeholders.get(name)
    }

    /// Look up a placeholder mutably
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Placeholder> {
        self.placeholders.get_mut(name)
    }

    /// Whether a placeholder exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.placeholders.contains_key(name)
    }

    /// Placeholders in descriptor order
    pub fn iter(&self) -> impl Iterator<Item = &Placeholder> {
        self.placeholders.values()
    }

    /// Mutable placeholders in descriptor order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Placeholder> {
        self.placeholders.values_mut()
    }

    /// Names in descriptor order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.placeholders.keys().cloned().collect()
    }

    /// Number of placeholders
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.placeholders.len()
    }

    /// Whether the registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placeholders.is_empty()
    }
}

//! Placeholder data model
//!
//! Shared fields live on [`Placeholder`], everything that depends on the
//! input kind lives in the [`PlaceholderKind`] payload.

use crate::capabilities::DefaultFn;
use crate::settings::Settings;
use crate::token::PlaceholderTokens;
use docvar_state::{StateResult, StateStore};
use docvar_validator::{evaluate, is_valid_value, RuleSet, ValidationStatus, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Value used when a default function fails
pub const EVALUATION_ERROR: &str = "EVALUATION_ERROR";

/// Default of a textbox
#[derive(Clone)]
pub enum TextDefault {
    /// Literal value
    Static(String),
    /// Host function producing the value
    Function {
        /// Registration name
        name: String,
        /// The producer
        function: DefaultFn,
    },
}

impl TextDefault {
    /// Produce the default value
    ///
    /// A failing or panicking function yields [`EVALUATION_ERROR`].
    #[must_use]
    pub fn produce(&self) -> String {
        match self {
            Self::Static(value) => value.clone(),
            Self::Function { name, function } => {
                match catch_unwind(AssertUnwindSafe(|| function())) {
                    Ok(Ok(value)) => {
                        debug!("Evaluated default function '{name}' -> '{value}'");
                        value
                    }
                    Ok(Err(message)) => {
                        warn!("Default function '{name}' failed: {message}");
                        EVALUATION_ERROR.to_string()
                    }
                    Err(_) => {
                        warn!("Default function '{name}' panicked");
                        EVALUATION_ERROR.to_string()
                    }
                }
            }
        }
    }
}

impl fmt::Debug for TextDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Function { name, .. } => f.debug_struct("Function").field("name", name).finish(),
        }
    }
}

/// Free text input
#[derive(Debug, Clone)]
pub struct TextboxData {
    /// Default value
    pub default: TextDefault,
    /// Attached rule-sets in declaration order
    pub validators: Vec<Arc<RuleSet>>,
}

/// Boolean toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckboxData {
    /// Value while checked
    pub value_checked: String,
    /// Value while unchecked
    pub value_unchecked: String,
    /// Initial state
    pub checked_by_default: bool,
    /// Current state
    pub current_is_checked: bool,
}

impl CheckboxData {
    /// Value belonging to a state
    #[must_use]
    pub fn value_for(&self, checked: bool) -> &str {
        if checked {
            &self.value_checked
        } else {
            &self.value_unchecked
        }
    }

    /// Persist a new state
    pub fn store(&mut self, name: &str, store: &mut StateStore, checked: bool) -> StateResult<()> {
        store.store_checked(name, checked)?;
        self.current_is_checked = checked;
        Ok(())
    }
}

/// One entry of a dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    /// Label shown to the user
    pub display_name: String,
    /// Substituted value
    pub value: String,
}

/// Enumerated choice
///
/// `options` must hold at least one entry and both indices must point into
/// it. The registry refuses dropdowns without options, so only code building
/// this struct by hand can break that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownData {
    /// Options in display order, never empty
    pub options: Vec<DropdownOption>,
    /// Initial selection
    pub default_index: usize,
    /// Current selection
    pub current_index: usize,
}

impl DropdownData {
    /// Value of the current selection
    #[must_use]
    pub fn current_value(&self) -> &str {
        &self.options[self.current_index].value
    }

    /// Index reached by moving `delta` steps from the current one, wrapping around
    ///
    /// # Panics
    /// If `options` is empty
    #[must_use]
    pub fn wrapped_index(&self, delta: isize) -> usize {
        debug_assert!(!self.options.is_empty(), "dropdown without options");
        let len = self.options.len() as isize;
        (self.current_index as isize + delta).rem_euclid(len) as usize
    }

    /// Persist a new selection
    ///
    /// # Errors
    /// Returns [`docvar_state::StateError::IndexOutOfRange`] for indices outside the options
    pub fn store(&mut self, name: &str, store: &mut StateStore, index: usize) -> StateResult<()> {
        store.store_index(name, index, self.options.len())?;
        self.current_index = index;
        Ok(())
    }
}

/// Kind specific payload
#[derive(Debug, Clone)]
pub enum PlaceholderKind {
    /// Free text
    Textbox(TextboxData),
    /// Boolean toggle
    Checkbox(CheckboxData),
    /// Enumerated choice
    Dropdown(DropdownData),
}

impl PlaceholderKind {
    /// Discriminator as written in descriptors
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Textbox(_) => "textbox",
            Self::Checkbox(_) => "checkbox",
            Self::Dropdown(_) => "dropdown",
        }
    }
}

/// A named, user-configurable value
#[derive(Debug, Clone)]
pub struct Placeholder {
    /// Unique name, also the token search fragment
    pub name: String,
    /// Description shown next to inputs
    pub description: String,
    /// Kind payload
    pub kind: PlaceholderKind,
    /// No adapter may change the value
    pub read_only: bool,
    /// Enables the escaped-markup strategy and attribute replacement
    pub allow_inner_html: bool,
    /// Value may reference other placeholders
    pub allow_recursive: bool,
    /// Raw value
    pub current_value: String,
    /// Value with all dependencies substituted
    pub expanded_value: String,
    /// Lower bound of occurrences on the page
    pub count_on_page: usize,
    /// Position in the descriptor
    pub order_index: usize,
    /// Some occurrence cannot be refreshed in place
    pub reload_on_change: bool,
    /// Compiled token patterns
    pub tokens: PlaceholderTokens,
}

impl Placeholder {
    /// Create placeholder with its default value
    #[must_use]
    pub fn new(name: impl Into<String>, kind: PlaceholderKind, settings: &Settings) -> Self {
        let name = name.into();
        let tokens = PlaceholderTokens::new(&name, settings);
        let mut placeholder = Self {
            name,
            description: String::new(),
            kind,
            read_only: false,
            allow_inner_html: false,
            allow_recursive: true,
            current_value: String::new(),
            expanded_value: String::new(),
            count_on_page: 0,
            order_index: 0,
            reload_on_change: false,
            tokens,
        };
        placeholder.reset_to_default();
        placeholder
    }

    /// Default raw value
    #[must_use]
    pub fn default_value(&self) -> String {
        match &self.kind {
            PlaceholderKind::Textbox(data) => data.default.produce(),
            PlaceholderKind::Checkbox(data) => data.value_for(data.checked_by_default).to_string(),
            PlaceholderKind::Dropdown(data) => data.options[data.default_index].value.clone(),
        }
    }

    /// Restore default selection and value
    ///
    /// The expanded value is reset as well; a graph recompute fills it in.
    pub fn reset_to_default(&mut self) {
        match &mut self.kind {
            PlaceholderKind::Textbox(_) => {}
            PlaceholderKind::Checkbox(data) => data.current_is_checked = data.checked_by_default,
            PlaceholderKind::Dropdown(data) => data.current_index = data.default_index,
        }
        self.current_value = self.default_value();
        self.expanded_value = self.current_value.clone();
    }

    /// Replace the in-memory state with what the store holds
    ///
    /// Missing or corrupt entries fall back to the default.
    pub fn load_state(&mut self, store: &StateStore) {
        self.current_value = match &mut self.kind {
            PlaceholderKind::Textbox(data) => store
                .load_text(&self.name)
                .unwrap_or_else(|| data.default.produce()),
            PlaceholderKind::Checkbox(data) => {
                data.current_is_checked = store
                    .load_checked(&self.name)
                    .unwrap_or(data.checked_by_default);
                data.value_for(data.current_is_checked).to_string()
            }
            PlaceholderKind::Dropdown(data) => {
                data.current_index = store
                    .load_index(&self.name, data.options.len())
                    .unwrap_or(data.default_index);
                data.current_value().to_string()
            }
        };
        self.expanded_value = self.current_value.clone();
    }

    /// Refresh `current_value` from the kind payload after a selection change
    pub fn sync_value_from_kind(&mut self) {
        match &self.kind {
            PlaceholderKind::Textbox(_) => {}
            PlaceholderKind::Checkbox(data) => {
                self.current_value = data.value_for(data.current_is_checked).to_string();
            }
            PlaceholderKind::Dropdown(data) => {
                self.current_value = data.current_value().to_string();
            }
        }
    }

    /// Validation verdict for a candidate value
    #[must_use]
    pub fn evaluate(&self, value: &str) -> Verdict {
        match &self.kind {
            PlaceholderKind::Textbox(data) => evaluate(value, &data.validators),
            PlaceholderKind::Checkbox(_) | PlaceholderKind::Dropdown(_) => Verdict {
                status: ValidationStatus::NoValidator,
                message: String::new(),
            },
        }
    }

    /// Acceptance check ignoring warnings
    #[must_use]
    pub fn is_valid_value(&self, value: &str) -> bool {
        match &self.kind {
            PlaceholderKind::Textbox(data) => is_valid_value(value, &data.validators),
            PlaceholderKind::Checkbox(_) | PlaceholderKind::Dropdown(_) => true,
        }
    }

    /// Appears at least once on the page
    #[inline]
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.count_on_page > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvar_state::MemoryStorage;

    fn dropdown() -> Placeholder {
        Placeholder::new(
            "PROTOCOL",
            PlaceholderKind::Dropdown(DropdownData {
                options: ["http", "https", "ftp"]
                    .into_iter()
                    .map(|v| DropdownOption {
                        display_name: v.to_uppercase(),
                        value: v.to_string(),
                    })
                    .collect(),
                default_index: 1,
                current_index: 0,
            }),
            &Settings::default(),
        )
    }

    #[test]
    fn new_applies_defaults() {
        let p = dropdown();
        assert_eq!(p.current_value, "https");
        assert_eq!(p.expanded_value, "https");
    }

    #[test]
    fn dropdown_state_round_trip() {
        let mut store = StateStore::in_memory();
        let mut p = dropdown();
        if let PlaceholderKind::Dropdown(data) = &mut p.kind {
            data.store("PROTOCOL", &mut store, 2).unwrap();
            assert!(data.store("PROTOCOL", &mut store, 3).is_err());
        }

        let mut reloaded = dropdown();
        reloaded.load_state(&store);
        assert_eq!(reloaded.current_value, "ftp");
        assert!(matches!(
            reloaded.kind,
            PlaceholderKind::Dropdown(DropdownData { current_index: 2, .. })
        ));
    }

    #[test]
    fn dropdown_wraps_around() {
        let p = dropdown();
        let PlaceholderKind::Dropdown(data) = &p.kind else {
            panic!("dropdown expected");
        };
        assert_eq!(data.wrapped_index(1), 2);
        assert_eq!(data.wrapped_index(2), 0);
        assert_eq!(data.wrapped_index(-2), 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "dropdown without options")]
    fn wrapping_needs_options() {
        let data = DropdownData {
            options: Vec::new(),
            default_index: 0,
            current_index: 0,
        };
        let _ = data.wrapped_index(1);
    }

    #[test]
    fn checkbox_load_falls_back_on_corruption() {
        let mut p = Placeholder::new(
            "TLS",
            PlaceholderKind::Checkbox(CheckboxData {
                value_checked: "on".to_string(),
                value_unchecked: "off".to_string(),
                checked_by_default: true,
                current_is_checked: false,
            }),
            &Settings::default(),
        );
        assert_eq!(p.current_value, "on");

        let mut store = StateStore::in_memory();
        store.store_checked("TLS", false).unwrap();
        p.load_state(&store);
        assert_eq!(p.current_value, "off");

        let corrupt = StateStore::new(Box::new(MemoryStorage::with_entries([(
            store.checked_key("TLS"),
            "yes",
        )])));
        p.load_state(&corrupt);
        assert_eq!(p.current_value, "on");
        assert!(matches!(
            p.kind,
            PlaceholderKind::Checkbox(CheckboxData {
                current_is_checked: true,
                ..
            })
        ));
    }

    #[test]
    fn failing_default_function_yields_marker() {
        let failing = TextDefault::Function {
            name: "broken".to_string(),
            function: Arc::new(|| -> Result<String, String> { Err("nope".to_string()) }),
        };
        assert_eq!(failing.produce(), EVALUATION_ERROR);

        let panicking = TextDefault::Function {
            name: "panics".to_string(),
            function: Arc::new(|| -> Result<String, String> { panic!("bug") }),
        };
        assert_eq!(panicking.produce(), EVALUATION_ERROR);
    }

    #[test]
    fn textbox_falls_back_to_default_for_empty_text() {
        let mut store = StateStore::in_memory();
        let mut p = Placeholder::new(
            "USER",
            PlaceholderKind::Textbox(TextboxData {
                default: TextDefault::Static("admin".to_string()),
                validators: Vec::new(),
            }),
            &Settings::default(),
        );
        store.store_text("USER", "").unwrap();
        p.load_state(&store);
        assert_eq!(p.current_value, "admin");
        assert_eq!(p.evaluate("x").status, ValidationStatus::NoValidator);
    }
}

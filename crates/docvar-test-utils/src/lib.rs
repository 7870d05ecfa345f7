//! Testing utilities for the docvar workspace
//!
//! Placeholder builders, registries and page fixtures shared by the crates'
//! test suites.

#![allow(missing_docs)]

use docvar_registry::{
    CheckboxData, DropdownData, DropdownOption, Placeholder, PlaceholderKind, PlaceholderRegistry,
    Settings, TextDefault, TextboxData,
};
use docvar_state::StateStore;
use docvar_validator::preset;

/// Descriptor exercising every kind, a custom rule-set and nested values
pub const SAMPLE_DESCRIPTOR: &str = r#"
settings:
  delay_millis: 0
validators:
  - id: lowercase
    display_name: Lowercase
    rules:
      - severity: error
        regex: "[A-Z]"
        should_match: false
        error_message: Contains uppercase letters
placeholder_list:
  - name: HOST
    type: textbox
    description: Server host name
    default_value: example.com
    validators: [domain, lowercase]
  - name: TLS
    type: checkbox
    value_checked: https
    value_unchecked: http
    checked_by_default: true
  - name: PORT
    type: dropdown
    options:
      - display_name: Default
        value: "443"
      - display_name: Alternative
        value: "8443"
  - name: URL
    type: textbox
    default_value: xTLSx://xHOSTx:xPORTx/
    read_only: true
"#;

/// Page using the placeholders of [`SAMPLE_DESCRIPTOR`]
pub const SAMPLE_PAGE: &str = r#"<html><head><title>Setup for xHOSTx</title></head><body>
<h1>Connecting to xHOSTx</h1>
<p>Open <a href="xURLx">dURLd</a> in your browser.</p>
<pre><code>curl xURLx</code></pre>
</body></html>"#;

pub fn textbox(name: &str, value: &str) -> Placeholder {
    Placeholder::new(
        name,
        PlaceholderKind::Textbox(TextboxData {
            default: TextDefault::Static(value.to_string()),
            validators: Vec::new(),
        }),
        &Settings::default(),
    )
}

/// Textbox guarded by a built-in rule-set
pub fn validated_textbox(name: &str, value: &str, preset_id: &str) -> Placeholder {
    let mut placeholder = textbox(name, value);
    if let PlaceholderKind::Textbox(data) = &mut placeholder.kind {
        data.validators = preset(preset_id).into_iter().collect();
    }
    placeholder
}

/// Checkbox that starts checked
pub fn checkbox(name: &str, checked: &str, unchecked: &str) -> Placeholder {
    Placeholder::new(
        name,
        PlaceholderKind::Checkbox(CheckboxData {
            value_checked: checked.to_string(),
            value_unchecked: unchecked.to_string(),
            checked_by_default: true,
            current_is_checked: true,
        }),
        &Settings::default(),
    )
}

/// Dropdown whose option labels equal their values
pub fn dropdown(name: &str, values: &[&str], default_index: usize) -> Placeholder {
    Placeholder::new(
        name,
        PlaceholderKind::Dropdown(DropdownData {
            options: values
                .iter()
                .map(|v| DropdownOption {
                    display_name: (*v).to_string(),
                    value: (*v).to_string(),
                })
                .collect(),
            default_index,
            current_index: default_index,
        }),
        &Settings::default(),
    )
}

/// Registry with default settings holding `placeholders` in order
pub fn registry_with(placeholders: Vec<Placeholder>) -> PlaceholderRegistry {
    let mut registry = PlaceholderRegistry::new(Settings::default());
    for placeholder in placeholders {
        registry.insert(placeholder).unwrap();
    }
    registry
}

pub fn memory_store() -> StateStore {
    StateStore::in_memory()
}

//! Input descriptor format
//!
//! A descriptor carries three top-level keys: `settings`, `validators` and
//! `placeholder_list`. Placeholder entries are kept as raw values until the
//! registry builds them one by one, so a malformed entry never hides the
//! others.

use crate::error::{ParseError, ParseResult};
use crate::model::DropdownOption;
use crate::settings::Settings;
use docvar_validator::RuleSetDescriptor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Whole input document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Descriptor {
    /// Global settings
    pub settings: Settings,
    /// Custom rule-sets
    pub validators: Vec<RuleSetDescriptor>,
    /// Placeholder entries in display order
    pub placeholder_list: Vec<serde_json::Value>,
}

impl Descriptor {
    /// Parse a YAML document
    pub fn from_yaml_str(source: &str) -> ParseResult<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Parse a JSON document
    pub fn from_json_str(source: &str) -> ParseResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Read a descriptor file, choosing the format by extension
    ///
    /// `.json` files are read as JSON, everything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> ParseResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| ParseError::io_error(path, e))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&source),
            _ => Self::from_yaml_str(&source),
        }
    }
}

/// Shape of a single placeholder entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderDescriptor {
    /// Unique name
    pub name: String,

    /// Description shown next to inputs
    #[serde(default)]
    pub description: String,

    /// No adapter may change the value
    #[serde(default)]
    pub read_only: bool,

    /// Enables the escaped-markup strategy and attribute replacement
    #[serde(default, alias = "replace_everywhere")]
    pub allow_inner_html: bool,

    /// Value may reference other placeholders
    #[serde(default = "default_true", alias = "allow_recursive")]
    pub allow_nested: bool,

    /// Kind payload
    #[serde(flatten)]
    pub kind: KindDescriptor,
}

/// Kind specific fields, tagged by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KindDescriptor {
    /// Free text
    Textbox {
        /// Literal default
        #[serde(default)]
        default_value: Option<String>,
        /// Name of a host default function
        #[serde(default)]
        default_function: Option<String>,
        /// Attached rule-set ids
        #[serde(default)]
        validators: Vec<String>,
    },
    /// Boolean toggle
    Checkbox {
        /// Value while checked
        value_checked: String,
        /// Value while unchecked
        value_unchecked: String,
        /// Initial state
        #[serde(default)]
        checked_by_default: bool,
    },
    /// Enumerated choice
    Dropdown {
        /// Options in display order
        options: Vec<DropdownOption>,
        /// Initial selection
        #[serde(default)]
        default_index: usize,
    },
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_all_kinds() {
        let yaml = r#"
settings:
  delay_millis: 250
placeholder_list:
  - name: HOST
    type: textbox
    default_value: example.com
    validators: [domain]
  - name: TLS
    type: checkbox
    value_checked: https
    value_unchecked: http
    checked_by_default: true
  - name: PORT
    type: dropdown
    allow_nested: false
    options:
      - display_name: Default
        value: "443"
      - display_name: Alternative
        value: "8443"
"#;
        let descriptor = Descriptor::from_yaml_str(yaml).unwrap();
        assert_eq!(descriptor.settings.delay_millis, 250);
        assert_eq!(descriptor.placeholder_list.len(), 3);

        let port: PlaceholderDescriptor =
            serde_json::from_value(descriptor.placeholder_list[2].clone()).unwrap();
        assert!(!port.allow_nested);
        assert_eq!(
            port.kind,
            KindDescriptor::Dropdown {
                options: vec![
                    DropdownOption {
                        display_name: "Default".to_string(),
                        value: "443".to_string(),
                    },
                    DropdownOption {
                        display_name: "Alternative".to_string(),
                        value: "8443".to_string(),
                    },
                ],
                default_index: 0,
            }
        );

        let host: PlaceholderDescriptor =
            serde_json::from_value(descriptor.placeholder_list[0].clone()).unwrap();
        assert!(host.allow_nested);
        assert!(!host.read_only);
    }

    #[test]
    fn json_and_empty_documents() {
        let descriptor = Descriptor::from_json_str(r#"{"placeholder_list": []}"#).unwrap();
        assert!(descriptor.placeholder_list.is_empty());
        assert_eq!(descriptor.settings, Settings::default());

        assert!(Descriptor::from_json_str("{").is_err());
    }

    #[test]
    fn from_path_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("placeholders.json");
        std::fs::write(&json, r#"{"settings": {"debug": true}}"#).unwrap();
        assert!(Descriptor::from_path(&json).unwrap().settings.debug);

        let yaml = dir.path().join("placeholders.yml");
        std::fs::write(&yaml, "settings:\n  debug: true\n").unwrap();
        assert!(Descriptor::from_path(&yaml).unwrap().settings.debug);

        let missing = dir.path().join("missing.yml");
        assert!(matches!(
            Descriptor::from_path(missing),
            Err(ParseError::Io { .. })
        ));
    }
}

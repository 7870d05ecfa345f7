//! Global settings of a descriptor
//!
//! Token syntax per substitution class, startup delay and the behaviour
//! toggles end users may override.

use docvar_state::{StateResult, StateStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Substitution class of a token
///
/// Each class has its own prefix/suffix pair and maps to one replacement
/// strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    /// Replaced as plain text, a change requires a reload
    Normal,
    /// Replaced as plain text, keeps the value of the first pass
    Static,
    /// Replaced inside markup after escaping the value
    Html,
    /// Always live-bound
    Dynamic,
    /// Live-bound and marked for an inline editor
    Editable,
}

impl TokenClass {
    /// All classes in substitution order
    pub const ALL: [Self; 5] = [
        Self::Dynamic,
        Self::Editable,
        Self::Html,
        Self::Static,
        Self::Normal,
    ];
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Static => "static",
            Self::Html => "html",
            Self::Dynamic => "dynamic",
            Self::Editable => "editable",
        };
        write!(f, "{s}")
    }
}

/// Behaviour toggle that end users may override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviourSetting {
    /// Editors on live-bound elements
    InlineEditors,
    /// Icons next to inline editors
    InlineEditorIcons,
    /// Apply textbox edits when focus leaves the input
    ApplyChangeOnFocusChange,
}

impl BehaviourSetting {
    /// All toggles
    pub const ALL: [Self; 3] = [
        Self::InlineEditors,
        Self::InlineEditorIcons,
        Self::ApplyChangeOnFocusChange,
    ];

    /// Key in the settings namespace of the state store
    #[must_use]
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::InlineEditors => "INLINE_EDITORS",
            Self::InlineEditorIcons => "INLINE_EDITOR_ICONS",
            Self::ApplyChangeOnFocusChange => "APPLY_CHANGE_ON_FOCUS_CHANGE",
        }
    }
}

/// Global settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Verbose logging
    pub debug: bool,
    /// `<0` immediate, `0` on load, `>0` on load plus N milliseconds
    pub delay_millis: i64,
    /// Prefix of normal tokens
    pub normal_prefix: String,
    /// Suffix of normal tokens
    pub normal_suffix: String,
    /// Prefix of static tokens
    pub static_prefix: String,
    /// Suffix of static tokens
    pub static_suffix: String,
    /// Prefix of html tokens
    pub html_prefix: String,
    /// Suffix of html tokens
    pub html_suffix: String,
    /// Prefix of dynamic tokens
    pub dynamic_prefix: String,
    /// Suffix of dynamic tokens
    pub dynamic_suffix: String,
    /// Prefix of editable tokens
    pub editable_prefix: String,
    /// Suffix of editable tokens
    pub editable_suffix: String,
    /// Editors on live-bound elements
    pub inline_editors: bool,
    /// Icons next to inline editors
    pub inline_editor_icons: bool,
    /// Apply textbox edits when focus leaves the input
    pub apply_change_on_focus_change: bool,
    /// Namespace prefix of every state key
    pub storage_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            delay_millis: 0,
            normal_prefix: "x".to_string(),
            normal_suffix: "x".to_string(),
            static_prefix: "s".to_string(),
            static_suffix: "s".to_string(),
            html_prefix: "i".to_string(),
            html_suffix: "i".to_string(),
            dynamic_prefix: "d".to_string(),
            dynamic_suffix: "d".to_string(),
            editable_prefix: "e".to_string(),
            editable_suffix: "e".to_string(),
            inline_editors: true,
            inline_editor_icons: true,
            apply_change_on_focus_change: true,
            storage_prefix: docvar_state::DEFAULT_PREFIX.to_string(),
        }
    }
}

impl Settings {
    /// Prefix and suffix of a token class
    #[must_use]
    pub fn affixes(&self, class: TokenClass) -> (&str, &str) {
        match class {
            TokenClass::Normal => (&self.normal_prefix, &self.normal_suffix),
            TokenClass::Static => (&self.static_prefix, &self.static_suffix),
            TokenClass::Html => (&self.html_prefix, &self.html_suffix),
            TokenClass::Dynamic => (&self.dynamic_prefix, &self.dynamic_suffix),
            TokenClass::Editable => (&self.editable_prefix, &self.editable_suffix),
        }
    }

    /// Current value of a behaviour toggle
    #[must_use]
    pub fn behaviour(&self, setting: BehaviourSetting) -> bool {
        match setting {
            BehaviourSetting::InlineEditors => self.inline_editors,
            BehaviourSetting::InlineEditorIcons => self.inline_editor_icons,
            BehaviourSetting::ApplyChangeOnFocusChange => self.apply_change_on_focus_change,
        }
    }

    fn behaviour_mut(&mut self, setting: BehaviourSetting) -> &mut bool {
        match setting {
            BehaviourSetting::InlineEditors => &mut self.inline_editors,
            BehaviourSetting::InlineEditorIcons => &mut self.inline_editor_icons,
            BehaviourSetting::ApplyChangeOnFocusChange => &mut self.apply_change_on_focus_change,
        }
    }

    /// Apply user overrides persisted in the state store
    pub fn apply_overrides(&mut self, store: &StateStore) {
        for setting in BehaviourSetting::ALL {
            if let Some(value) = store.load_bool_setting(setting.storage_key()) {
                debug!("User override {} = {value}", setting.storage_key());
                *self.behaviour_mut(setting) = value;
            }
        }
    }

    /// Change a behaviour toggle and persist the override
    pub fn set_override(
        &mut self,
        store: &mut StateStore,
        setting: BehaviourSetting,
        value: bool,
    ) -> StateResult<()> {
        store.store_bool_setting(setting.storage_key(), value)?;
        *self.behaviour_mut(setting) = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let settings: Settings = serde_yaml::from_str("debug: true\ndynamic_prefix: '{{'").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.affixes(TokenClass::Dynamic), ("{{", "d"));
        assert_eq!(settings.affixes(TokenClass::Normal), ("x", "x"));
        assert!(settings.inline_editors);
        assert_eq!(settings.storage_prefix, "PLACEHOLDER_");
    }

    #[test]
    fn overrides_take_precedence() {
        let mut store = StateStore::in_memory();
        let mut settings = Settings::default();
        settings
            .set_override(&mut store, BehaviourSetting::InlineEditors, false)
            .unwrap();
        assert!(!settings.inline_editors);

        let mut fresh = Settings::default();
        fresh.apply_overrides(&store);
        assert!(!fresh.inline_editors);
        assert!(fresh.inline_editor_icons);
    }
}

//! Live-bound elements
//!
//! A binding is `<span class="placeholder-value" data-placeholder="NAME">`.
//! The table of bindings is always rebuilt by scanning the document, so it
//! never disagrees with what is actually on the page.

use crate::dom::{Document, NodeId};
use docvar_registry::{Placeholder, PlaceholderKind};
use std::collections::BTreeMap;

/// Class carried by every binding element
pub const BINDING_CLASS: &str = "placeholder-value";
/// Attribute holding the placeholder name
pub const BINDING_ATTRIBUTE: &str = "data-placeholder";
/// Binding asks for an inline editor
pub const EDITOR_REQUEST_CLASS: &str = "inline-editor-requested";

/// Any active inline editor
pub const ANY_EDITOR_CLASS: &str = "placeholder-value-any";
/// Active textbox editor
pub const TEXTBOX_EDITOR_CLASS: &str = "placeholder-value-editable";
/// Active checkbox editor
pub const CHECKBOX_EDITOR_CLASS: &str = "placeholder-value-checkbox";
/// Active dropdown editor
pub const DROPDOWN_EDITOR_CLASS: &str = "placeholder-value-dropdown";

/// Classes reflecting the validation verdict of a textbox editor
pub const VALIDATION_CLASSES: [&str; 4] = [
    "validation-ok",
    "validation-warn",
    "validation-error",
    "validation-none",
];

/// Whether `id` is a binding element
#[must_use]
pub fn is_binding(doc: &Document, id: NodeId) -> bool {
    doc.tag(id).is_some()
        && doc.has_class(id, BINDING_CLASS)
        && doc.attribute(id, BINDING_ATTRIBUTE).is_some()
}

/// Bindings below `root` that are not inside another binding
pub(crate) fn outermost_bindings(doc: &Document, root: NodeId) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack: Vec<NodeId> = doc.children(root).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if is_binding(doc, id) {
            found.push(id);
        } else {
            stack.extend(doc.children(id).iter().rev().copied());
        }
    }
    found
}

/// Binding elements per placeholder name, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingTable {
    elements: BTreeMap<String, Vec<NodeId>>,
}

impl BindingTable {
    /// Collect every binding below `root`
    #[must_use]
    pub fn scan(doc: &Document, root: NodeId) -> Self {
        let mut elements: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        for id in doc.find_elements(root, is_binding) {
            if let Some(name) = doc.attribute(id, BINDING_ATTRIBUTE) {
                elements.entry(name.to_string()).or_default().push(id);
            }
        }
        Self { elements }
    }

    /// Binding elements of one placeholder
    #[must_use]
    pub fn elements(&self, name: &str) -> &[NodeId] {
        self.elements.get(name).map_or(&[], Vec::as_slice)
    }

    /// Names with at least one binding
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    /// Whether `name` has a binding
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    /// Total number of binding elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.values().map(Vec::len).sum()
    }

    /// No bindings at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All binding elements with their names
    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.elements
            .iter()
            .flat_map(|(name, ids)| ids.iter().map(move |&id| (name.as_str(), id)))
    }
}

/// Reflect the placeholder state on an active inline editor
///
/// Textbox editors get a `validation-*` class and the verdict message as
/// tooltip, checkbox editors get `checked` or `unchecked`. Elements without
/// an active editor are left alone.
pub fn apply_editor_state(doc: &mut Document, element: NodeId, placeholder: &Placeholder) {
    match &placeholder.kind {
        PlaceholderKind::Textbox(_) if doc.has_class(element, TEXTBOX_EDITOR_CLASS) => {
            let verdict = placeholder.evaluate(&placeholder.current_value);
            for class in VALIDATION_CLASSES {
                doc.remove_class(element, class);
            }
            doc.add_class(element, &format!("validation-{}", verdict.status.css_suffix()));
            doc.set_attribute(element, "title", &verdict.message);
        }
        PlaceholderKind::Checkbox(data) if doc.has_class(element, CHECKBOX_EDITOR_CLASS) => {
            let (add, remove) = if data.current_is_checked {
                ("checked", "unchecked")
            } else {
                ("unchecked", "checked")
            };
            doc.add_class(element, add);
            doc.remove_class(element, remove);
        }
        _ => {}
    }
}

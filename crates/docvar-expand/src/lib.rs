//! Page expansion
//!
//! Substitutes placeholder tokens in a document and keeps live-bound
//! occurrences refreshable without another scan.
//!
//! # Core Concepts
//!
//! - [`Document`]: arena tree parsed from and serialized back to HTML
//! - [`Strategy`]: direct, escaped markup or live-bound substitution per token class
//! - [`BindingTable`]: binding elements per placeholder, rebuilt by scanning
//! - [`replace_in_subtree`] / [`refresh`]: full pass and in-place update

#![warn(unreachable_pub)]

mod bindings;
mod dom;
mod error;
mod expand;
mod html;
mod strategy;

pub use bindings::{
    apply_editor_state, is_binding, BindingTable, ANY_EDITOR_CLASS, BINDING_ATTRIBUTE,
    BINDING_CLASS, CHECKBOX_EDITOR_CLASS, DROPDOWN_EDITOR_CLASS, EDITOR_REQUEST_CLASS,
    TEXTBOX_EDITOR_CLASS, VALIDATION_CLASSES,
};
pub use dom::{Document, NodeData, NodeId};
pub use error::{ExpandError, ExpandResult};
pub use expand::{refresh, replace_in_subtree, ExpansionReport};
pub use html::{decode_entities, escape_html, is_raw_text_element, is_void_element};
pub use strategy::Strategy;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

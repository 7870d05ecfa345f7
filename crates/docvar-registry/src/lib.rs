//! Placeholder registry
//!
//! Parses the input descriptor into [`Placeholder`] records and owns them
//! for the lifetime of a page view.
//!
//! # Core Concepts
//!
//! - [`Descriptor`]: settings, custom rule-sets and raw placeholder entries
//! - [`Placeholder`]: shared fields plus a closed [`PlaceholderKind`] payload
//! - [`TokenPattern`]: escaped `prefix + NAME + suffix` search pattern
//! - [`Capabilities`]: host predicates and default functions referenced by name

#![warn(unreachable_pub)]

mod capabilities;
mod descriptor;
mod error;
mod model;
mod registry;
mod settings;
mod token;

pub use capabilities::{Capabilities, DefaultFn};
pub use descriptor::{Descriptor, KindDescriptor, PlaceholderDescriptor};
pub use error::{ParseError, ParseResult, TokenError};
pub use model::{
    CheckboxData, DropdownData, DropdownOption, Placeholder, PlaceholderKind, TextDefault,
    TextboxData, EVALUATION_ERROR,
};
pub use registry::PlaceholderRegistry;
pub use settings::{BehaviourSetting, Settings, TokenClass};
pub use token::{PlaceholderTokens, TokenPattern};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

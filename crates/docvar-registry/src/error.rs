//! Error types for descriptor parsing and token substitution

use docvar_validator::ValidatorError;
use std::path::PathBuf;

/// Errors raised while reading a descriptor or building a placeholder
///
/// Placeholder-level variants only abort the construction of that one
/// placeholder; the rest of the descriptor still loads.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// IO error while reading the descriptor file
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Descriptor is not valid YAML
    #[error("invalid YAML descriptor: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Descriptor is not valid JSON
    #[error("invalid JSON descriptor: {0}")]
    Json(#[from] serde_json::Error),

    /// Placeholder entry does not match any known shape
    #[error("invalid placeholder descriptor #{index}: {source}")]
    InvalidPlaceholder {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Second placeholder with an already used name
    #[error("placeholder '{0}' is defined more than once")]
    DuplicateName(String),

    /// Textbox defines both or neither of `default_value` and `default_function`
    #[error("textbox '{name}' must define exactly one of 'default_value' and 'default_function'")]
    AmbiguousDefault { name: String },

    /// `default_function` names a function the host never registered
    #[error("textbox '{name}' references unknown default function '{function}'")]
    UnknownDefaultFunction { name: String, function: String },

    /// Dropdown without options
    #[error("dropdown '{0}' needs at least one option")]
    EmptyOptions(String),

    /// Dropdown default index outside of its options
    #[error("dropdown '{name}' has default_index {index}, but only {len} options")]
    DefaultIndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },

    /// Static default value fails the placeholder's validators
    #[error("default value '{value}' of '{name}' failed validation:\n{message}")]
    DefaultRejected {
        name: String,
        value: String,
        message: String,
    },

    /// Rule-set problem, either global or attached to one placeholder
    #[error("validator error{}: {source}", .name.as_ref().map(|n| format!(" in '{n}'")).unwrap_or_default())]
    Validator {
        name: Option<String>,
        #[source]
        source: ValidatorError,
    },
}

impl ParseError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a validator error attached to a placeholder
    pub fn validator(name: impl Into<String>, source: ValidatorError) -> Self {
        Self::Validator {
            name: Some(name.into()),
            source,
        }
    }
}

impl From<ValidatorError> for ParseError {
    fn from(source: ValidatorError) -> Self {
        Self::Validator { name: None, source }
    }
}

/// Result type alias for parsing
pub type ParseResult<T> = Result<T, ParseError>;

/// Misuse of a token pattern
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Substitution requested with a pattern that only finds the first match
    #[error("token pattern '{0}' is not global and cannot be used for substitution")]
    NotGlobal(String),
}

//! Error types for page expansion

use docvar_registry::TokenError;
use thiserror::Error;

/// Result type for expansion operations
pub type ExpandResult<T> = Result<T, ExpandError>;

/// Errors raised while substituting placeholders into a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// Substitution attempted with a pattern that is not global
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Refresh requested for a name the registry does not know
    #[error("unknown placeholder: {0}")]
    UnknownPlaceholder(String),

    /// Combined token pattern could not be compiled
    #[error("cannot build token matcher: {0}")]
    Matcher(String),

    /// Node id does not belong to the document
    #[error("node {0} does not exist in this document")]
    UnknownNode(usize),
}

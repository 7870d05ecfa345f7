//! Error types for the engine
//!
//! Every change operation fails with an [`EngineError`]. Only
//! [`EngineError::CycleRepaired`] leaves the engine changed: the cycle has
//! been broken and the page refreshed before it is reported, and the error
//! carries the outcome of that refresh.

use crate::engine::ChangeOutcome;
use docvar_expand::ExpandError;
use docvar_graph::GraphError;
use docvar_registry::ParseError;
use docvar_state::StateError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Name is not registered
    #[error("unknown placeholder: {0}")]
    UnknownPlaceholder(String),

    /// Placeholder may not be changed
    #[error("placeholder '{0}' is read-only")]
    ReadOnly(String),

    /// Operation does not fit the placeholder kind
    #[error("placeholder '{name}' is a {actual}, expected a {expected}")]
    KindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Value refused by the attached rule-sets
    #[error("value '{value}' rejected for '{name}': {message}")]
    ValidationRejected {
        name: String,
        value: String,
        message: String,
    },

    /// Descriptor could not be read at all
    #[error("descriptor error: {0}")]
    Descriptor(#[from] ParseError),

    /// State store failure
    #[error("state error: {0}")]
    Persistence(#[from] StateError),

    /// Dependency graph failure
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// A change introduced a cycle that was broken before the refresh
    #[error("graph error: {source}")]
    CycleRepaired {
        source: GraphError,
        outcome: ChangeOutcome,
    },

    /// Page expansion failure
    #[error("expansion error: {0}")]
    Expand(#[from] ExpandError),

    /// Operation needs an attached page
    #[error("no page attached")]
    NoPage,
}

impl EngineError {
    /// Whether the engine repaired itself before reporting
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Graph(e) => e.is_recoverable(),
            Self::CycleRepaired { .. } => true,
            _ => false,
        }
    }

    /// Whether the user should be offered to reset all stored values
    #[inline]
    #[must_use]
    pub fn suggests_reset(&self) -> bool {
        matches!(
            self,
            Self::Graph(GraphError::CycleDetected { .. })
                | Self::CycleRepaired {
                    source: GraphError::CycleDetected { .. },
                    ..
                }
        )
    }

    /// Outcome of the change that was applied despite the error
    #[must_use]
    pub fn outcome(&self) -> Option<&ChangeOutcome> {
        match self {
            Self::CycleRepaired { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_errors_are_recoverable() {
        let cycle = EngineError::from(GraphError::CycleDetected {
            name: "A".to_string(),
            cycle: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        });
        assert!(cycle.is_recoverable());
        assert!(cycle.suggests_reset());
        assert_eq!(cycle.outcome(), None);

        let repaired = EngineError::CycleRepaired {
            source: GraphError::CycleDetected {
                name: "A".to_string(),
                cycle: vec!["A".to_string(), "B".to_string(), "A".to_string()],
            },
            outcome: ChangeOutcome {
                affected: vec!["A".to_string(), "B".to_string()],
                requires_reload: true,
                refreshed: 0,
            },
        };
        assert!(repaired.is_recoverable());
        assert!(repaired.suggests_reset());
        assert!(repaired.outcome().is_some_and(|o| o.requires_reload));
        assert_eq!(repaired.to_string(), cycle.to_string());

        let read_only = EngineError::ReadOnly("URL".to_string());
        assert!(!read_only.is_recoverable());
        assert_eq!(read_only.to_string(), "placeholder 'URL' is read-only");
    }
}

//! Error types for the dependency graph

/// Errors raised while maintaining the dependency graph
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Name is not part of the graph
    #[error("placeholder '{0}' is not part of the dependency graph")]
    UnknownPlaceholder(String),

    /// Editing `name` closed a reference cycle; its references were dropped
    #[error("placeholder '{name}' was part of a loop ({}) and has temporarily been made non-recursive", .cycle.join(" -> "))]
    CycleDetected { name: String, cycle: Vec<String> },

    /// Token alternation failed to compile
    #[error("cannot build substitution pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl GraphError {
    /// Whether the graph repaired itself before reporting
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CycleDetected { .. })
    }
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_path() {
        let err = GraphError::CycleDetected {
            name: "B".to_string(),
            cycle: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "placeholder 'B' was part of a loop (A -> B -> A) and has temporarily been made non-recursive"
        );
        assert!(err.is_recoverable());
    }
}

//! Error types for the state store

use std::path::PathBuf;

/// Errors raised by storage backends and the state store
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// IO error while reading or writing a state file
    #[error("io error on state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// State file exists but is not a JSON object of strings
    #[error("state file {path} is not valid: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Dropdown index outside of the option list
    #[error("index must be a whole number N, where 0 <= N < {len}, but it is {index} (placeholder '{name}')")]
    IndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },

    /// Stored value cannot be interpreted
    #[error("unexpected value '{value}' for key '{key}', expected {expected}")]
    Corrupt {
        key: String,
        value: String,
        expected: String,
    },
}

impl StateError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create JSON error for path
    pub fn json_error(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Create corrupt value error
    pub fn corrupt(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::Corrupt {
            key: key.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

/// Result type alias for state operations
pub type StateResult<T> = Result<T, StateError>;

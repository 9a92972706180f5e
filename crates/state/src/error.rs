//! State store error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StateError>;

/// Errors from state stores
#[derive(Debug, Error)]
pub enum StateError {
    /// Failed to open the backing database
    #[error("failed to open state store '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: sled::Error,
    },

    /// A read or write against the backing database failed
    #[error("state store operation failed: {0}")]
    Storage(#[from] sled::Error),

    /// The rule asked for a capability this state does not provide
    #[error("incompatible state: rule expects {expected}, state is {actual}")]
    Incompatible {
        expected: &'static str,
        actual: &'static str,
    },
}

impl StateError {
    pub fn open(path: impl Into<String>, source: sled::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub fn incompatible(expected: &'static str, actual: &'static str) -> Self {
        Self::Incompatible { expected, actual }
    }
}

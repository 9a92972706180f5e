//! Control plane error types

use thiserror::Error;

use crate::document::DocumentClientError;

pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors from pipeline persistence and management
#[derive(Debug, Error)]
pub enum ControlError {
    /// The submitted config failed to parse or validate
    #[error(transparent)]
    Config(#[from] weir_config::ConfigError),

    /// The pipeline could not be built from the config
    #[error(transparent)]
    Pipeline(#[from] weir_pipeline::PipelineError),

    /// The backend was used before `init`
    #[error("backend is not initialized")]
    NotInitialized,

    /// The embedded store failed to open
    #[error("failed to open backend '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: sled::Error,
    },

    /// An embedded store operation failed
    #[error("backend operation failed: {0}")]
    Storage(#[from] sled::Error),

    /// A document store operation failed for good (fatal, or retries
    /// exhausted)
    #[error("document store {operation} failed: {source}")]
    Document {
        operation: &'static str,
        #[source]
        source: DocumentClientError,
    },

    /// The backend config cannot be realized
    #[error("invalid backend: {0}")]
    InvalidBackend(String),
}

impl ControlError {
    pub fn open(path: impl Into<String>, source: sled::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub fn document(operation: &'static str, source: DocumentClientError) -> Self {
        Self::Document { operation, source }
    }

    pub fn invalid_backend(msg: impl Into<String>) -> Self {
        Self::InvalidBackend(msg.into())
    }
}

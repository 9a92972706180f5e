//! Source error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors from source drivers
#[derive(Debug, Error)]
pub enum SourceError {
    /// Driver setup failed; fails pipeline start
    #[error("source setup failed: {0}")]
    Init(String),

    /// I/O error while reading records
    #[error("source I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The checkpoint store rejected an operation
    #[error("checkpoint store error: {0}")]
    Checkpoint(#[from] weir_state::StateError),

    /// A lease row in the checkpoint store did not parse
    #[error("corrupt shard state for '{shard}': {source}")]
    CorruptShardState {
        shard: String,
        #[source]
        source: serde_json::Error,
    },

    /// The upstream stream service failed
    #[error(transparent)]
    Client(#[from] StreamClientError),

    /// The config names a driver this factory cannot build
    #[error("cannot create '{kind}' source '{name}': {reason}")]
    Unsupported {
        kind: &'static str,
        name: String,
        reason: String,
    },
}

impl SourceError {
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    pub fn unsupported(
        kind: &'static str,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Unsupported {
            kind,
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by a [`crate::StreamClient`] implementation.
///
/// Throttled and transient errors are retried with backoff; anything else
/// is fatal to the affected shard only.
#[derive(Debug, Error)]
pub enum StreamClientError {
    /// Provisioned throughput exceeded
    #[error("throughput exceeded: {0}")]
    Throttled(String),

    /// Recoverable server-side error
    #[error("transient stream error: {0}")]
    Transient(String),

    /// Unrecoverable error
    #[error("stream error: {0}")]
    Fatal(String),
}

impl StreamClientError {
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Throttled(_) | Self::Transient(_))
    }
}

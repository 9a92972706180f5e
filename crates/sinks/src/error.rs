//! Sink error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors from sink drivers
#[derive(Debug, Error)]
pub enum SinkError {
    /// Driver setup failed; fails pipeline start
    #[error("sink setup failed: {0}")]
    Init(String),

    /// I/O error while persisting records
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote queue rejected a record for good
    #[error(transparent)]
    Queue(#[from] QueueClientError),

    /// The config names a driver this factory cannot build
    #[error("cannot create '{kind}' sink '{name}': {reason}")]
    Unsupported {
        kind: &'static str,
        name: String,
        reason: String,
    },
}

impl SinkError {
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

/// Errors surfaced by a [`crate::QueueClient`] implementation.
///
/// Throttled and transient errors are retried with backoff; anything else
/// drops the record and is logged.
#[derive(Debug, Error)]
pub enum QueueClientError {
    #[error("queue throughput exceeded: {0}")]
    Throttled(String),

    #[error("transient queue error: {0}")]
    Transient(String),

    #[error("queue error: {0}")]
    Fatal(String),
}

impl QueueClientError {
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Throttled(_) | Self::Transient(_))
    }
}

//! Event and catalog error types

use std::io;
use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, EventError>;

/// Errors from loading or using the event-type catalog
#[derive(Debug, Error)]
pub enum EventError {
    /// Failed to read the event-type directory
    #[error("failed to read event folder '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// An event-type descriptor file did not parse
    #[error("invalid event type descriptor '{path}': {source}")]
    BadDescriptor {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A descriptor referenced a decoder that is not registered
    #[error("event type '{name}' references unknown decoder '{symbol}'")]
    UnknownDecoder { name: String, symbol: String },

    /// No registered event type accepted the payload
    #[error("no event type matched")]
    NoMatch,
}

impl EventError {
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn unknown_decoder(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::UnknownDecoder {
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

/// Why a single decoder rejected a payload.
///
/// Decode failures are expected during classification and stay silent; only
/// a total miss across the catalog surfaces as [`EventError::NoMatch`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not valid for this decoder's format
    #[error("payload does not decode: {0}")]
    Format(String),

    /// Payload decoded but did not satisfy the type's match conditions
    #[error("payload does not match: {0}")]
    Mismatch(String),
}

impl DecodeError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn mismatch(msg: impl Into<String>) -> Self {
        Self::Mismatch(msg.into())
    }
}

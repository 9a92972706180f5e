//! Pipeline error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors from building or running a pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The config failed to parse or validate
    #[error(transparent)]
    Config(#[from] weir_config::ConfigError),

    /// A rule failed to load or rejected its state
    #[error(transparent)]
    Rule(#[from] weir_rules::RuleError),

    /// A state store failed to open
    #[error(transparent)]
    State(#[from] weir_state::StateError),

    /// A source driver could not be created or initialized
    #[error(transparent)]
    Source(#[from] weir_sources::SourceError),

    /// A sink driver could not be created or initialized
    #[error(transparent)]
    Sink(#[from] weir_sinks::SinkError),

    /// The event-type catalog failed to load
    #[error(transparent)]
    Event(#[from] weir_event::EventError),

    /// A rule names another rule as its source, but no edge ever feeds it
    #[error("source '{name}' referred to but does not exist")]
    MissingSource { name: String },

    /// The configured graph contains a cycle
    #[error("pipeline graph contains a cycle through: {names}")]
    Cycle { names: String },

    /// An operation is not valid in the pipeline's current status
    #[error("cannot {operation} a {status} pipeline")]
    InvalidTransition {
        operation: &'static str,
        status: &'static str,
    },
}

impl PipelineError {
    pub fn missing_source(name: impl Into<String>) -> Self {
        Self::MissingSource { name: name.into() }
    }

    pub fn cycle(names: impl Into<String>) -> Self {
        Self::Cycle {
            names: names.into(),
        }
    }

    pub fn invalid_transition(operation: &'static str, status: &'static str) -> Self {
        Self::InvalidTransition { operation, status }
    }
}

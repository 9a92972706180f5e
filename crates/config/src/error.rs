//! Configuration error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors from parsing or validating a pipeline configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The raw bytes did not parse as a pipeline config
    #[error("failed to parse pipeline config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A rule's source names neither a source nor a rule
    #[error("invalid source for rule '{rule}': {source_name}")]
    UnknownSource { rule: String, source_name: String },

    /// A rule's sink names neither a sink nor a rule
    #[error("invalid sink for rule '{rule}': {sink}")]
    UnknownSink { rule: String, sink: String },

    /// A rule's state names no declared state
    #[error("invalid state for rule '{rule}': {state}")]
    UnknownState { rule: String, state: String },

    /// A name is declared in more than one of sources/rules/sinks/states
    #[error("invalid configuration, duplicate names: {names}")]
    DuplicateNames { names: String },

    /// Two or more rules declare the same state
    #[error("only one rule can use each state, but '{state}' is used by: {rules}")]
    SharedState { state: String, rules: String },

    /// A rule's plugin file does not exist
    #[error("invalid plugin for rule '{rule}': {path} does not exist")]
    MissingPlugin { rule: String, path: String },

    /// No sources declared
    #[error("no sources are defined - a pipeline needs at least one source")]
    NoSources,

    /// No sinks declared
    #[error("no sinks are defined - a pipeline needs at least one sink")]
    NoSinks,
}

impl ConfigError {
    pub fn unknown_source(rule: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self::UnknownSource {
            rule: rule.into(),
            source_name: source_name.into(),
        }
    }

    pub fn unknown_sink(rule: impl Into<String>, sink: impl Into<String>) -> Self {
        Self::UnknownSink {
            rule: rule.into(),
            sink: sink.into(),
        }
    }

    pub fn unknown_state(rule: impl Into<String>, state: impl Into<String>) -> Self {
        Self::UnknownState {
            rule: rule.into(),
            state: state.into(),
        }
    }

    pub fn duplicate_names(names: impl Into<String>) -> Self {
        Self::DuplicateNames {
            names: names.into(),
        }
    }

    pub fn shared_state(state: impl Into<String>, rules: impl Into<String>) -> Self {
        Self::SharedState {
            state: state.into(),
            rules: rules.into(),
        }
    }

    pub fn missing_plugin(rule: impl Into<String>, path: impl Into<String>) -> Self {
        Self::MissingPlugin {
            rule: rule.into(),
            path: path.into(),
        }
    }
}

//! Rule error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuleError>;

/// Errors from loading or running rules
#[derive(Debug, Error)]
pub enum RuleError {
    /// The configured plugin file does not exist
    #[error("unable to load plugin '{path}': file does not exist")]
    PluginMissing { path: String },

    /// No rule is registered under the plugin's name
    #[error("no rule registered for plugin '{symbol}'")]
    UnknownRule { symbol: String },

    /// The rule rejected its configuration or state during init
    #[error("rule init failed: {0}")]
    Init(String),

    /// The rule's declared state has the wrong capability
    #[error(transparent)]
    State(#[from] weir_state::StateError),

    /// The rule's window callback failed
    #[error("window failed: {0}")]
    Window(String),
}

impl RuleError {
    pub fn plugin_missing(path: impl Into<String>) -> Self {
        Self::PluginMissing { path: path.into() }
    }

    pub fn unknown_rule(symbol: impl Into<String>) -> Self {
        Self::UnknownRule {
            symbol: symbol.into(),
        }
    }

    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    pub fn window(msg: impl Into<String>) -> Self {
        Self::Window(msg.into())
    }
}

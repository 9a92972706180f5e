//! Weir Pipeline Configuration
//!
//! JSON-based pipeline configuration: an event-type folder plus four named
//! maps (sources, sinks, states, rules). Parsing and the structural
//! invariants live here; graph construction and the acyclicity check live
//! in `weir-pipeline`, which consumes the parsed form.
//!
//! # Parsing
//!
//! ```
//! use weir_config::PipelineConfig;
//!
//! let raw = br#"{
//!     "eventFolder": "events/",
//!     "sources": {"in":  {"type": "File", "file_config": {"path": "input.log"}}},
//!     "sinks":   {"out": {"type": "File", "file_config": {"path": "output.log"}}}
//! }"#;
//! let config = PipelineConfig::from_slice(raw).unwrap();
//! assert_eq!(config.sources.len(), 1);
//! ```
//!
//! The raw bytes a config was parsed from are persisted verbatim by the
//! pipeline manager; this crate never re-serializes them on that path.

mod error;
mod rules;
mod sinks;
mod sources;
mod validation;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use error::{ConfigError, Result};
pub use rules::RuleConfig;
pub use sinks::{FileSinkConfig, QueueSinkConfig, SinkConfig};
pub use sources::{
    FileSourceConfig, KafkaSourceConfig, SourceConfig, StreamSourceConfig, WebsocketSourceConfig,
};

// Re-exported so config consumers see one surface for the whole document.
pub use weir_state::{KvConfig, StateConfig};

/// A declarative pipeline description.
///
/// The four maps share one name space: validation rejects a name declared
/// in more than one of them. `BTreeMap` keeps iteration (and therefore
/// build order and error messages) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory of event-type descriptors, loaded at pipeline start
    #[serde(rename = "eventFolder", default)]
    pub event_folder: String,

    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,

    #[serde(default)]
    pub sinks: BTreeMap<String, SinkConfig>,

    #[serde(default)]
    pub states: BTreeMap<String, StateConfig>,

    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

impl PipelineConfig {
    /// Parse a config from raw JSON bytes and validate it
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the structural invariants (see [`validation`])
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

//! Structured rule output events

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a rule output event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warn,
    #[default]
    Info,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
        };
        f.write_str(s)
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            other => Err(format!("not a valid level: {other:?}")),
        }
    }
}

/// Structured record emitted by rules towards sinks.
///
/// The body is a string-keyed map of arbitrary values; `occurrences` counts
/// how many input records were folded into this output (at least 1, more for
/// windowed aggregates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputEvent {
    pub source: String,
    pub event_time: DateTime<Utc>,
    pub event_type: String,
    pub name: String,
    pub level: Level,
    pub event_id: String,
    pub entity: String,
    pub source_ip: String,
    #[serde(default)]
    pub body: BTreeMap<String, Value>,
    pub occurrences: u64,
}

impl OutputEvent {
    /// Create an output event with empty body and a single occurrence
    pub fn new(source: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            event_time: Utc::now(),
            event_type: event_type.into(),
            name: String::new(),
            level: Level::Info,
            event_id: String::new(),
            entity: String::new(),
            source_ip: String::new(),
            body: BTreeMap::new(),
            occurrences: 1,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = entity.into();
        self
    }

    #[must_use]
    pub fn with_body_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.body.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse() {
        assert_eq!("error".parse::<Level>().unwrap(), Level::Error);
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("warning".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("info".parse::<Level>().unwrap(), Level::Info);
        assert!("fatal".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&Level::Warn).unwrap();
        assert_eq!(json, "\"warn\"");
    }

    #[test]
    fn test_output_event_builder() {
        let event = OutputEvent::new("CloudTrail", "UserCreated")
            .with_name("IAMUserCreated")
            .with_level(Level::Warn)
            .with_entity("user/Bob")
            .with_body_field("AccountID", serde_json::json!("777788889999"));

        assert_eq!(event.source, "CloudTrail");
        assert_eq!(event.level, Level::Warn);
        assert_eq!(event.occurrences, 1);
        assert_eq!(event.body.len(), 1);
    }

    #[test]
    fn test_output_event_json_round_trip() {
        let event = OutputEvent::new("s", "t").with_name("n");
        let json = serde_json::to_string(&event).unwrap();
        let back: OutputEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}

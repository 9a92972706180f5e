//! Event-type decoders
//!
//! An event type recognises a subset of raw payloads and produces a decoded
//! [`Event`]. Two built-in decoders cover the common cases; anything richer
//! is registered as a custom decoder and referenced from a descriptor file
//! by symbol name.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;
use crate::event::Event;

/// An event type: a named decoder over raw payloads.
///
/// `decode` failures are expected and silent; the catalog simply tries the
/// next type in order.
pub trait EventType: Send + Sync {
    /// Name of this event type, stamped onto decoded events
    fn name(&self) -> &str;

    /// Attempt to decode the payload
    fn decode(&self, raw: &[u8]) -> Result<Event, DecodeError>;
}

/// Decoder section of an event-type descriptor file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DecoderConfig {
    /// Accept JSON objects, optionally constrained by required keys and
    /// exact field values
    Json {
        #[serde(default, rename = "requiredFields")]
        required_fields: Vec<String>,
        #[serde(default, rename = "fieldEquals")]
        field_equals: BTreeMap<String, Value>,
    },

    /// Accept UTF-8 text, optionally constrained to lines containing a
    /// literal substring
    Text {
        #[serde(default)]
        contains: Option<String>,
    },

    /// Delegate to a decoder registered under `symbol`
    Registered { symbol: String },
}

/// Registry of custom decoders, keyed by the symbol name descriptors use.
///
/// The compile-time counterpart of a dynamic plugin table: decoders register
/// here once and descriptor files reference them by name.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: HashMap<String, Arc<dyn EventType>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoder under a symbol name. Later registrations win.
    pub fn register(&mut self, symbol: impl Into<String>, decoder: Arc<dyn EventType>) {
        self.decoders.insert(symbol.into(), decoder);
    }

    pub fn get(&self, symbol: &str) -> Option<Arc<dyn EventType>> {
        self.decoders.get(symbol).cloned()
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

/// Built-in decoder for JSON object payloads
pub struct JsonDecoder {
    name: String,
    required_fields: Vec<String>,
    field_equals: BTreeMap<String, Value>,
}

impl JsonDecoder {
    pub fn new(
        name: impl Into<String>,
        required_fields: Vec<String>,
        field_equals: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            required_fields,
            field_equals,
        }
    }
}

impl EventType for JsonDecoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, raw: &[u8]) -> Result<Event, DecodeError> {
        let payload: Value =
            serde_json::from_slice(raw).map_err(|e| DecodeError::format(e.to_string()))?;
        let object = payload
            .as_object()
            .ok_or_else(|| DecodeError::format("not a JSON object"))?;

        for field in &self.required_fields {
            if !object.contains_key(field) {
                return Err(DecodeError::mismatch(format!("missing field '{field}'")));
            }
        }
        for (field, expected) in &self.field_equals {
            match object.get(field) {
                Some(actual) if actual == expected => {}
                _ => {
                    return Err(DecodeError::mismatch(format!(
                        "field '{field}' does not equal expected value"
                    )));
                }
            }
        }

        Ok(Event::new(
            self.name.clone(),
            payload,
            Bytes::copy_from_slice(raw),
        ))
    }
}

/// Built-in decoder for UTF-8 text payloads
pub struct TextDecoder {
    name: String,
    contains: Option<String>,
}

impl TextDecoder {
    pub fn new(name: impl Into<String>, contains: Option<String>) -> Self {
        Self {
            name: name.into(),
            contains,
        }
    }
}

impl EventType for TextDecoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, raw: &[u8]) -> Result<Event, DecodeError> {
        let text =
            std::str::from_utf8(raw).map_err(|_| DecodeError::format("payload is not UTF-8"))?;

        if let Some(needle) = &self.contains {
            if !text.contains(needle.as_str()) {
                return Err(DecodeError::mismatch(format!(
                    "text does not contain {needle:?}"
                )));
            }
        }

        Ok(Event::new(
            self.name.clone(),
            Value::String(text.to_owned()),
            Bytes::copy_from_slice(raw),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_decoder_required_fields() {
        let decoder = JsonDecoder::new("CloudTrail", vec!["eventName".into()], BTreeMap::new());

        assert!(decoder.decode(br#"{"eventName":"CreateUser"}"#).is_ok());
        assert!(decoder.decode(br#"{"other":1}"#).is_err());
        assert!(decoder.decode(b"not json").is_err());
        assert!(decoder.decode(br#"[1,2]"#).is_err());
    }

    #[test]
    fn test_json_decoder_field_equals() {
        let mut equals = BTreeMap::new();
        equals.insert("eventName".to_string(), json!("AssumeRole"));
        let decoder = JsonDecoder::new("AssumeRole", Vec::new(), equals);

        let event = decoder.decode(br#"{"eventName":"AssumeRole"}"#).unwrap();
        assert_eq!(event.event_type, "AssumeRole");
        assert!(decoder.decode(br#"{"eventName":"CreateUser"}"#).is_err());
    }

    #[test]
    fn test_text_decoder() {
        let decoder = TextDecoder::new("Line", None);
        let event = decoder.decode(b"hello").unwrap();
        assert_eq!(event.payload, json!("hello"));
        assert_eq!(event.raw, Bytes::from_static(b"hello"));

        let filtered = TextDecoder::new("Alerts", Some("ALERT".into()));
        assert!(filtered.decode(b"ALERT: disk full").is_ok());
        assert!(filtered.decode(b"all quiet").is_err());
        assert!(filtered.decode(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_decoder_config_parses() {
        let config: DecoderConfig = serde_json::from_str(
            r#"{"type":"Json","requiredFields":["a"],"fieldEquals":{"b":2}}"#,
        )
        .unwrap();
        match config {
            DecoderConfig::Json {
                required_fields,
                field_equals,
            } => {
                assert_eq!(required_fields, vec!["a"]);
                assert_eq!(field_equals.get("b"), Some(&json!(2)));
            }
            other => panic!("unexpected config: {other:?}"),
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = DecoderRegistry::new();
        assert!(registry.is_empty());
        registry.register("lines", Arc::new(TextDecoder::new("Line", None)));
        assert!(registry.get("lines").is_some());
        assert!(registry.get("missing").is_none());
    }
}

//! Decoded events and the records that flow between pipeline nodes

use bytes::Bytes;
use serde_json::Value;

use crate::output::OutputEvent;

/// A decoded event produced by event-type classification.
///
/// Carries the name of the event type that accepted the payload, the decoded
/// payload, and the original raw bytes. Events are cloned when a source fans
/// out to several rules; `Bytes` keeps the raw copy cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Name of the event type that decoded this payload
    pub event_type: String,

    /// Decoded payload
    pub payload: Value,

    /// The raw bytes as they arrived from the source
    pub raw: Bytes,
}

impl Event {
    pub fn new(event_type: impl Into<String>, payload: Value, raw: Bytes) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            raw,
        }
    }

    /// Look up a top-level string field of the payload
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// A value travelling on a rule's output edge.
///
/// Rules may emit structured output events, arbitrary JSON values, or the
/// raw bytes of the record they matched (pass-through). Raw records that
/// reach a forwarder are re-classified by the downstream rule's dispatch
/// loop; everything else is JSON-encoded on the way through.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Raw bytes, typically the matched input untouched
    Raw(Bytes),

    /// A structured rule output event
    Event(Box<OutputEvent>),

    /// An arbitrary JSON value
    Value(Value),
}

impl Record {
    /// Wrap an output event
    pub fn event(event: OutputEvent) -> Self {
        Self::Event(Box::new(event))
    }

    /// JSON representation of this record
    pub fn to_json(&self) -> Value {
        match self {
            Self::Raw(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            Self::Event(event) => serde_json::to_value(event.as_ref()).unwrap_or(Value::Null),
            Self::Value(value) => value.clone(),
        }
    }

    /// Byte representation used when a record crosses a forwarder edge
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Raw(bytes) => bytes,
            Self::Event(event) => serde_json::to_vec(event.as_ref())
                .map(Bytes::from)
                .unwrap_or_default(),
            Self::Value(value) => serde_json::to_vec(&value).map(Bytes::from).unwrap_or_default(),
        }
    }
}

impl From<OutputEvent> for Record {
    fn from(event: OutputEvent) -> Self {
        Self::event(event)
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_str() {
        let event = Event::new(
            "Login",
            json!({"user": "bob", "attempts": 3}),
            Bytes::from_static(b"{}"),
        );
        assert_eq!(event.field_str("user"), Some("bob"));
        assert_eq!(event.field_str("attempts"), None);
        assert_eq!(event.field_str("missing"), None);
    }

    #[test]
    fn test_raw_record_round_trips_bytes() {
        let record = Record::Raw(Bytes::from_static(b"hello"));
        assert_eq!(record.clone().into_bytes(), Bytes::from_static(b"hello"));
        assert_eq!(record.to_json(), json!("hello"));
    }

    #[test]
    fn test_value_record_encodes_json() {
        let record = Record::Value(json!({"n": 1}));
        assert_eq!(record.clone().into_bytes(), Bytes::from_static(b"{\"n\":1}"));
        assert_eq!(record.to_json(), json!({"n": 1}));
    }
}

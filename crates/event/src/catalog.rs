//! Event-type catalog
//!
//! Loads every event-type descriptor from a directory and classifies raw
//! payloads by trying each type in catalog order. First match wins.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::decoder::{DecoderConfig, DecoderRegistry, EventType, JsonDecoder, TextDecoder};
use crate::error::{EventError, Result};
use crate::event::Event;

/// One `.json` file in the event folder
#[derive(Debug, Deserialize)]
struct Descriptor {
    name: String,
    decoder: DecoderConfig,
}

/// An ordered set of event types loaded from a directory.
///
/// Descriptors are loaded in sorted file-name order, which fixes the
/// classification order for payloads that more than one type would accept.
pub struct EventCatalog {
    types: Vec<Arc<dyn EventType>>,
}

impl EventCatalog {
    /// Load all `*.json` descriptors under `folder`.
    ///
    /// Non-JSON files are ignored. A descriptor that fails to parse, or that
    /// references an unregistered decoder symbol, fails the whole load.
    pub fn load(folder: impl AsRef<Path>, registry: &DecoderRegistry) -> Result<Self> {
        let folder = folder.as_ref();
        let mut paths: Vec<_> = std::fs::read_dir(folder)
            .map_err(|e| EventError::io(folder.display().to_string(), e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut types: Vec<Arc<dyn EventType>> = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = std::fs::read(&path)
                .map_err(|e| EventError::io(path.display().to_string(), e))?;
            let descriptor: Descriptor =
                serde_json::from_slice(&raw).map_err(|e| EventError::BadDescriptor {
                    path: path.display().to_string(),
                    source: e,
                })?;

            let event_type: Arc<dyn EventType> = match descriptor.decoder {
                DecoderConfig::Json {
                    required_fields,
                    field_equals,
                } => Arc::new(JsonDecoder::new(
                    descriptor.name,
                    required_fields,
                    field_equals,
                )),
                DecoderConfig::Text { contains } => {
                    Arc::new(TextDecoder::new(descriptor.name, contains))
                }
                DecoderConfig::Registered { symbol } => registry
                    .get(&symbol)
                    .ok_or_else(|| EventError::unknown_decoder(&descriptor.name, &symbol))?,
            };
            types.push(event_type);
        }

        tracing::info!(folder = %folder.display(), count = types.len(), "loaded event types");
        Ok(Self { types })
    }

    /// Build a catalog directly from decoders (used by tests and embedders)
    pub fn from_types(types: Vec<Arc<dyn EventType>>) -> Self {
        Self { types }
    }

    /// Number of registered event types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Classify a raw payload: the first event type whose decode succeeds
    /// wins. Per-type decode failures are expected and not reported.
    pub fn match_event(&self, raw: &[u8]) -> Result<Event> {
        for event_type in &self.types {
            if let Ok(event) = event_type.decode(raw) {
                tracing::trace!(event_type = event_type.name(), "matched event type");
                return Ok(event);
            }
        }
        Err(EventError::NoMatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_descriptor(dir: &Path, file: &str, contents: &str) {
        fs::write(dir.join(file), contents).unwrap();
    }

    #[test]
    fn test_load_sorted_and_first_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        // Loaded in file-name order: 10_json before 20_text.
        write_descriptor(
            dir.path(),
            "10_cloudtrail.json",
            r#"{"name":"CloudTrail","decoder":{"type":"Json","requiredFields":["eventName"]}}"#,
        );
        write_descriptor(
            dir.path(),
            "20_line.json",
            r#"{"name":"Line","decoder":{"type":"Text"}}"#,
        );

        let catalog = EventCatalog::load(dir.path(), &DecoderRegistry::new()).unwrap();
        assert_eq!(catalog.len(), 2);

        let event = catalog
            .match_event(br#"{"eventName":"CreateUser"}"#)
            .unwrap();
        assert_eq!(event.event_type, "CloudTrail");

        // Valid UTF-8 that is not a matching JSON object falls through to Text.
        let event = catalog.match_event(b"plain line").unwrap();
        assert_eq!(event.event_type, "Line");
    }

    #[test]
    fn test_no_match() {
        let dir = tempfile::tempdir().unwrap();
        write_descriptor(
            dir.path(),
            "only.json",
            r#"{"name":"CloudTrail","decoder":{"type":"Json","requiredFields":["eventName"]}}"#,
        );
        let catalog = EventCatalog::load(dir.path(), &DecoderRegistry::new()).unwrap();
        assert!(matches!(
            catalog.match_event(b"no match here"),
            Err(EventError::NoMatch)
        ));
    }

    #[test]
    fn test_unknown_symbol_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        write_descriptor(
            dir.path(),
            "custom.json",
            r#"{"name":"Custom","decoder":{"type":"Registered","symbol":"nope"}}"#,
        );
        let err = match EventCatalog::load(dir.path(), &DecoderRegistry::new()) {
            Err(e) => e,
            Ok(_) => panic!("expected error"),
        };
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_missing_folder_fails() {
        assert!(EventCatalog::load("/definitely/not/here", &DecoderRegistry::new()).is_err());
    }

    #[test]
    fn test_ignores_non_json_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "not a descriptor").unwrap();
        write_descriptor(
            dir.path(),
            "line.json",
            r#"{"name":"Line","decoder":{"type":"Text"}}"#,
        );
        let catalog = EventCatalog::load(dir.path(), &DecoderRegistry::new()).unwrap();
        assert_eq!(catalog.len(), 1);
    }
}

//! Weir Event Model
//!
//! Shared base types for the Weir pipeline: decoded events, rule output
//! records and the event-type catalog that classifies raw payloads.
//!
//! # Classification
//!
//! ```text
//! [raw bytes] ──→ EventCatalog::match_event ──→ Event { type, payload, raw }
//!                      │ tries every decoder in catalog order
//!                      └─ no decoder accepts → EventError::NoMatch
//! ```
//!
//! Decoders are loaded from a directory of JSON descriptor files, in sorted
//! file-name order, so ambiguous payloads always classify the same way.
//! A descriptor either configures one of the built-in decoders (`Json`,
//! `Text`) or names a custom decoder registered in a [`DecoderRegistry`].
//!
//! # Example
//!
//! ```ignore
//! use weir_event::{DecoderRegistry, EventCatalog};
//!
//! let registry = DecoderRegistry::new();
//! let catalog = EventCatalog::load("events/", &registry)?;
//!
//! let event = catalog.match_event(b"{\"eventName\":\"CreateUser\"}")?;
//! println!("{} -> {}", event.event_type, event.payload);
//! ```

mod catalog;
mod decoder;
mod error;
mod event;
mod output;
pub mod retry;

pub use catalog::EventCatalog;
pub use decoder::{DecoderConfig, DecoderRegistry, EventType, JsonDecoder, TextDecoder};
pub use error::{DecodeError, EventError, Result};
pub use event::{Event, Record};
pub use output::{Level, OutputEvent};

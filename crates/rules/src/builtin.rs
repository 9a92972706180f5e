//! Reference rules
//!
//! Small rules shipped with the engine: handy as wiring checks and as
//! patterns for user rules.

use std::sync::Arc;

use serde_json::json;
use weir_event::{Event, Level, OutputEvent, Record};
use weir_state::{Counter, State};

use crate::error::Result;
use crate::rule::Rule;

/// Forwards every matched record untouched
#[derive(Debug, Default)]
pub struct EchoRule;

impl Rule for EchoRule {
    fn process(&mut self, event: &Event) -> Option<Record> {
        Some(Record::Raw(event.raw.clone()))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Emits the byte length of every matched record
#[derive(Debug, Default)]
pub struct LengthRule;

impl Rule for LengthRule {
    fn process(&mut self, event: &Event) -> Option<Record> {
        Some(Record::Value(json!(event.raw.len())))
    }

    fn name(&self) -> &str {
        "length"
    }
}

/// Counts matched records and emits one aggregate per window.
///
/// Backed by a `Count` state; per-record processing emits nothing, the
/// window callback drains the counter into a single output event.
pub struct RateRule {
    counter: Option<Arc<State>>,
    interval: u64,
    event_type: String,
}

impl Default for RateRule {
    fn default() -> Self {
        Self {
            counter: None,
            interval: 60,
            event_type: "RateWindow".to_string(),
        }
    }
}

impl RateRule {
    pub fn new(interval: u64, event_type: impl Into<String>) -> Self {
        Self {
            counter: None,
            interval,
            event_type: event_type.into(),
        }
    }

    fn counter(&self) -> Option<&Counter> {
        self.counter.as_ref().and_then(|s| s.counter().ok())
    }
}

impl Rule for RateRule {
    fn init(&mut self, state: Option<Arc<State>>) -> Result<()> {
        if let Some(state) = &state {
            state.counter()?;
        }
        self.counter = state;
        Ok(())
    }

    fn process(&mut self, _event: &Event) -> Option<Record> {
        if let Some(counter) = self.counter() {
            counter.increment();
        }
        None
    }

    fn window_interval(&self) -> u64 {
        self.interval
    }

    fn window(&mut self) -> Result<Vec<OutputEvent>> {
        let count = match self.counter() {
            Some(counter) => counter.window(),
            None => 0,
        };
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut event = OutputEvent::new("weir", &self.event_type)
            .with_name("rate")
            .with_level(Level::Info);
        event.occurrences = count;
        Ok(vec![event])
    }

    fn name(&self) -> &str {
        "rate"
    }
}

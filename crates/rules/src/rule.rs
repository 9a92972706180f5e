//! The rule contract

use std::sync::Arc;

use weir_event::{Event, OutputEvent, Record};
use weir_state::State;

use crate::error::Result;

/// Per-record processing logic, optionally stateful and windowed.
///
/// One cooperative task per rule drives `process`; if the rule is windowed
/// (`window_interval() > 0`) a window manager calls `window` on schedule
/// from a second task. Implementations that touch shared state between the
/// two use the handle passed to `init`, which serializes internally.
pub trait Rule: Send {
    /// Called once before any record flows, with the rule's declared state
    /// handle if it has one. Probing the handle for the wrong capability
    /// fails here and aborts pipeline creation.
    fn init(&mut self, state: Option<Arc<State>>) -> Result<()> {
        let _ = state;
        Ok(())
    }

    /// Classify or transform one event. `None` means this record produces
    /// no output.
    fn process(&mut self, event: &Event) -> Option<Record>;

    /// Window interval in seconds; `0` means the rule is not windowed.
    fn window_interval(&self) -> u64 {
        0
    }

    /// Periodic batch emission. Called by the window manager at the
    /// declared interval; may drain rule-internal aggregation state.
    fn window(&mut self) -> Result<Vec<OutputEvent>> {
        Ok(Vec::new())
    }

    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Called once after the rule's input channel closes
    fn close(&mut self) {}
}

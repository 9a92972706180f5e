//! Weir Rules
//!
//! A rule is user-supplied per-record logic: it receives decoded events and
//! emits at most one record per input, plus an optional periodic batch via
//! its window callback. Rules are registered at compile time in a
//! [`RuleRegistry`]; a pipeline config's `plugin` path selects one by file
//! stem (the path itself must exist, preserving the classic plugin-file
//! contract without process-wide dynamic loading).
//!
//! # Writing a rule
//!
//! ```
//! use weir_event::{Event, Record};
//! use weir_rules::Rule;
//!
//! struct PassThrough;
//!
//! impl Rule for PassThrough {
//!     fn process(&mut self, event: &Event) -> Option<Record> {
//!         Some(Record::Raw(event.raw.clone()))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "pass_through"
//!     }
//! }
//! ```
//!
//! Stateless, windowless rules only implement `process` and `name`; the
//! remaining methods have no-op defaults.

mod builtin;
mod error;
mod registry;
mod rule;

pub use builtin::{EchoRule, LengthRule, RateRule};
pub use error::{Result, RuleError};
pub use registry::{RuleFactory, RuleRegistry};
pub use rule::Rule;

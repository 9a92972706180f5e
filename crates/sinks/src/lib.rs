//! Weir Sinks
//!
//! A sink driver consumes records from a channel and persists them. The
//! runtime calls `init` once, then `run` on its own task; `run` drains the
//! channel until it closes, skipping `None` markers (a rule that emitted
//! nothing for a record), and returns once the channel is empty.
//!
//! # Drivers
//!
//! - [`FileSink`] — append, one value per line, fsync after each write
//! - [`ForwardSink`] — pushes records into a pre-existing in-process
//!   channel; the producer half of a rule→rule edge
//! - [`QueueSink`] — JSON-encodes each record and sends it to a remote
//!   queue behind the [`QueueClient`] trait, with bounded retries

mod error;
mod file;
mod forward;
mod queue;
mod sink;

pub use error::{QueueClientError, Result, SinkError};
pub use file::FileSink;
pub use forward::ForwardSink;
pub use queue::{QueueClient, QueueClientFactory, QueueSink};
pub use sink::{DefaultSinkFactory, Sink, SinkFactory, SinkInput};

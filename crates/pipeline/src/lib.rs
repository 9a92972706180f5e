//! Weir Pipeline
//!
//! Builds and runs one pipeline: a directed acyclic graph of sources,
//! rules and sinks connected by channels.
//!
//! # Architecture
//!
//! ```text
//! [Sources]            [Dispatch]              [Rules]            [Sinks]
//!   File ──→ bytes ──→ match event type ──→ process loop ──→ Option<Record> ──→ File
//!   Stream ─┘              │ fan-out            │ ▲                          └──→ Queue
//!                          └─→ rule B      WindowManager
//!                                          (timer batches)
//! ```
//!
//! - Every source, dispatch loop, rule, window manager and sink runs as its
//!   own tokio task; stages are connected by capacity-1 mpsc channels so
//!   backpressure propagates end to end.
//! - Rule→rule edges are realized with a forward sink / forward source pair
//!   over an intermediate channel, keeping the interior topology uniformly
//!   source → rule → sink.
//! - Shutdown is strictly ordered: sources stop and drain, window managers
//!   stop, rule loops finish and close their rules, sinks drain, states
//!   flush. `close` is idempotent.
//!
//! # Example
//!
//! ```ignore
//! let builder = PipelineBuilder::new(sources, sinks, rules, decoders);
//! let pipeline = builder.build(Uuid::new_v4(), &raw_config)?;
//!
//! pipeline.start().await?;
//! // ... records flow ...
//! pipeline.close().await;
//! ```

mod error;
mod graph;
mod metrics;
mod runtime;
mod window;

pub use error::{PipelineError, Result};
pub use graph::PipelineBuilder;
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use runtime::{Pipeline, PipelineStatus};
pub use window::WindowManager;

/// Capacity of the channels between pipeline nodes. Kept minimal so a slow
/// sink stalls its producers instead of buffering unboundedly; drivers size
/// their own internal channels where they need slack.
pub const NODE_CHANNEL_CAPACITY: usize = 1;

//! Weir Sources
//!
//! A source driver produces raw byte records into a channel. The runtime
//! calls `init` once, then `retrieve` on its own task; `retrieve` runs until
//! the source is exhausted or cancelled and closes its out-channel by
//! dropping the sender on return.
//!
//! # Drivers
//!
//! - [`FileSource`] — one record per line of a regular file, closes at EOF
//! - [`ForwardSource`] — drains a pre-existing in-process channel; realizes
//!   rule→rule edges together with the forward sink
//! - [`WebSocketSource`] — one record per websocket frame
//! - [`StreamSource`] — generic sharded queue consumer: discovers shards,
//!   holds time-based leases, checkpoints cursors in a persistent store and
//!   retries throttled fetches with exponential backoff. The actual wire
//!   protocol lives behind the [`StreamClient`] trait.
//!
//! Sources are created through a [`SourceFactory`]; the default factory
//! builds the production drivers and lets embedders register stream clients
//! for the `Kinesis`/`Kafka` config tags.

mod checkpoint;
mod error;
mod file;
mod forward;
mod source;
mod stream;
mod websocket;

pub use checkpoint::{CheckpointStore, ShardState};
pub use error::{Result, SourceError, StreamClientError};
pub use file::FileSource;
pub use forward::ForwardSource;
pub use source::{DefaultSourceFactory, Source, SourceFactory, StreamClientFactory};
pub use stream::{FetchResult, StreamClient, StreamDriverConfig, StreamSource};
pub use websocket::WebSocketSource;

/// Default lease duration for stream shards
pub const DEFAULT_LEASE: std::time::Duration = std::time::Duration::from_secs(30);

/// Renewal safety margin before lease expiry
pub const DEFAULT_LEASE_MARGIN: std::time::Duration = std::time::Duration::from_secs(5);

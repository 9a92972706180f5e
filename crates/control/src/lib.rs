//! Weir Control Plane
//!
//! Pipeline persistence and lifecycle management: the [`PipelineManager`]
//! parses, validates and builds pipelines, assigns their UUIDs and stores
//! the raw configuration bytes in a pluggable [`Backend`] so a pipeline
//! definition can always be fetched back byte-identical.
//!
//! # Backends
//!
//! - [`SledBackend`] — embedded store, `uuid text → raw bytes` in a named
//!   tree of a sled database file. The default for single-node use.
//! - [`DocumentBackend`] — remote document table behind the
//!   [`DocumentClient`] trait, with retry-with-backoff on throttled or
//!   transient operations.
//!
//! # Usage
//!
//! ```ignore
//! let backend = BackendConfig::default_sled().create()?;
//! let manager = PipelineManager::new(backend);
//! manager.init().await?;
//!
//! let pipeline = manager.new_pipeline(&raw_json).await?;
//! assert_eq!(manager.get(pipeline.id().to_string().as_bytes()).await?, raw_json);
//! ```

mod backend;
mod document;
mod error;
mod manager;
mod monitor;

pub use backend::{Backend, BackendConfig, SledBackend, SledBackendConfig};
pub use document::{DocumentBackend, DocumentBackendConfig, DocumentClient, DocumentClientError};
pub use error::{ControlError, Result};
pub use manager::PipelineManager;
pub use monitor::{Monitor, NoopMonitor};

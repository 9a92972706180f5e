//! Weir Control API
//!
//! A thin REST veneer over the pipeline manager:
//!
//! - `POST /pipelines` — create a pipeline from the JSON body. `201` with
//!   the new UUID as text; `400` with the reason on parse or validation
//!   failure; `500` on storage failure. Created pipelines start running in
//!   the background and are tracked until server shutdown.
//! - `GET /pipelines/{id}` — `200` with the stored raw config bytes,
//!   `404` if absent, `500` on backend error.
//!
//! Defaults: listen on `:8000`, 15 s request timeout, 60 s idle.
//!
//! # Usage
//!
//! ```ignore
//! let config = ApiServerConfig::from_slice(&std::fs::read("api.json")?)?;
//! let backend = config.backend.create()?;
//! let manager = Arc::new(PipelineManager::new(backend));
//! manager.init().await?;
//! weir_api::serve(config, manager).await?;
//! ```

mod error;
mod routes;
mod server;
mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use server::{serve, ApiServerConfig};
pub use state::AppState;

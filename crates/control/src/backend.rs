//! Pipeline config persistence

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::DocumentBackendConfig;
use crate::error::{ControlError, Result};

/// Storage for pipeline configurations, keyed by UUID text.
///
/// `get` returns empty bytes for an absent key; absence is not an error.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Open the underlying store. Must be called before `store`/`get`.
    async fn init(&self) -> Result<()>;

    /// Persist (or overwrite) the raw config bytes of a pipeline
    async fn store(&self, id: Uuid, raw: &[u8]) -> Result<()>;

    /// Fetch the raw config bytes stored under a UUID's text form
    async fn get(&self, uuid: &[u8]) -> Result<Vec<u8>>;
}

/// Backend selection in the API server config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BackendConfig {
    #[serde(rename = "sled")]
    Sled {
        #[serde(rename = "sledConfig")]
        sled_config: SledBackendConfig,
    },

    #[serde(rename = "document")]
    Document {
        #[serde(rename = "documentConfig")]
        document_config: DocumentBackendConfig,
    },
}

impl BackendConfig {
    /// The implicit backend used by single-pipeline CLI runs
    pub fn default_sled() -> Self {
        Self::Sled {
            sled_config: SledBackendConfig {
                database_name: "weir.db".to_string(),
                bucket_name: "weir".to_string(),
            },
        }
    }

    /// Create the configured backend.
    ///
    /// Document backends need a wire client and are created through
    /// [`crate::DocumentBackend::new`] instead.
    pub fn create(&self) -> Result<std::sync::Arc<dyn Backend>> {
        match self {
            Self::Sled { sled_config } => Ok(std::sync::Arc::new(SledBackend::new(
                &sled_config.database_name,
                &sled_config.bucket_name,
            ))),
            Self::Document { .. } => Err(ControlError::invalid_backend(
                "document backends require a client; construct DocumentBackend directly",
            )),
        }
    }
}

/// Location of the embedded backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SledBackendConfig {
    #[serde(rename = "databaseName")]
    pub database_name: String,

    #[serde(rename = "bucketName")]
    pub bucket_name: String,
}

/// Embedded backend: one sled tree mapping `uuid text → raw config bytes`
pub struct SledBackend {
    path: String,
    bucket: String,
    handle: RwLock<Option<sled::Tree>>,
    // Kept so the database outlives the tree handle.
    db: RwLock<Option<sled::Db>>,
}

impl SledBackend {
    pub fn new(path: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            bucket: bucket.into(),
            handle: RwLock::new(None),
            db: RwLock::new(None),
        }
    }

    fn tree(&self) -> Result<sled::Tree> {
        self.handle
            .read()
            .as_ref()
            .cloned()
            .ok_or(ControlError::NotInitialized)
    }
}

#[async_trait]
impl Backend for SledBackend {
    async fn init(&self) -> Result<()> {
        let db = sled::open(&self.path).map_err(|e| ControlError::open(&self.path, e))?;
        let tree = db.open_tree(&self.bucket)?;
        tracing::debug!(path = %self.path, bucket = %self.bucket, "opened pipeline backend");
        *self.handle.write() = Some(tree);
        *self.db.write() = Some(db);
        Ok(())
    }

    async fn store(&self, id: Uuid, raw: &[u8]) -> Result<()> {
        let tree = self.tree()?;
        tree.insert(id.to_string().as_bytes(), raw)?;
        tree.flush()?;
        Ok(())
    }

    async fn get(&self, uuid: &[u8]) -> Result<Vec<u8>> {
        let tree = self.tree()?;
        Ok(tree.get(uuid)?.map(|v| v.to_vec()).unwrap_or_default())
    }
}

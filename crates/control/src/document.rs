//! Remote document-store backend
//!
//! Persists pipeline configs in a remote document table
//! (`{UUID: bytes, Config: bytes}` rows) behind the [`DocumentClient`]
//! trait. Throttled and transient operations retry with the shared
//! exponential backoff; fatal errors surface immediately.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use weir_event::retry::RetryPolicy;

use crate::backend::Backend;
use crate::error::{ControlError, Result};

/// Errors surfaced by a [`DocumentClient`] implementation
#[derive(Debug, Error)]
pub enum DocumentClientError {
    #[error("document store throughput exceeded: {0}")]
    Throttled(String),

    #[error("transient document store error: {0}")]
    Transient(String),

    #[error("document store error: {0}")]
    Fatal(String),
}

impl DocumentClientError {
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Throttled(_) | Self::Transient(_))
    }
}

/// Wire protocol of the remote document table
#[async_trait]
pub trait DocumentClient: Send + Sync {
    async fn put(
        &self,
        table: &str,
        key: &[u8],
        value: &[u8],
    ) -> std::result::Result<(), DocumentClientError>;

    async fn get(
        &self,
        table: &str,
        key: &[u8],
    ) -> std::result::Result<Option<Vec<u8>>, DocumentClientError>;
}

/// Table name and retry budget for the document backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentBackendConfig {
    #[serde(rename = "tableName")]
    pub table_name: String,

    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_retries() -> u32 {
    5
}

/// Remote backend over a [`DocumentClient`]
pub struct DocumentBackend {
    client: std::sync::Arc<dyn DocumentClient>,
    table: String,
    retry: RetryPolicy,
}

impl DocumentBackend {
    pub fn new(client: std::sync::Arc<dyn DocumentClient>, config: &DocumentBackendConfig) -> Self {
        Self {
            client,
            table: config.table_name.clone(),
            retry: RetryPolicy::new(config.retries),
        }
    }

    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, DocumentClientError>>,
    {
        let mut attempt = 0u32;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.retryable() && !self.retry.exhausted(attempt) => {
                    let delay = self.retry.delay(attempt);
                    tracing::debug!(
                        table = %self.table,
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "document store call failed, backing off"
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(ControlError::document(operation, e)),
            }
        }
    }
}

#[async_trait]
impl Backend for DocumentBackend {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn store(&self, id: Uuid, raw: &[u8]) -> Result<()> {
        let key = id.to_string();
        self.with_retry("put", || self.client.put(&self.table, key.as_bytes(), raw))
            .await
    }

    async fn get(&self, uuid: &[u8]) -> Result<Vec<u8>> {
        let value = self
            .with_retry("get", || self.client.get(&self.table, uuid))
            .await?;
        Ok(value.unwrap_or_default())
    }
}

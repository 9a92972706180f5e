//! Generic queue sink
//!
//! JSON-encodes each record and sends it to a remote queue service through
//! the [`QueueClient`] trait. Throttled and transient sends retry with the
//! shared backoff, bounded by the configured policy; exhausted or fatal
//! sends drop the record and are logged.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use weir_config::QueueSinkConfig;
use weir_event::retry::RetryPolicy;

use crate::error::{QueueClientError, Result};
use crate::sink::{Sink, SinkInput};

/// Wire protocol of a remote queue service
#[async_trait]
pub trait QueueClient: Send + Sync {
    async fn send(&self, queue_url: &str, body: &str) -> std::result::Result<(), QueueClientError>;
}

/// Builds a queue client for an `SQS` sink config
pub type QueueClientFactory =
    Arc<dyn Fn(&str, &QueueSinkConfig) -> Result<Arc<dyn QueueClient>> + Send + Sync>;

pub struct QueueSink {
    client: Arc<dyn QueueClient>,
    queue_url: String,
    retry: RetryPolicy,
}

impl QueueSink {
    pub fn new(
        client: Arc<dyn QueueClient>,
        queue_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            retry,
        }
    }

    async fn send_with_retry(&self, body: &str) {
        let mut attempt = 0u32;
        loop {
            match self.client.send(&self.queue_url, body).await {
                Ok(()) => return,
                Err(e) if e.retryable() && !self.retry.exhausted(attempt) => {
                    let delay = self.retry.delay(attempt);
                    tracing::debug!(
                        queue = %self.queue_url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "queue send failed, backing off"
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(queue = %self.queue_url, error = %e, "unable to send to queue");
                    return;
                }
            }
        }
    }
}

#[async_trait]
impl Sink for QueueSink {
    async fn init(&mut self) -> Result<()> {
        Ok(())
    }

    async fn run(self: Box<Self>, mut input: mpsc::Receiver<SinkInput>) {
        tracing::debug!(queue = %self.queue_url, "queue sink sending");
        while let Some(value) = input.recv().await {
            let Some(record) = value else { continue };
            match serde_json::to_string(&record.to_json()) {
                Ok(body) => self.send_with_retry(&body).await,
                Err(e) => {
                    tracing::error!(queue = %self.queue_url, error = %e, "unable to encode record")
                }
            }
        }
        tracing::debug!(queue = %self.queue_url, "queue sink finished");
    }
}

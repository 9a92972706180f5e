//! Generic sharded stream source
//!
//! Consumes a sharded queue service (Kinesis-style streams, partitioned
//! topics) through the [`StreamClient`] trait: discover shards, open a
//! cursor per shard, fetch batches and emit each record. One worker task
//! runs per shard.
//!
//! Progress is checkpointed per shard in a persistent [`CheckpointStore`],
//! and a worker only processes a shard while holding its time-based lease
//! (renewed inside a safety margin before expiry; an expired lease is
//! stealable by another process). When the upstream reports a shard as
//! closed the shard is removed from the store and never revived.
//!
//! Throttled and transient fetch errors retry with the shared exponential
//! backoff, bounded by the configured policy; any other error is fatal to
//! that shard only.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use weir_event::retry::RetryPolicy;

use crate::checkpoint::CheckpointStore;
use crate::error::{Result, SourceError, StreamClientError};
use crate::source::Source;
use crate::{DEFAULT_LEASE, DEFAULT_LEASE_MARGIN};

/// One fetched batch of records
#[derive(Debug, Default)]
pub struct FetchResult {
    pub records: Vec<Bytes>,

    /// Cursor for the next fetch; `None` means the shard is closed
    pub next_cursor: Option<String>,
}

/// Wire protocol of a sharded queue service.
///
/// Implementations are cloud-specific and registered with the source
/// factory; the driver only depends on this boundary.
#[async_trait]
pub trait StreamClient: Send + Sync {
    /// Discover the stream's current shards
    async fn list_shards(&self, stream_name: &str) -> std::result::Result<Vec<String>, StreamClientError>;

    /// Open a cursor on a shard, resuming from a checkpoint when given
    async fn open_cursor(
        &self,
        stream_name: &str,
        shard_id: &str,
        checkpoint: Option<&str>,
    ) -> std::result::Result<String, StreamClientError>;

    /// Fetch the next batch behind a cursor
    async fn fetch(&self, cursor: &str) -> std::result::Result<FetchResult, StreamClientError>;
}

/// Tuning for the generic stream driver
#[derive(Debug, Clone)]
pub struct StreamDriverConfig {
    pub stream_name: String,
    pub checkpoint_path: String,

    /// Lease owner identity recorded in the checkpoint store
    pub owner: String,

    pub lease: Duration,
    pub lease_margin: Duration,
    pub retry: RetryPolicy,

    /// Pause between fetches that return no records
    pub idle_wait: Duration,
}

impl StreamDriverConfig {
    pub fn new(stream_name: impl Into<String>, checkpoint_path: impl Into<String>) -> Self {
        Self {
            stream_name: stream_name.into(),
            checkpoint_path: checkpoint_path.into(),
            owner: format!("weir-{}", std::process::id()),
            lease: DEFAULT_LEASE,
            lease_margin: DEFAULT_LEASE_MARGIN,
            retry: RetryPolicy::default(),
            idle_wait: Duration::from_millis(200),
        }
    }

    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    #[must_use]
    pub fn with_lease(mut self, lease: Duration, margin: Duration) -> Self {
        self.lease = lease;
        self.lease_margin = margin;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Generic sharded stream source
pub struct StreamSource {
    client: Arc<dyn StreamClient>,
    config: StreamDriverConfig,
    store: Option<Arc<CheckpointStore>>,
}

impl StreamSource {
    pub fn new(client: Arc<dyn StreamClient>, config: StreamDriverConfig) -> Self {
        Self {
            client,
            config,
            store: None,
        }
    }
}

#[async_trait]
impl Source for StreamSource {
    async fn init(&mut self) -> Result<()> {
        let store = CheckpointStore::open(&self.config.checkpoint_path, &self.config.stream_name)?;
        self.store = Some(Arc::new(store));
        Ok(())
    }

    async fn retrieve(self: Box<Self>, out: mpsc::Sender<Bytes>, cancel: CancellationToken) {
        let Some(store) = self.store else {
            tracing::error!(stream = %self.config.stream_name, "stream source was not initialized");
            return;
        };

        let shard_ids = match self.client.list_shards(&self.config.stream_name).await {
            Ok(shard_ids) => shard_ids,
            Err(e) => {
                tracing::error!(stream = %self.config.stream_name, error = %e, "unable to list shards");
                return;
            }
        };
        tracing::info!(
            stream = %self.config.stream_name,
            shards = shard_ids.len(),
            "stream source starting"
        );

        let active: Arc<Mutex<HashSet<String>>> =
            Arc::new(Mutex::new(shard_ids.iter().cloned().collect()));

        let mut workers = JoinSet::new();
        for shard_id in shard_ids {
            let worker = ShardWorker {
                client: Arc::clone(&self.client),
                store: Arc::clone(&store),
                config: self.config.clone(),
                active: Arc::clone(&active),
                shard_id,
            };
            workers.spawn(worker.run(out.clone(), cancel.child_token()));
        }
        // The clones above are the only senders the workers see; dropping
        // ours lets the channel close when the last worker finishes.
        drop(out);

        while workers.join_next().await.is_some() {}
        if let Err(e) = store.close() {
            tracing::warn!(stream = %self.config.stream_name, error = %e, "checkpoint store close failed");
        }
        tracing::info!(stream = %self.config.stream_name, "stream source finished");
    }
}

struct ShardWorker {
    client: Arc<dyn StreamClient>,
    store: Arc<CheckpointStore>,
    config: StreamDriverConfig,
    active: Arc<Mutex<HashSet<String>>>,
    shard_id: String,
}

impl ShardWorker {
    async fn run(self, out: mpsc::Sender<Bytes>, cancel: CancellationToken) {
        if let Err(e) = self.consume(&out, &cancel).await {
            tracing::error!(
                stream = %self.config.stream_name,
                shard = %self.shard_id,
                error = %e,
                "shard worker failed"
            );
        }
        self.active.lock().remove(&self.shard_id);
    }

    async fn consume(&self, out: &mpsc::Sender<Bytes>, cancel: &CancellationToken) -> Result<()> {
        let lease = match self
            .store
            .acquire(&self.shard_id, &self.config.owner, self.config.lease)?
        {
            Some(lease) => lease,
            None => {
                tracing::debug!(shard = %self.shard_id, "lease held elsewhere, skipping shard");
                return Ok(());
            }
        };
        let mut lease_timeout = lease.lease_timeout;

        let mut cursor = self
            .client
            .open_cursor(
                &self.config.stream_name,
                &self.shard_id,
                lease.checkpoint.as_deref(),
            )
            .await
            .map_err(SourceError::Client)?;

        let mut attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            // Renew inside the safety margin; losing the lease abandons
            // the shard to its new owner.
            let margin = chrono::Duration::from_std(self.config.lease_margin)
                .unwrap_or_else(|_| chrono::Duration::seconds(5));
            if lease_timeout - margin <= Utc::now() {
                match self
                    .store
                    .renew(&self.shard_id, &self.config.owner, self.config.lease)?
                {
                    Some(renewed) => lease_timeout = renewed.lease_timeout,
                    None => {
                        tracing::warn!(shard = %self.shard_id, "lost lease, abandoning shard");
                        return Ok(());
                    }
                }
            }

            match self.client.fetch(&cursor).await {
                Ok(batch) => {
                    attempt = 0;
                    let idle = batch.records.is_empty();
                    for record in batch.records {
                        let sent = tokio::select! {
                            _ = cancel.cancelled() => false,
                            res = out.send(record) => res.is_ok(),
                        };
                        if !sent {
                            return Ok(());
                        }
                    }

                    match batch.next_cursor {
                        Some(next) => {
                            cursor = next;
                            self.store
                                .save_checkpoint(&self.shard_id, &self.config.owner, &cursor)?;
                        }
                        None => {
                            tracing::info!(shard = %self.shard_id, "shard closed, retiring");
                            self.store.remove(&self.shard_id)?;
                            return Ok(());
                        }
                    }

                    if idle {
                        tokio::select! {
                            _ = cancel.cancelled() => return Ok(()),
                            _ = tokio::time::sleep(self.config.idle_wait) => {}
                        }
                    }
                }
                Err(e) if e.retryable() => {
                    if self.config.retry.exhausted(attempt) {
                        return Err(SourceError::Client(e));
                    }
                    let delay = self.config.retry.delay(attempt);
                    tracing::debug!(
                        shard = %self.shard_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "fetch throttled, backing off"
                    );
                    attempt += 1;
                    tokio::select! {
                        _ = cancel.cancelled() => return Ok(()),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => return Err(SourceError::Client(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Two shards, a fixed set of batches each, then closed.
    struct MockClient {
        batches: HashMap<String, Vec<Vec<&'static str>>>,
        throttle_first: AtomicU32,
    }

    impl MockClient {
        fn new() -> Self {
            let mut batches = HashMap::new();
            batches.insert(
                "shard-0".to_string(),
                vec![vec!["a0", "a1"], vec!["a2"]],
            );
            batches.insert("shard-1".to_string(), vec![vec!["b0"]]);
            Self {
                batches,
                throttle_first: AtomicU32::new(0),
            }
        }

        fn throttling(mut self, failures: u32) -> Self {
            self.throttle_first = AtomicU32::new(failures);
            self
        }
    }

    #[async_trait]
    impl StreamClient for MockClient {
        async fn list_shards(
            &self,
            _stream_name: &str,
        ) -> std::result::Result<Vec<String>, StreamClientError> {
            let mut shards: Vec<String> = self.batches.keys().cloned().collect();
            shards.sort();
            Ok(shards)
        }

        async fn open_cursor(
            &self,
            _stream_name: &str,
            shard_id: &str,
            checkpoint: Option<&str>,
        ) -> std::result::Result<String, StreamClientError> {
            let index = checkpoint
                .and_then(|c| c.rsplit(':').next())
                .and_then(|i| i.parse::<usize>().ok())
                .map(|i| i + 1)
                .unwrap_or(0);
            Ok(format!("{shard_id}:{index}"))
        }

        async fn fetch(
            &self,
            cursor: &str,
        ) -> std::result::Result<FetchResult, StreamClientError> {
            if self
                .throttle_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StreamClientError::Throttled("slow down".into()));
            }

            let (shard_id, index) = cursor.split_once(':').unwrap();
            let index: usize = index.parse().unwrap();
            let batches = &self.batches[shard_id];
            if index >= batches.len() {
                return Ok(FetchResult {
                    records: Vec::new(),
                    next_cursor: None,
                });
            }
            Ok(FetchResult {
                records: batches[index].iter().map(|r| Bytes::from_static(r.as_bytes())).collect(),
                next_cursor: Some(format!("{shard_id}:{}", index + 1)),
            })
        }
    }

    fn driver_config(dir: &tempfile::TempDir) -> StreamDriverConfig {
        StreamDriverConfig::new("events", dir.path().join("cp.db").display().to_string())
            .with_owner("test-worker")
            .with_retry(RetryPolicy::new(4).with_base(Duration::from_millis(1)))
    }

    async fn collect(source: StreamSource) -> Vec<Bytes> {
        let mut source = Box::new(source);
        source.init().await.unwrap();
        let (tx, mut rx) = mpsc::channel(16);
        let handle = tokio::spawn(source.retrieve(tx, CancellationToken::new()));
        let mut records = Vec::new();
        while let Some(record) = rx.recv().await {
            records.push(record);
        }
        handle.await.unwrap();
        records
    }

    #[tokio::test]
    async fn test_consumes_all_shards_until_closed() {
        let dir = tempfile::tempdir().unwrap();
        let source = StreamSource::new(Arc::new(MockClient::new()), driver_config(&dir));

        let mut records = collect(source).await;
        records.sort();
        assert_eq!(
            records,
            vec![
                Bytes::from_static(b"a0"),
                Bytes::from_static(b"a1"),
                Bytes::from_static(b"a2"),
                Bytes::from_static(b"b0"),
            ]
        );

        // Closed shards were retired from the checkpoint store.
        let store = CheckpointStore::open(
            &dir.path().join("cp.db").display().to_string(),
            "events",
        )
        .unwrap();
        assert!(store.get("shard-0").unwrap().is_none());
        assert!(store.get("shard-1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_throttled_fetches_are_retried() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient::new().throttling(2);
        let source = StreamSource::new(Arc::new(client), driver_config(&dir));

        let records = collect(source).await;
        assert_eq!(records.len(), 4);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail_the_shard_only() {
        let dir = tempfile::tempdir().unwrap();
        // More throttle failures than the policy allows.
        let client = MockClient::new().throttling(100);
        let source = StreamSource::new(Arc::new(client), driver_config(&dir));

        // Both shards fail after exhausting retries; the channel still
        // closes cleanly with no records.
        let records = collect(source).await;
        assert!(records.is_empty());
    }
}

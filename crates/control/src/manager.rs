//! Pipeline manager

use std::sync::Arc;

use uuid::Uuid;
use weir_event::DecoderRegistry;
use weir_pipeline::{Pipeline, PipelineBuilder};
use weir_rules::RuleRegistry;
use weir_sinks::{DefaultSinkFactory, SinkFactory};
use weir_sources::{DefaultSourceFactory, SourceFactory};

use crate::backend::Backend;
use crate::error::Result;
use crate::monitor::{Monitor, NoopMonitor};

/// Creates, persists and fetches pipelines.
///
/// Holds the pluggable source/sink factories and the rule and decoder
/// registries used to build pipelines; tests inject doubles through the
/// `with_*` constructors.
pub struct PipelineManager {
    backend: Arc<dyn Backend>,
    source_factory: Arc<dyn SourceFactory>,
    sink_factory: Arc<dyn SinkFactory>,
    rules: Arc<RuleRegistry>,
    decoders: Arc<DecoderRegistry>,
    monitor: Arc<dyn Monitor>,
}

impl PipelineManager {
    /// Manager with production factories, the built-in rules and a no-op
    /// monitor
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            source_factory: Arc::new(DefaultSourceFactory::new()),
            sink_factory: Arc::new(DefaultSinkFactory::new()),
            rules: Arc::new(RuleRegistry::with_builtins()),
            decoders: Arc::new(DecoderRegistry::new()),
            monitor: Arc::new(NoopMonitor),
        }
    }

    #[must_use]
    pub fn with_source_factory(mut self, factory: Arc<dyn SourceFactory>) -> Self {
        self.source_factory = factory;
        self
    }

    #[must_use]
    pub fn with_sink_factory(mut self, factory: Arc<dyn SinkFactory>) -> Self {
        self.sink_factory = factory;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: Arc<RuleRegistry>) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_decoders(mut self, decoders: Arc<DecoderRegistry>) -> Self {
        self.decoders = decoders;
        self
    }

    #[must_use]
    pub fn with_monitor(mut self, monitor: Arc<dyn Monitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Open the backend
    pub async fn init(&self) -> Result<()> {
        self.backend.init().await
    }

    /// Parse, validate and build a pipeline from raw JSON bytes, assign it
    /// a fresh UUID and persist the bytes under it.
    ///
    /// The bytes are stored exactly as received; `get` returns them
    /// byte-identical.
    pub async fn new_pipeline(&self, raw: &[u8]) -> Result<Pipeline> {
        let id = Uuid::new_v4();
        let builder = PipelineBuilder::new(
            Arc::clone(&self.source_factory),
            Arc::clone(&self.sink_factory),
            Arc::clone(&self.rules),
            Arc::clone(&self.decoders),
        );
        let pipeline = builder.build(id, raw)?;
        self.backend.store(id, raw).await?;
        self.monitor.pipeline_started(&id.to_string());
        tracing::info!(pipeline = %id, "pipeline created");
        Ok(pipeline)
    }

    /// Persist (or overwrite) a pipeline's raw config by its UUID
    pub async fn store(&self, pipeline: &Pipeline) -> Result<()> {
        self.backend.store(pipeline.id(), pipeline.raw_config()).await
    }

    /// Fetch stored raw config bytes; absent UUIDs yield empty bytes
    pub async fn get(&self, uuid: &[u8]) -> Result<Vec<u8>> {
        self.backend.get(uuid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SledBackend;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        dir: tempfile::TempDir,
        manager: PipelineManager,
    }

    #[derive(Default)]
    struct CountingMonitor {
        started: AtomicUsize,
    }

    impl Monitor for CountingMonitor {
        fn pipeline_started(&self, _name: &str) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn fixture() -> Fixture {
        fixture_with_monitor(Arc::new(NoopMonitor)).await
    }

    async fn fixture_with_monitor(monitor: Arc<dyn Monitor>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(SledBackend::new(
            dir.path().join("manager.db").display().to_string(),
            "pipelines",
        ));
        let manager = PipelineManager::new(backend).with_monitor(monitor);
        manager.init().await.unwrap();
        Fixture { dir, manager }
    }

    fn valid_config(fixture: &Fixture) -> Vec<u8> {
        let plugin = fixture.dir.path().join("echo.wasm");
        std::fs::write(&plugin, b"").unwrap();
        json!({
            "eventFolder": fixture.dir.path().join("events").display().to_string(),
            "sources": {"fileInput": {"type": "File", "file_config": {"path": "input"}}},
            "sinks": {"fileOutput": {"type": "File", "file_config": {"path": "out"}}},
            "rules": {"aRule": {
                "source": "fileInput",
                "plugin": plugin.display().to_string(),
                "sink": "fileOutput"
            }}
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_new_pipeline_persists_raw_bytes() {
        let fixture = fixture().await;
        let raw = valid_config(&fixture);

        let pipeline = fixture.manager.new_pipeline(&raw).await.unwrap();
        let fetched = fixture
            .manager
            .get(pipeline.id().to_string().as_bytes())
            .await
            .unwrap();
        assert_eq!(fetched, raw);
    }

    #[tokio::test]
    async fn test_fresh_uuid_per_pipeline() {
        let fixture = fixture().await;
        let raw = valid_config(&fixture);

        let first = fixture.manager.new_pipeline(&raw).await.unwrap();
        let second = fixture.manager.new_pipeline(&raw).await.unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_and_not_stored() {
        let fixture = fixture().await;
        let raw = br#"{"sources":{},"sinks":{}}"#;
        assert!(fixture.manager.new_pipeline(raw).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_uuid_yields_empty_bytes() {
        let fixture = fixture().await;
        let fetched = fixture
            .manager
            .get(Uuid::new_v4().to_string().as_bytes())
            .await
            .unwrap();
        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn test_monitor_sees_created_pipelines() {
        let monitor = Arc::new(CountingMonitor::default());
        let fixture = fixture_with_monitor(Arc::clone(&monitor) as Arc<dyn Monitor>).await;
        let raw = valid_config(&fixture);

        fixture.manager.new_pipeline(&raw).await.unwrap();
        fixture.manager.new_pipeline(&raw).await.unwrap();
        assert_eq!(monitor.started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_store_overwrites_by_uuid() {
        let fixture = fixture().await;
        let raw = valid_config(&fixture);

        let pipeline = fixture.manager.new_pipeline(&raw).await.unwrap();
        fixture.manager.store(&pipeline).await.unwrap();
        let fetched = fixture
            .manager
            .get(pipeline.id().to_string().as_bytes())
            .await
            .unwrap();
        assert_eq!(fetched, raw);
    }
}

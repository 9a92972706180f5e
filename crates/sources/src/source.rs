//! Source contract and factory

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use weir_config::SourceConfig;

use crate::error::{Result, SourceError};
use crate::file::FileSource;
use crate::stream::{StreamClient, StreamDriverConfig, StreamSource};
use crate::websocket::WebSocketSource;

/// A source driver.
///
/// `init` performs setup that may fail (opening files, reaching services);
/// failures abort pipeline start. `retrieve` then runs on a dedicated task
/// until exhaustion or cancellation and MUST close the out-channel on
/// completion — which it does by consuming `out` and dropping it on return.
/// Cancellation lets in-flight work finish but starts nothing new.
#[async_trait]
pub trait Source: Send {
    async fn init(&mut self) -> Result<()>;

    async fn retrieve(self: Box<Self>, out: mpsc::Sender<Bytes>, cancel: CancellationToken);
}

/// Builds a stream client for a `Kinesis`/`Kafka` source config
pub type StreamClientFactory =
    Arc<dyn Fn(&str, &SourceConfig) -> Result<Arc<dyn StreamClient>> + Send + Sync>;

/// Creates source drivers from configuration.
///
/// The pipeline manager holds one of these; tests swap in doubles.
pub trait SourceFactory: Send + Sync {
    fn create(&self, name: &str, config: &SourceConfig) -> Result<Box<dyn Source>>;
}

/// Production factory.
///
/// File and CertStream sources are built directly. Kinesis and Kafka map to
/// the generic [`StreamSource`]; their wire clients are cloud-specific and
/// must be registered per config tag before such a source can be created.
#[derive(Default)]
pub struct DefaultSourceFactory {
    stream_clients: HashMap<&'static str, StreamClientFactory>,
}

impl DefaultSourceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stream client factory for a config tag (`"Kinesis"` or
    /// `"Kafka"`)
    pub fn register_stream_client(&mut self, kind: &'static str, factory: StreamClientFactory) {
        self.stream_clients.insert(kind, factory);
    }

    fn stream_source(
        &self,
        name: &str,
        config: &SourceConfig,
        stream_name: &str,
        checkpoint_path: &str,
    ) -> Result<Box<dyn Source>> {
        let kind = config.kind();
        let factory = self.stream_clients.get(kind).ok_or_else(|| {
            SourceError::unsupported(
                kind,
                name,
                format!("no stream client registered for {kind} sources"),
            )
        })?;
        let client = factory(name, config)?;
        let driver_config = StreamDriverConfig::new(stream_name, checkpoint_path);
        Ok(Box::new(StreamSource::new(client, driver_config)))
    }
}

impl SourceFactory for DefaultSourceFactory {
    fn create(&self, name: &str, config: &SourceConfig) -> Result<Box<dyn Source>> {
        match config {
            SourceConfig::File { file_config } => {
                Ok(Box::new(FileSource::new(&file_config.path)))
            }
            SourceConfig::CertStream { websocket_config } => {
                Ok(Box::new(WebSocketSource::new(&websocket_config.url)))
            }
            SourceConfig::Kinesis { kinesis_config } => self.stream_source(
                name,
                config,
                &kinesis_config.stream_name,
                &kinesis_config.checkpoint_path,
            ),
            SourceConfig::Kafka { kafka_config } => {
                self.stream_source(name, config, &kafka_config.topic, "weir-checkpoints.db")
            }
            SourceConfig::Forward => Err(SourceError::unsupported(
                "Forward",
                name,
                "forward sources are wired internally for rule chaining",
            )),
        }
    }
}

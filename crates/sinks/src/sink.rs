//! Sink contract and factory

use async_trait::async_trait;
use tokio::sync::mpsc;
use weir_config::SinkConfig;
use weir_event::Record;
use weir_event::retry::RetryPolicy;

use crate::error::{Result, SinkError};
use crate::file::FileSink;
use crate::queue::QueueSink;

/// What flows into a sink: a record, or a `None` marker from a rule that
/// suppressed its output for one input. Sinks skip the markers.
pub type SinkInput = Option<Record>;

/// A sink driver.
///
/// `init` performs setup that may fail; failures abort pipeline start.
/// `run` then consumes the input channel until it closes and persists every
/// non-`None` value. Returning from `run` is the drain barrier the
/// pipeline's shutdown waits on.
#[async_trait]
pub trait Sink: Send {
    async fn init(&mut self) -> Result<()>;

    async fn run(self: Box<Self>, input: mpsc::Receiver<SinkInput>);
}

/// Creates sink drivers from configuration.
///
/// The pipeline manager holds one of these; tests swap in doubles.
pub trait SinkFactory: Send + Sync {
    fn create(&self, name: &str, config: &SinkConfig) -> Result<Box<dyn Sink>>;
}

/// Production factory.
///
/// The SQS tag maps to the generic [`QueueSink`]; its wire client is
/// cloud-specific and must be registered before such a sink can be created.
#[derive(Default)]
pub struct DefaultSinkFactory {
    queue_client: Option<crate::queue::QueueClientFactory>,
}

impl DefaultSinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the queue client used for `SQS` sinks
    pub fn register_queue_client(&mut self, factory: crate::queue::QueueClientFactory) {
        self.queue_client = Some(factory);
    }
}

impl SinkFactory for DefaultSinkFactory {
    fn create(&self, name: &str, config: &SinkConfig) -> Result<Box<dyn Sink>> {
        match config {
            SinkConfig::File { file_config } => Ok(Box::new(FileSink::new(&file_config.path))),
            SinkConfig::Sqs { sqs_config } => {
                let factory = self.queue_client.as_ref().ok_or_else(|| {
                    SinkError::unsupported(
                        "SQS",
                        name,
                        "no queue client registered for SQS sinks",
                    )
                })?;
                let client = factory(name, sqs_config)?;
                let retry = RetryPolicy::new(sqs_config.retries);
                Ok(Box::new(QueueSink::new(
                    client,
                    &sqs_config.queue_url,
                    retry,
                )))
            }
            SinkConfig::Forward => Err(SinkError::unsupported(
                "Forward",
                name,
                "forward sinks are wired internally for rule chaining",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weir_config::FileSinkConfig;

    #[test]
    fn test_factory_builds_file_sink() {
        let factory = DefaultSinkFactory::new();
        let config = SinkConfig::File {
            file_config: FileSinkConfig {
                path: "out.log".to_string(),
            },
        };
        assert!(factory.create("fileOutput", &config).is_ok());
    }

    #[test]
    fn test_factory_rejects_forward() {
        let factory = DefaultSinkFactory::new();
        let err = match factory.create("fwd", &SinkConfig::Forward) {
            Err(e) => e,
            Ok(_) => panic!("expected error"),
        };
        assert!(err.to_string().contains("wired internally"));
    }

    #[test]
    fn test_factory_requires_queue_client() {
        let factory = DefaultSinkFactory::new();
        let config: SinkConfig = serde_json::from_str(
            r#"{"type":"SQS","sqs_config":{"queueUrl":"https://sqs/q","region":"eu-west-1"}}"#,
        )
        .unwrap();
        let err = match factory.create("queue", &config) {
            Err(e) => e,
            Ok(_) => panic!("expected error"),
        };
        assert!(err.to_string().contains("no queue client registered"));
    }
}

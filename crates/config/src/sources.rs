//! Source configuration

use serde::{Deserialize, Serialize};

/// Configuration for a named source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SourceConfig {
    /// Regular file, one record per line
    File {
        #[serde(rename = "file_config")]
        file_config: FileSourceConfig,
    },

    /// Kinesis-style sharded stream, served by the generic streaming driver
    Kinesis {
        #[serde(rename = "kinesis_config")]
        kinesis_config: StreamSourceConfig,
    },

    /// Kafka topic, served by the generic streaming driver
    Kafka {
        #[serde(rename = "kafka_config")]
        kafka_config: KafkaSourceConfig,
    },

    /// Websocket feed of certificate-transparency records
    CertStream {
        #[serde(rename = "websocket_config")]
        websocket_config: WebsocketSourceConfig,
    },

    /// In-process forwarder. Wired internally for rule→rule edges; not
    /// creatable from user configuration.
    Forward,
}

impl SourceConfig {
    /// The `type` tag, for log and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File { .. } => "File",
            Self::Kinesis { .. } => "Kinesis",
            Self::Kafka { .. } => "Kafka",
            Self::CertStream { .. } => "CertStream",
            Self::Forward => "Forward",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSourceConfig {
    pub path: String,
}

/// Stream name plus checkpoint location for the generic streaming driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSourceConfig {
    #[serde(rename = "streamName")]
    pub stream_name: String,

    /// Where shard checkpoints and leases are kept
    #[serde(rename = "checkpointPath", default = "default_checkpoint_path")]
    pub checkpoint_path: String,
}

fn default_checkpoint_path() -> String {
    "weir-checkpoints.db".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KafkaSourceConfig {
    pub broker: String,
    pub topic: String,
    #[serde(default)]
    pub partitions: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsocketSourceConfig {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_source_parses() {
        let config: SourceConfig =
            serde_json::from_str(r#"{"type":"File","file_config":{"path":"in.log"}}"#).unwrap();
        assert_eq!(config.kind(), "File");
    }

    #[test]
    fn test_kinesis_source_parses_with_default_checkpoint() {
        let config: SourceConfig =
            serde_json::from_str(r#"{"type":"Kinesis","kinesis_config":{"streamName":"events"}}"#)
                .unwrap();
        match config {
            SourceConfig::Kinesis { kinesis_config } => {
                assert_eq!(kinesis_config.stream_name, "events");
                assert_eq!(kinesis_config.checkpoint_path, "weir-checkpoints.db");
            }
            other => panic!("unexpected config: {other:?}"),
        }
    }

    #[test]
    fn test_kafka_source_parses() {
        let config: SourceConfig = serde_json::from_str(
            r#"{"type":"Kafka","kafka_config":{"broker":"localhost:9092","topic":"t","partitions":3}}"#,
        )
        .unwrap();
        assert_eq!(config.kind(), "Kafka");
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(serde_json::from_str::<SourceConfig>(r#"{"type":"Carrier"}"#).is_err());
    }
}

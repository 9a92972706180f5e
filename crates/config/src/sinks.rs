//! Sink configuration

use serde::{Deserialize, Serialize};

/// Configuration for a named sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SinkConfig {
    /// Append to a file, one JSON value per line
    File {
        #[serde(rename = "file_config")]
        file_config: FileSinkConfig,
    },

    /// Remote queue, served by the generic queue driver
    #[serde(rename = "SQS")]
    Sqs {
        #[serde(rename = "sqs_config")]
        sqs_config: QueueSinkConfig,
    },

    /// In-process forwarder. Wired internally for rule→rule edges; not
    /// creatable from user configuration.
    Forward,
}

impl SinkConfig {
    /// The `type` tag, for log and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File { .. } => "File",
            Self::Sqs { .. } => "SQS",
            Self::Forward => "Forward",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSinkConfig {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSinkConfig {
    #[serde(rename = "queueUrl")]
    pub queue_url: String,

    pub region: String,

    /// Send attempts before a record is dropped
    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_retries() -> u32 {
    5
}

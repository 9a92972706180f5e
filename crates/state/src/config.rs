//! State configuration

use serde::{Deserialize, Serialize};

/// Configuration for a named state in the pipeline config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StateConfig {
    /// Persistent key/value store
    #[serde(rename = "KV")]
    Kv {
        #[serde(rename = "kvConfig")]
        kv_config: KvConfig,
    },

    /// In-memory counter
    Count,
}

/// Location of a persistent KV store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvConfig {
    #[serde(rename = "dbFileName")]
    pub db_file_name: String,

    #[serde(rename = "bucketName")]
    pub bucket_name: String,
}

//! Shard checkpoint and lease store
//!
//! Persists one row per stream shard: the last saved cursor, the current
//! owner and its lease expiry. A shard may only be processed while holding
//! an unexpired lease; expired leases are stealable. Rows are JSON in a
//! sled tree named after the stream.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use weir_state::KvStore;

use crate::error::{Result, SourceError};

/// One shard's persisted status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardState {
    pub shard_id: String,

    /// Last saved cursor, `None` until the first checkpoint
    pub checkpoint: Option<String>,

    /// Worker currently holding the lease
    pub assigned_to: String,

    /// When the lease expires and the shard becomes stealable
    pub lease_timeout: DateTime<Utc>,
}

/// Persistent store of shard leases for one stream
pub struct CheckpointStore {
    kv: KvStore,
}

impl CheckpointStore {
    pub fn open(path: &str, stream_name: &str) -> Result<Self> {
        Ok(Self {
            kv: KvStore::open(path, stream_name)?,
        })
    }

    pub fn get(&self, shard_id: &str) -> Result<Option<ShardState>> {
        match self.kv.get(shard_id.as_bytes())? {
            Some(raw) => {
                let state = serde_json::from_slice(&raw).map_err(|e| {
                    SourceError::CorruptShardState {
                        shard: shard_id.to_string(),
                        source: e,
                    }
                })?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Try to take the lease on a shard.
    ///
    /// Succeeds when the shard is unclaimed, already ours, or its lease has
    /// expired. Returns `None` while another owner holds a live lease.
    pub fn acquire(
        &self,
        shard_id: &str,
        owner: &str,
        lease: std::time::Duration,
    ) -> Result<Option<ShardState>> {
        let now = Utc::now();
        let existing = self.get(shard_id)?;

        if let Some(state) = &existing {
            if state.assigned_to != owner && state.lease_timeout > now {
                return Ok(None);
            }
        }

        let state = ShardState {
            shard_id: shard_id.to_string(),
            checkpoint: existing.and_then(|s| s.checkpoint),
            assigned_to: owner.to_string(),
            lease_timeout: now + Duration::from_std(lease).unwrap_or_else(|_| Duration::seconds(30)),
        };
        self.put(&state)?;
        Ok(Some(state))
    }

    /// Extend our lease. Fails (returns `false`) if the shard has been
    /// stolen since we last held it.
    pub fn renew(
        &self,
        shard_id: &str,
        owner: &str,
        lease: std::time::Duration,
    ) -> Result<Option<ShardState>> {
        match self.get(shard_id)? {
            Some(state) if state.assigned_to == owner => {
                let renewed = ShardState {
                    lease_timeout: Utc::now()
                        + Duration::from_std(lease).unwrap_or_else(|_| Duration::seconds(30)),
                    ..state
                };
                self.put(&renewed)?;
                Ok(Some(renewed))
            }
            _ => Ok(None),
        }
    }

    /// Record the latest cursor for a shard we own
    pub fn save_checkpoint(&self, shard_id: &str, owner: &str, cursor: &str) -> Result<bool> {
        match self.get(shard_id)? {
            Some(state) if state.assigned_to == owner => {
                let updated = ShardState {
                    checkpoint: Some(cursor.to_string()),
                    ..state
                };
                self.put(&updated)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Forget a shard. Closed shards are removed and never revived.
    pub fn remove(&self, shard_id: &str) -> Result<()> {
        self.kv.delete(shard_id.as_bytes())?;
        Ok(())
    }

    pub fn close(&self) -> Result<()> {
        self.kv.close()?;
        Ok(())
    }

    fn put(&self, state: &ShardState) -> Result<()> {
        let raw = serde_json::to_vec(state).map_err(|e| SourceError::CorruptShardState {
            shard: state.shard_id.clone(),
            source: e,
        })?;
        self.kv.put(state.shard_id.as_bytes(), &raw)?;
        Ok(())
    }
}

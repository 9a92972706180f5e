//! Weir Rule State
//!
//! Stateful rules keep their working set in a state store declared in the
//! pipeline config. Two variants exist:
//!
//! - [`KvStore`] — a persistent key/value store on an embedded sled database
//!   (one named tree per declared bucket). Each write is individually
//!   durable; iteration sees a consistent snapshot.
//! - [`Counter`] — an atomic in-memory counter for rate-based rules, with a
//!   read-and-reset `window` operation.
//!
//! Rules receive an opaque [`State`] handle and probe for the capability
//! they need; asking a counter-backed state for KV access (or vice versa)
//! yields [`StateError::Incompatible`], which fails pipeline creation.

mod config;
mod counter;
mod error;
mod kv;

use std::sync::Arc;

pub use config::{KvConfig, StateConfig};
pub use counter::Counter;
pub use error::{Result, StateError};
pub use kv::KvStore;

/// A rule-scoped state handle: either a persistent KV store or an
/// in-memory counter.
pub enum State {
    Kv(KvStore),
    Counter(Counter),
}

impl State {
    /// Create and initialize the store a config describes
    pub fn create(config: &StateConfig) -> Result<Arc<Self>> {
        let state = match config {
            StateConfig::Kv { kv_config } => {
                Self::Kv(KvStore::open(&kv_config.db_file_name, &kv_config.bucket_name)?)
            }
            StateConfig::Count => Self::Counter(Counter::new()),
        };
        Ok(Arc::new(state))
    }

    /// The KV capability, or `Incompatible` if this state is a counter
    pub fn kv(&self) -> Result<&KvStore> {
        match self {
            Self::Kv(store) => Ok(store),
            Self::Counter(_) => Err(StateError::incompatible("KV", "Count")),
        }
    }

    /// The counter capability, or `Incompatible` if this state is a KV store
    pub fn counter(&self) -> Result<&Counter> {
        match self {
            Self::Counter(counter) => Ok(counter),
            Self::Kv(_) => Err(StateError::incompatible("Count", "KV")),
        }
    }

    /// Flush and release the underlying store. Safe to call more than once.
    pub fn close(&self) -> Result<()> {
        match self {
            Self::Kv(store) => store.close(),
            Self::Counter(counter) => {
                counter.close();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_mismatch_is_incompatible() {
        let counter_state = State::Counter(Counter::new());
        let err = counter_state.kv().unwrap_err();
        assert!(matches!(err, StateError::Incompatible { .. }));
        assert!(counter_state.counter().is_ok());
    }

    #[test]
    fn test_create_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StateConfig::Kv {
            kv_config: KvConfig {
                db_file_name: dir.path().join("state.db").display().to_string(),
                bucket_name: "bucket".to_string(),
            },
        };
        let state = State::create(&config).unwrap();
        assert!(state.kv().is_ok());
        assert!(state.counter().is_err());
        state.close().unwrap();

        let counter = State::create(&StateConfig::Count).unwrap();
        assert!(counter.counter().is_ok());
    }
}

//! Persistent key/value state on sled

use std::path::Path;

use crate::error::{Result, StateError};

/// A persistent key/value store backed by an embedded sled database.
///
/// The configured bucket maps to a named sled tree inside the database
/// file. Every `put`/`delete` is flushed so each write is individually
/// durable; `for_each` iterates a consistent snapshot of the tree.
/// Reads may run concurrently; sled serializes writes internally.
pub struct KvStore {
    db: sled::Db,
    tree: sled::Tree,
    path: String,
    bucket: String,
}

impl KvStore {
    /// Open (creating if absent) the database file and bucket
    pub fn open(path: impl AsRef<Path>, bucket: &str) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|e| StateError::open(path.display().to_string(), e))?;
        let tree = db.open_tree(bucket)?;
        tracing::debug!(path = %path.display(), bucket, "opened KV state store");
        Ok(Self {
            db,
            tree,
            path: path.display().to_string(),
            bucket: bucket.to_string(),
        })
    }

    /// Fetch the value stored under `key`, if any
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.tree.get(key)?.map(|v| v.to_vec()))
    }

    /// Store `value` under `key`, durably
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.tree.insert(key, value)?;
        self.tree.flush()?;
        Ok(())
    }

    /// Remove `key`, durably. Removing an absent key is not an error.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.tree.remove(key)?;
        self.tree.flush()?;
        Ok(())
    }

    /// Visit every key/value pair in a consistent snapshot
    pub fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>,
    {
        for entry in self.tree.iter() {
            let (key, value) = entry?;
            f(&key, &value)?;
        }
        Ok(())
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Flush outstanding writes and release the store
    pub fn close(&self) -> Result<()> {
        self.db.flush()?;
        tracing::debug!(path = %self.path, bucket = %self.bucket, "closed KV state store");
        Ok(())
    }
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("path", &self.path)
            .field("bucket", &self.bucket)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, KvStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path().join("kv.db"), "test").unwrap();
        (dir, store)
    }

    #[test]
    fn test_put_get_delete() {
        let (_dir, store) = open_temp();

        assert_eq!(store.get(b"missing").unwrap(), None);

        store.put(b"role-id", b"principal").unwrap();
        assert_eq!(store.get(b"role-id").unwrap(), Some(b"principal".to_vec()));

        store.delete(b"role-id").unwrap();
        assert_eq!(store.get(b"role-id").unwrap(), None);
        // Deleting again is a no-op.
        store.delete(b"role-id").unwrap();
    }

    #[test]
    fn test_for_each_sees_all_entries() {
        let (_dir, store) = open_temp();
        store.put(b"a", b"1").unwrap();
        store.put(b"b", b"2").unwrap();

        let mut seen = Vec::new();
        store
            .for_each(|k, v| {
                seen.push((k.to_vec(), v.to_vec()));
                Ok(())
            })
            .unwrap();
        seen.sort();
        assert_eq!(
            seen,
            vec![(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())]
        );
    }

    #[test]
    fn test_buckets_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");
        let first = KvStore::open(&path, "first").unwrap();
        first.put(b"key", b"one").unwrap();

        let second = first.db.open_tree("second").unwrap();
        assert_eq!(second.get(b"key").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");
        {
            let store = KvStore::open(&path, "persist").unwrap();
            store.put(b"key", b"value").unwrap();
            store.close().unwrap();
        }
        let store = KvStore::open(&path, "persist").unwrap();
        assert_eq!(store.get(b"key").unwrap(), Some(b"value".to_vec()));
    }
}

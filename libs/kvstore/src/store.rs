// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! The keyed object store.
//!
//! Keys form a slash-separated hierarchy; values are opaque strings
//! (canonical JSON in practice) preserved byte for byte. Writers serialize
//! through a single async lock, which also makes each put/delete atomic
//! with respect to the on-disk snapshot: every mutation rewrites the
//! snapshot to a temporary file and renames it into place.
//!
//! There are no multi-key transactions. Compound updates stay consistent
//! by writing one JSON value per entity and writing the parent entity
//! last on creation paths.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A key and its value, as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvPair {
    pub key: String,
    pub value: String,
}

/// The durable keyed store.
///
/// Cloning is cheap; clones share the same underlying map and snapshot.
#[derive(Clone)]
pub struct Store {
    inner: Arc<RwLock<BTreeMap<String, String>>>,
    snapshot: Option<PathBuf>,
}

const SNAPSHOT_FILE: &str = "store.json";

impl Store {
    /// Open a store backed by a snapshot file under `dir`, creating the
    /// directory and an empty store when absent.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let snapshot = dir.join(SNAPSHOT_FILE);

        let map = match tokio::fs::read_to_string(&snapshot).await {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %snapshot.display(), keys = map.len(), "Opened store");

        Ok(Self {
            inner: Arc::new(RwLock::new(map)),
            snapshot: Some(snapshot),
        })
    }

    /// Open an ephemeral in-memory store (tests, dry runs).
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BTreeMap::new())),
            snapshot: None,
        }
    }

    /// Store a value under a key, replacing any previous value.
    pub async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        map.insert(key.to_string(), value.to_string());
        self.persist(&map).await
    }

    /// Fetch the value under a key.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.read().await.get(key).cloned()
    }

    /// Whether a key is present.
    pub async fn exists(&self, key: &str) -> bool {
        self.inner.read().await.contains_key(key)
    }

    /// Remove a key. Removing an absent key is not an error.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        map.remove(key);
        self.persist(&map).await
    }

    /// List all entries whose key starts with `prefix`, in key order.
    pub async fn list(&self, prefix: &str) -> Vec<KvPair> {
        self.inner
            .read()
            .await
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| KvPair {
                key: k.clone(),
                value: v.clone(),
            })
            .collect()
    }

    /// Remove every entry under `prefix`. Returns the number removed.
    pub async fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let mut map = self.inner.write().await;
        let doomed: Vec<String> = map
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            map.remove(key);
        }
        self.persist(&map).await?;
        Ok(doomed.len())
    }

    /// Rewrite the snapshot atomically. Must be called with the write lock
    /// held so snapshots observe a consistent map.
    async fn persist(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let raw = serde_json::to_string(map)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// Keep only entries whose key has exactly `depth` path segments after
/// `prefix`. A listing of `/ns/default/resources/vNet` at depth 1 yields
/// the vNets themselves but not their subnets.
pub fn filter_by_depth(entries: Vec<KvPair>, prefix: &str, depth: usize) -> Vec<KvPair> {
    let prefix = prefix.trim_end_matches('/');
    entries
        .into_iter()
        .filter(|e| {
            let Some(rest) = e.key.strip_prefix(prefix) else {
                return false;
            };
            let Some(rest) = rest.strip_prefix('/') else {
                return false;
            };
            !rest.is_empty() && rest.split('/').filter(|s| !s.is_empty()).count() == depth
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(entries: &[(&str, &str)]) -> Vec<KvPair> {
        entries
            .iter()
            .map(|(k, v)| KvPair {
                key: k.to_string(),
                value: v.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn put_get_delete() {
        let store = Store::in_memory();
        store.put("/ns/default", r#"{"id":"default"}"#).await.unwrap();
        assert_eq!(
            store.get("/ns/default").await.as_deref(),
            Some(r#"{"id":"default"}"#)
        );

        store.delete("/ns/default").await.unwrap();
        assert_eq!(store.get("/ns/default").await, None);

        // deleting an absent key is fine
        store.delete("/ns/default").await.unwrap();
    }

    #[tokio::test]
    async fn list_is_prefix_scoped_and_ordered() {
        let store = Store::in_memory();
        store.put("/connection/aws-us-east-1", "a").await.unwrap();
        store.put("/connection/aws-us-east-1-a", "b").await.unwrap();
        store.put("/credentialHolder/admin", "c").await.unwrap();

        let listed = store.list("/connection").await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, "/connection/aws-us-east-1");
        assert_eq!(listed[1].key, "/connection/aws-us-east-1-a");
    }

    #[tokio::test]
    async fn values_round_trip_byte_for_byte() {
        let store = Store::in_memory();
        let value = r#"{"Name":"vnet1","IPv4_CIDR":"10.0.1.0/24","n":1.50}"#;
        store.put("/k", value).await.unwrap();
        assert_eq!(store.get("/k").await.as_deref(), Some(value));
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = Store::open(dir.path()).await.unwrap();
            store.put("/ns/default", "v1").await.unwrap();
            store.put("/ns/other", "v2").await.unwrap();
            store.delete("/ns/other").await.unwrap();
        }
        let store = Store::open(dir.path()).await.unwrap();
        assert_eq!(store.get("/ns/default").await.as_deref(), Some("v1"));
        assert_eq!(store.get("/ns/other").await, None);
    }

    #[tokio::test]
    async fn delete_prefix_removes_subtree() {
        let store = Store::in_memory();
        store.put("/ns/a", "1").await.unwrap();
        store.put("/ns/a/mci/m1", "2").await.unwrap();
        store.put("/ns/a/mci/m1/vm/v1", "3").await.unwrap();
        store.put("/ns/ab", "4").await.unwrap();

        let removed = store.delete_prefix("/ns/a/").await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.exists("/ns/a").await);
        assert!(store.exists("/ns/ab").await);
        assert!(!store.exists("/ns/a/mci/m1").await);
    }

    #[test]
    fn depth_filter_counts_segments_after_prefix() {
        let entries = pairs(&[
            ("/ns/default/resources/vNet/vnet1", "v"),
            ("/ns/default/resources/vNet/vnet2", "v"),
            ("/ns/default/resources/vNet/vnet1/subnet/sn1", "s"),
            ("/ns/default/resources/sshKey/k1", "k"),
        ]);

        let vnets = filter_by_depth(entries.clone(), "/ns/default/resources/vNet", 1);
        assert_eq!(vnets.len(), 2);

        let subnets = filter_by_depth(entries.clone(), "/ns/default/resources/vNet/vnet1", 2);
        assert_eq!(subnets.len(), 1);
        assert_eq!(subnets[0].key, "/ns/default/resources/vNet/vnet1/subnet/sn1");

        // trailing slash on the prefix is tolerated
        let vnets = filter_by_depth(entries, "/ns/default/resources/vNet/", 1);
        assert_eq!(vnets.len(), 2);
    }

    #[test]
    fn depth_filter_rejects_sibling_prefix_match() {
        // "/connection" must not swallow "/connectionX/..." keys
        let entries = pairs(&[("/connectionX/foo", "v"), ("/connection/foo", "v")]);
        let filtered = filter_by_depth(entries, "/connection", 1);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].key, "/connection/foo");
    }
}

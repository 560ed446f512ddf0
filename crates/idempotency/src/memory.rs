use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Fingerprint, IdempotencyStore, Result};

/// Process-lifetime idempotency store.
///
/// Entries never expire and the map is unbounded: memory grows with the
/// number of distinct requests served. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdempotencyStore {
    entries: Arc<RwLock<HashMap<Fingerprint, Vec<u8>>>>,
}

impl InMemoryIdempotencyStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Returns true if an entry exists for the fingerprint.
    pub async fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.read().await.contains_key(fingerprint)
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn load(&self, fingerprint: &Fingerprint) -> Option<Vec<u8>> {
        self.entries.read().await.get(fingerprint).cloned()
    }

    async fn save(&self, fingerprint: &Fingerprint, value: Vec<u8>) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(fingerprint.clone(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdempotencyStoreExt;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Receipt {
        id: String,
        total_cents: i64,
    }

    fn receipt(id: &str) -> Receipt {
        Receipt {
            id: id.to_string(),
            total_cents: 4700,
        }
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let store = InMemoryIdempotencyStore::new();
        let key = Fingerprint::from_raw("key-1");

        assert_eq!(store.get::<Receipt>(&key).await, None);

        store.set(&key, &receipt("r1")).await.unwrap();
        assert_eq!(store.get::<Receipt>(&key).await, Some(receipt("r1")));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = InMemoryIdempotencyStore::new();
        let key = Fingerprint::from_raw("key-1");

        store.set(&key, &receipt("r1")).await.unwrap();
        store.set(&key, &receipt("r2")).await.unwrap();

        assert_eq!(store.get::<Receipt>(&key).await, Some(receipt("r2")));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_miss() {
        let store = InMemoryIdempotencyStore::new();
        let key = Fingerprint::from_raw("key-1");

        store.save(&key, b"{not json".to_vec()).await.unwrap();
        assert_eq!(store.get::<Receipt>(&key).await, None);

        // A value of a different shape is also a miss.
        store.set(&key, &"just a string").await.unwrap();
        assert_eq!(store.get::<Receipt>(&key).await, None);
        assert!(store.contains(&key).await);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = InMemoryIdempotencyStore::new();
        let clone = store.clone();
        let key = Fingerprint::from_raw("key-1");

        clone.set(&key, &receipt("r1")).await.unwrap();
        assert!(!store.is_empty().await);
        assert_eq!(store.get::<Receipt>(&key).await, Some(receipt("r1")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_distinct_keys() {
        let store = InMemoryIdempotencyStore::new();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let key = Fingerprint::from_raw(format!("key-{i}"));
                    store.set(&key, &receipt(&format!("r{i}"))).await.unwrap();
                    store.get::<Receipt>(&key).await
                })
            })
            .collect();

        for (i, task) in futures_util::future::join_all(tasks)
            .await
            .into_iter()
            .enumerate()
        {
            assert_eq!(task.unwrap(), Some(receipt(&format!("r{i}"))));
        }
        assert_eq!(store.len().await, 32);
    }
}

use crate::types::{ChainId, MetricsSnapshot};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Per-chain snapshot store
///
/// Holds exactly one [`MetricsSnapshot`] per chain id, created lazily on
/// first update and kept for the process lifetime. All mutation goes through
/// [`MetricsStore::update`], which serializes writers; reads may run
/// concurrently with each other.
pub struct MetricsStore {
    snapshots: RwLock<HashMap<ChainId, MetricsSnapshot>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Get the current snapshot for a chain, if any update has been applied
    pub async fn get(&self, chain_id: ChainId) -> Option<MetricsSnapshot> {
        let snapshots = self.snapshots.read().await;
        snapshots.get(&chain_id).cloned()
    }

    /// Get snapshots of all chains seen so far, ordered by chain id
    pub async fn all(&self) -> Vec<MetricsSnapshot> {
        let snapshots = self.snapshots.read().await;
        let mut all: Vec<MetricsSnapshot> = snapshots.values().cloned().collect();
        all.sort_by_key(|s| s.chain_id);
        all
    }

    /// Apply a mutation to a chain's snapshot and return the result
    ///
    /// A zero-valued snapshot is created on first update for an unseen
    /// chain id; that snapshot reads as healthy until real samples arrive.
    pub async fn update<F>(&self, chain_id: ChainId, mutate: F) -> MetricsSnapshot
    where
        F: FnOnce(&mut MetricsSnapshot),
    {
        let mut snapshots = self.snapshots.write().await;
        let snapshot = snapshots
            .entry(chain_id)
            .or_insert_with(|| MetricsSnapshot::new(chain_id));
        mutate(snapshot);
        snapshot.clone()
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_before_any_update_is_absent() {
        let store = MetricsStore::new();
        assert!(store.get(ChainId(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_update_creates_snapshot_lazily() {
        let store = MetricsStore::new();
        let snapshot = store
            .update(ChainId(1), |s| s.transaction_count = 12)
            .await;

        assert_eq!(snapshot.chain_id, ChainId(1));
        assert_eq!(snapshot.transaction_count, 12);
        // Fresh fields keep their zero values
        assert_eq!(snapshot.block_interval, 0);
        assert!(snapshot.sync_status);

        let fetched = store.get(ChainId(1)).await.unwrap();
        assert_eq!(fetched.transaction_count, 12);
    }

    #[tokio::test]
    async fn test_update_returns_fully_updated_snapshot() {
        let store = MetricsStore::new();
        store.update(ChainId(1), |s| s.peer_count = 8).await;
        let snapshot = store.update(ChainId(1), |s| s.sync_status = false).await;

        // Earlier mutations are visible in the returned snapshot
        assert_eq!(snapshot.peer_count, 8);
        assert!(!snapshot.sync_status);
    }

    #[tokio::test]
    async fn test_chains_are_independent() {
        let store = MetricsStore::new();
        store.update(ChainId(1), |s| s.peer_count = 1).await;
        store.update(ChainId(2), |s| s.peer_count = 2).await;

        assert_eq!(store.get(ChainId(1)).await.unwrap().peer_count, 1);
        assert_eq!(store.get(ChainId(2)).await.unwrap().peer_count, 2);

        let all = store.all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].chain_id, ChainId(1));
        assert_eq!(all[1].chain_id, ChainId(2));
    }
}

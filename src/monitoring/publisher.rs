use crate::monitoring::store::MetricsStore;
use crate::types::{ChainId, MetricsSnapshot};
use log::debug;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::time::sleep;

type MetricsCallback = Box<dyn Fn(&[MetricsSnapshot]) + Send + Sync>;

/// Debounced metrics broadcaster
///
/// Updates mark their chain dirty; the first mark opens a debounce window,
/// and when it closes every dirty chain's latest snapshot is delivered in a
/// single batch. Bursts within one window collapse to one delivery. Alerts
/// are not routed through here; they bypass debouncing entirely.
pub struct MetricsPublisher {
    window: Duration,
    dirty: Mutex<HashSet<ChainId>>,
    notify: Notify,
    subscribers: RwLock<Vec<MetricsCallback>>,
}

impl MetricsPublisher {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            dirty: Mutex::new(HashSet::new()),
            notify: Notify::new(),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Register a snapshot-batch callback; all subscribers receive every batch
    pub async fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&[MetricsSnapshot]) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.write().await;
        subscribers.push(Box::new(callback));
    }

    /// Mark a chain's snapshot as changed since the last delivery
    pub fn mark_dirty(&self, chain_id: ChainId) {
        let mut dirty = self.dirty.lock().unwrap();
        dirty.insert(chain_id);
        self.notify.notify_one();
    }

    /// Debounce loop; runs until the owning task is aborted
    pub async fn run(self: Arc<Self>, store: Arc<MetricsStore>) {
        loop {
            self.notify.notified().await;
            sleep(self.window).await;

            let mut chains: Vec<ChainId> = {
                let mut dirty = self.dirty.lock().unwrap();
                dirty.drain().collect()
            };
            if chains.is_empty() {
                continue;
            }
            chains.sort();

            let mut batch = Vec::with_capacity(chains.len());
            for chain_id in chains {
                if let Some(snapshot) = store.get(chain_id).await {
                    batch.push(snapshot);
                }
            }

            debug!("publishing metrics batch for {} chains", batch.len());
            let subscribers = self.subscribers.read().await;
            for callback in subscribers.iter() {
                callback(&batch);
            }
        }
    }
}

use crate::traits::ChainConnection;
use crate::types::ChainId;
use crate::watchers::MetricUpdate;
use futures_util::future::join_all;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Periodic active prober for every configured chain
///
/// Each tick runs the three probes (peer count, sync status, latency)
/// sequentially per chain and concurrently across chains. A failed probe is
/// logged and skips only its own field; the first tick fires one full period
/// after start.
pub struct HealthPoller {
    chains: Vec<(ChainId, Arc<dyn ChainConnection>)>,
    period: Duration,
    updates: mpsc::Sender<MetricUpdate>,
}

impl HealthPoller {
    pub fn new(
        chains: Vec<(ChainId, Arc<dyn ChainConnection>)>,
        period: Duration,
        updates: mpsc::Sender<MetricUpdate>,
    ) -> Self {
        Self {
            chains,
            period,
            updates,
        }
    }

    /// Probe on a fixed period until the engine stops
    pub async fn run(self) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            debug!("health poll tick for {} chains", self.chains.len());

            let probes = self
                .chains
                .iter()
                .map(|(chain_id, connection)| self.probe_chain(*chain_id, connection.clone()));
            join_all(probes).await;
        }
    }

    async fn probe_chain(&self, chain_id: ChainId, connection: Arc<dyn ChainConnection>) {
        match connection.peer_count().await {
            Ok(peers) => {
                self.send(MetricUpdate::PeerCount { chain_id, peers }).await;
            }
            Err(e) => warn!("chain {}: peer count probe failed: {}", chain_id, e),
        }

        match connection.sync_status().await {
            Ok(synced) => {
                self.send(MetricUpdate::SyncStatus { chain_id, synced })
                    .await;
            }
            Err(e) => warn!("chain {}: sync status probe failed: {}", chain_id, e),
        }

        let started = Instant::now();
        match connection.ping().await {
            Ok(()) => {
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                self.send(MetricUpdate::NetworkLatency {
                    chain_id,
                    latency_ms,
                })
                .await;
            }
            Err(e) => warn!("chain {}: latency probe failed: {}", chain_id, e),
        }
    }

    async fn send(&self, update: MetricUpdate) {
        // A closed channel means the engine is shutting down; the poller
        // task is aborted right after, so the drop is harmless
        let _ = self.updates.send(update).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::MockChainConnection;

    fn updates_for(
        received: &[MetricUpdate],
        chain_id: ChainId,
    ) -> (Option<u32>, Option<bool>, bool) {
        let mut peers = None;
        let mut synced = None;
        let mut latency = false;
        for update in received.iter().filter(|u| u.chain_id() == chain_id) {
            match update {
                MetricUpdate::PeerCount { peers: p, .. } => peers = Some(*p),
                MetricUpdate::SyncStatus { synced: s, .. } => synced = Some(*s),
                MetricUpdate::NetworkLatency { .. } => latency = true,
                _ => {}
            }
        }
        (peers, synced, latency)
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_tick_probes_every_chain() {
        let (conn_a, handle_a) = MockChainConnection::new();
        let (conn_b, handle_b) = MockChainConnection::new();
        handle_a.set_peer_count(12);
        handle_b.set_peer_count(34);
        handle_b.set_synced(false);

        let (tx, mut rx) = mpsc::channel(32);
        let poller = HealthPoller::new(
            vec![
                (ChainId(1), Arc::new(conn_a)),
                (ChainId(2), Arc::new(conn_b)),
            ],
            Duration::from_secs(60),
            tx,
        );
        let task = tokio::spawn(poller.run());

        // Nothing before the first period elapses
        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let mut received = Vec::new();
        while let Ok(update) = rx.try_recv() {
            received.push(update);
        }
        assert_eq!(received.len(), 6);

        let (peers, synced, latency) = updates_for(&received, ChainId(1));
        assert_eq!(peers, Some(12));
        assert_eq!(synced, Some(true));
        assert!(latency);

        let (peers, synced, latency) = updates_for(&received, ChainId(2));
        assert_eq!(peers, Some(34));
        assert_eq!(synced, Some(false));
        assert!(latency);

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_failure_is_isolated_to_its_chain() {
        let (conn_a, handle_a) = MockChainConnection::new();
        let (conn_b, handle_b) = MockChainConnection::new();
        handle_a.fail_probes(true);
        handle_b.set_peer_count(7);

        let (tx, mut rx) = mpsc::channel(32);
        let poller = HealthPoller::new(
            vec![
                (ChainId(1), Arc::new(conn_a)),
                (ChainId(2), Arc::new(conn_b)),
            ],
            Duration::from_secs(60),
            tx,
        );
        let task = tokio::spawn(poller.run());

        tokio::time::sleep(Duration::from_secs(61)).await;
        let mut received = Vec::new();
        while let Ok(update) = rx.try_recv() {
            received.push(update);
        }

        // Chain 1 contributed nothing, chain 2 all three probes
        assert!(received.iter().all(|u| u.chain_id() == ChainId(2)));
        assert_eq!(received.len(), 3);

        task.abort();
    }
}

pub mod blocks;
pub mod health;
pub mod messages;

pub use blocks::BlockWatcher;
pub use health::HealthPoller;
pub use messages::MessageWatcher;

use crate::types::{ChainId, MetricKind, MetricsSnapshot};

/// A metric delta produced by a watcher or the health poller
///
/// All deltas flow through one mpsc channel into the evaluator task, which
/// is the single serialization point for snapshot mutation and rule
/// evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricUpdate {
    /// A new block was observed
    Block {
        chain_id: ChainId,
        timestamp: u64,
        transaction_count: u64,
        gas_used: u64,
        gas_price: Option<f64>,
    },
    /// A cross-chain message left this chain
    MessageSent { chain_id: ChainId },
    /// A cross-chain message was delivered on this chain and matched a send
    MessageDelivered { chain_id: ChainId, latency_ms: f64 },
    /// Peer count probe result
    PeerCount { chain_id: ChainId, peers: u32 },
    /// Sync status probe result
    SyncStatus { chain_id: ChainId, synced: bool },
    /// Round-trip latency probe result
    NetworkLatency { chain_id: ChainId, latency_ms: f64 },
}

impl MetricUpdate {
    /// Chain this delta applies to
    pub fn chain_id(&self) -> ChainId {
        match *self {
            MetricUpdate::Block { chain_id, .. }
            | MetricUpdate::MessageSent { chain_id }
            | MetricUpdate::MessageDelivered { chain_id, .. }
            | MetricUpdate::PeerCount { chain_id, .. }
            | MetricUpdate::SyncStatus { chain_id, .. }
            | MetricUpdate::NetworkLatency { chain_id, .. } => chain_id,
        }
    }

    /// Metric kinds whose rules must be re-checked after applying this delta
    pub fn affected_kinds(&self) -> &'static [MetricKind] {
        match self {
            MetricUpdate::Block { .. } => {
                &[MetricKind::BlockProduction, MetricKind::TransactionVolume]
            }
            MetricUpdate::MessageDelivered { .. } => &[MetricKind::MessageLatency],
            MetricUpdate::PeerCount { .. } => &[MetricKind::PeerCount],
            MetricUpdate::SyncStatus { .. } => &[MetricKind::SyncStatus],
            MetricUpdate::MessageSent { .. } | MetricUpdate::NetworkLatency { .. } => &[],
        }
    }

    /// Fold this delta into a chain's snapshot
    pub fn apply(&self, snapshot: &mut MetricsSnapshot) {
        match *self {
            MetricUpdate::Block {
                timestamp,
                transaction_count,
                gas_used,
                gas_price,
                ..
            } => {
                // The first block on a chain has no predecessor, so its
                // interval is zero rather than the raw timestamp delta.
                snapshot.block_interval = if snapshot.last_block_time == 0 {
                    0
                } else {
                    timestamp.saturating_sub(snapshot.last_block_time)
                };
                snapshot.last_block_time = timestamp;
                snapshot.transaction_count = transaction_count;
                snapshot.gas_used = gas_used;
                if let Some(price) = gas_price {
                    snapshot.average_gas_price = price;
                }
            }
            MetricUpdate::MessageSent { .. } => {
                snapshot.outgoing_messages += 1;
            }
            MetricUpdate::MessageDelivered { latency_ms, .. } => {
                snapshot.incoming_messages += 1;
                snapshot.record_message_latency(latency_ms);
            }
            MetricUpdate::PeerCount { peers, .. } => {
                snapshot.peer_count = peers;
            }
            MetricUpdate::SyncStatus { synced, .. } => {
                snapshot.sync_status = synced;
            }
            MetricUpdate::NetworkLatency { latency_ms, .. } => {
                snapshot.network_latency = latency_ms;
            }
        }
    }
}

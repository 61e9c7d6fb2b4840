use crate::types::ChainId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Maximum number of message latency samples retained per chain
pub const LATENCY_WINDOW: usize = 1000;

/// Category of metric an alert rule can attach to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricKind {
    BlockProduction,
    TransactionVolume,
    MessageLatency,
    SyncStatus,
    PeerCount,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::BlockProduction => "BLOCK_PRODUCTION",
            MetricKind::TransactionVolume => "TRANSACTION_VOLUME",
            MetricKind::MessageLatency => "MESSAGE_LATENCY",
            MetricKind::SyncStatus => "SYNC_STATUS",
            MetricKind::PeerCount => "PEER_COUNT",
        };
        write!(f, "{}", name)
    }
}

/// Derived operational metrics for one chain
///
/// Owned by the metrics store; all mutation goes through its serialized
/// update path. A fresh snapshot is zero-valued and reads as healthy
/// (`sync_status = true`) until real samples arrive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Chain this snapshot belongs to
    pub chain_id: ChainId,
    /// Timestamp of the most recent block (unix seconds)
    pub last_block_time: u64,
    /// Seconds between the two most recent blocks
    pub block_interval: u64,
    /// Transactions included in the most recent block
    pub transaction_count: u64,
    /// Gas used by the most recent block
    pub gas_used: u64,
    /// Gas price sampled at the most recent block
    pub average_gas_price: f64,
    /// Cross-chain messages observed leaving this chain
    pub outgoing_messages: u64,
    /// Cross-chain messages confirmed delivered on this chain
    pub incoming_messages: u64,
    /// Recent message delivery latencies in milliseconds, oldest first
    pub message_latencies: VecDeque<f64>,
    /// Arithmetic mean of `message_latencies` in milliseconds
    pub average_message_latency: f64,
    /// Peer count from the last health probe
    pub peer_count: u32,
    /// Whether the node reported itself in sync at the last health probe
    pub sync_status: bool,
    /// Round-trip probe latency in milliseconds from the last health probe
    pub network_latency: f64,
}

impl MetricsSnapshot {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            last_block_time: 0,
            block_interval: 0,
            transaction_count: 0,
            gas_used: 0,
            average_gas_price: 0.0,
            outgoing_messages: 0,
            incoming_messages: 0,
            message_latencies: VecDeque::new(),
            average_message_latency: 0.0,
            peer_count: 0,
            sync_status: true,
            network_latency: 0.0,
        }
    }

    /// Append a delivery latency sample and refresh the running mean
    ///
    /// The window is bounded at [`LATENCY_WINDOW`] samples, dropping the
    /// oldest; the mean is computed over the retained window.
    pub fn record_message_latency(&mut self, latency_ms: f64) {
        self.message_latencies.push_back(latency_ms);
        while self.message_latencies.len() > LATENCY_WINDOW {
            self.message_latencies.pop_front();
        }

        let sum: f64 = self.message_latencies.iter().sum();
        self.average_message_latency = sum / self.message_latencies.len() as f64;
    }
}

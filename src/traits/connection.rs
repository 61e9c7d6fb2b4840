use crate::traits::events::{BlockEvent, BridgeEvent};
use async_trait::async_trait;

/// Error type shared by all connection operations
pub type ConnectionError = Box<dyn std::error::Error + Send + Sync>;

/// Subscription to a chain's newly produced blocks
#[async_trait]
pub trait BlockStream: Send {
    /// Get the next block from the stream
    /// Returns None if the subscription is closed
    async fn next(&mut self) -> Option<Result<BlockEvent, ConnectionError>>;
}

/// Subscription to a chain's bridge/message contract events
#[async_trait]
pub trait BridgeEventStream: Send {
    /// Get the next bridge event from the stream
    /// Returns None if the subscription is closed
    async fn next(&mut self) -> Option<Result<BridgeEvent, ConnectionError>>;
}

/// Handle to one monitored chain's node
///
/// This allows the watchers and the health poller to be independent of the
/// specific node transport. Subscriptions and probes may fail individually;
/// failures are isolated to the chain they occurred on.
#[async_trait]
pub trait ChainConnection: Send + Sync {
    /// Open a subscription to newly produced blocks
    async fn subscribe_blocks(&self) -> Result<Box<dyn BlockStream>, ConnectionError>;

    /// Open a subscription to bridge contract events
    async fn subscribe_bridge_events(&self)
        -> Result<Box<dyn BridgeEventStream>, ConnectionError>;

    /// Number of peers the node is currently connected to
    async fn peer_count(&self) -> Result<u32, ConnectionError>;

    /// Whether the node reports itself in sync with the network
    async fn sync_status(&self) -> Result<bool, ConnectionError>;

    /// Cheap read call used to measure round-trip latency
    async fn ping(&self) -> Result<(), ConnectionError>;

    /// Current gas price quoted by the node
    async fn gas_price(&self) -> Result<f64, ConnectionError>;

    /// Check if the underlying transport is connected
    fn is_connected(&self) -> bool;
}

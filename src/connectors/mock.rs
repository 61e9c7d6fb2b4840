use crate::traits::{
    BlockEvent, BlockStream, BridgeEvent, BridgeEventStream, ChainConnection, ConnectionError,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Shared probe state between a mock connection and its handle
struct MockChainState {
    peer_count: AtomicU32,
    synced: AtomicBool,
    connected: AtomicBool,
    fail_probes: AtomicBool,
    gas_price: Mutex<f64>,
}

/// Test-side handle, split from the connection so tests can drive events
/// and probe results while the engine owns the connection.
pub struct MockChainHandle {
    blocks: mpsc::UnboundedSender<BlockEvent>,
    bridge: mpsc::UnboundedSender<BridgeEvent>,
    state: Arc<MockChainState>,
}

impl MockChainHandle {
    /// Push a block event into the block subscription
    pub fn push_block(&self, event: BlockEvent) {
        let _ = self.blocks.send(event);
    }

    /// Push a bridge event into the bridge subscription
    pub fn push_bridge_event(&self, event: BridgeEvent) {
        let _ = self.bridge.send(event);
    }

    /// Set the peer count returned by probes
    pub fn set_peer_count(&self, peers: u32) {
        self.state.peer_count.store(peers, Ordering::SeqCst);
    }

    /// Set the sync status returned by probes
    pub fn set_synced(&self, synced: bool) {
        self.state.synced.store(synced, Ordering::SeqCst);
    }

    /// Set the gas price returned by probes
    pub async fn set_gas_price(&self, price: f64) {
        *self.state.gas_price.lock().await = price;
    }

    /// Make all subsequent probe calls fail
    pub fn fail_probes(&self, fail: bool) {
        self.state.fail_probes.store(fail, Ordering::SeqCst);
    }
}

/// Mock chain connection for testing and dry runs
///
/// Block and bridge subscriptions are backed by unbounded channels fed
/// through the paired [`MockChainHandle`]; each subscription can be opened
/// once.
pub struct MockChainConnection {
    blocks: Mutex<Option<mpsc::UnboundedReceiver<BlockEvent>>>,
    bridge: Mutex<Option<mpsc::UnboundedReceiver<BridgeEvent>>>,
    state: Arc<MockChainState>,
}

impl MockChainConnection {
    /// Create a connection plus the handle that drives it
    pub fn new() -> (Self, MockChainHandle) {
        let (block_tx, block_rx) = mpsc::unbounded_channel();
        let (bridge_tx, bridge_rx) = mpsc::unbounded_channel();
        let state = Arc::new(MockChainState {
            peer_count: AtomicU32::new(50),
            synced: AtomicBool::new(true),
            connected: AtomicBool::new(true),
            fail_probes: AtomicBool::new(false),
            gas_price: Mutex::new(1.0),
        });

        let connection = Self {
            blocks: Mutex::new(Some(block_rx)),
            bridge: Mutex::new(Some(bridge_rx)),
            state: state.clone(),
        };
        let handle = MockChainHandle {
            blocks: block_tx,
            bridge: bridge_tx,
            state,
        };
        (connection, handle)
    }

    fn check_probe(&self) -> Result<(), ConnectionError> {
        if self.state.fail_probes.load(Ordering::SeqCst) {
            return Err("probe failed".into());
        }
        Ok(())
    }
}

struct MockBlockStream {
    receiver: mpsc::UnboundedReceiver<BlockEvent>,
}

#[async_trait]
impl BlockStream for MockBlockStream {
    async fn next(&mut self) -> Option<Result<BlockEvent, ConnectionError>> {
        self.receiver.recv().await.map(Ok)
    }
}

struct MockBridgeEventStream {
    receiver: mpsc::UnboundedReceiver<BridgeEvent>,
}

#[async_trait]
impl BridgeEventStream for MockBridgeEventStream {
    async fn next(&mut self) -> Option<Result<BridgeEvent, ConnectionError>> {
        self.receiver.recv().await.map(Ok)
    }
}

#[async_trait]
impl ChainConnection for MockChainConnection {
    async fn subscribe_blocks(&self) -> Result<Box<dyn BlockStream>, ConnectionError> {
        let receiver = self
            .blocks
            .lock()
            .await
            .take()
            .ok_or("block subscription already taken")?;
        Ok(Box::new(MockBlockStream { receiver }))
    }

    async fn subscribe_bridge_events(
        &self,
    ) -> Result<Box<dyn BridgeEventStream>, ConnectionError> {
        let receiver = self
            .bridge
            .lock()
            .await
            .take()
            .ok_or("bridge subscription already taken")?;
        Ok(Box::new(MockBridgeEventStream { receiver }))
    }

    async fn peer_count(&self) -> Result<u32, ConnectionError> {
        self.check_probe()?;
        Ok(self.state.peer_count.load(Ordering::SeqCst))
    }

    async fn sync_status(&self) -> Result<bool, ConnectionError> {
        self.check_probe()?;
        Ok(self.state.synced.load(Ordering::SeqCst))
    }

    async fn ping(&self) -> Result<(), ConnectionError> {
        self.check_probe()
    }

    async fn gas_price(&self) -> Result<f64, ConnectionError> {
        self.check_probe()?;
        Ok(*self.state.gas_price.lock().await)
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }
}

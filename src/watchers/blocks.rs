use crate::recovery::{Backoff, RetryConfig};
use crate::traits::ChainConnection;
use crate::types::ChainId;
use crate::watchers::MetricUpdate;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Watches one chain's block subscription and turns blocks into metric deltas
///
/// Connection failures are logged and retried with capped exponential
/// backoff; they never affect other chains' watchers.
pub struct BlockWatcher {
    chain_id: ChainId,
    connection: Arc<dyn ChainConnection>,
    updates: mpsc::Sender<MetricUpdate>,
    retry: RetryConfig,
}

impl BlockWatcher {
    pub fn new(
        chain_id: ChainId,
        connection: Arc<dyn ChainConnection>,
        updates: mpsc::Sender<MetricUpdate>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            chain_id,
            connection,
            updates,
            retry,
        }
    }

    /// Consume the block stream until the engine stops
    pub async fn run(self) {
        let mut backoff = Backoff::new(self.retry.clone());

        loop {
            let mut stream = match self.connection.subscribe_blocks().await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(
                        "chain {}: block subscription failed, retrying in {:?}: {}",
                        self.chain_id,
                        backoff.delay(),
                        e
                    );
                    backoff.wait().await;
                    continue;
                }
            };

            while let Some(result) = stream.next().await {
                match result {
                    Ok(block) => {
                        backoff.reset();
                        debug!(
                            "chain {}: block {} with {} txs",
                            self.chain_id, block.number, block.transaction_count
                        );

                        // Point sample of the current gas price at block time
                        let gas_price = match self.connection.gas_price().await {
                            Ok(price) => Some(price),
                            Err(e) => {
                                debug!("chain {}: gas price read failed: {}", self.chain_id, e);
                                None
                            }
                        };

                        let update = MetricUpdate::Block {
                            chain_id: self.chain_id,
                            timestamp: block.timestamp,
                            transaction_count: block.transaction_count,
                            gas_used: block.gas_used,
                            gas_price,
                        };
                        if self.updates.send(update).await.is_err() {
                            // Evaluator is gone, the engine is shutting down
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("chain {}: block stream error: {}", self.chain_id, e);
                    }
                }
            }

            warn!(
                "chain {}: block subscription closed, resubscribing in {:?}",
                self.chain_id,
                backoff.delay()
            );
            backoff.wait().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::MockChainConnection;
    use crate::traits::BlockEvent;

    #[tokio::test]
    async fn test_blocks_become_metric_updates() {
        let (connection, handle) = MockChainConnection::new();
        handle.set_gas_price(3.5).await;
        let (tx, mut rx) = mpsc::channel(16);

        let watcher = BlockWatcher::new(
            ChainId(1),
            Arc::new(connection),
            tx,
            RetryConfig::default(),
        );
        let task = tokio::spawn(watcher.run());

        handle.push_block(BlockEvent {
            number: 100,
            timestamp: 1_700_000_000,
            transaction_count: 25,
            gas_used: 1_500_000,
        });

        let update = rx.recv().await.unwrap();
        assert_eq!(
            update,
            MetricUpdate::Block {
                chain_id: ChainId(1),
                timestamp: 1_700_000_000,
                transaction_count: 25,
                gas_used: 1_500_000,
                gas_price: Some(3.5),
            }
        );

        task.abort();
    }

    #[tokio::test]
    async fn test_gas_price_failure_does_not_drop_the_block() {
        let (connection, handle) = MockChainConnection::new();
        let (tx, mut rx) = mpsc::channel(16);

        let watcher = BlockWatcher::new(
            ChainId(1),
            Arc::new(connection),
            tx,
            RetryConfig::default(),
        );
        let task = tokio::spawn(watcher.run());

        handle.fail_probes(true);
        handle.push_block(BlockEvent {
            number: 1,
            timestamp: 1000,
            transaction_count: 2,
            gas_used: 42,
        });

        match rx.recv().await.unwrap() {
            MetricUpdate::Block { gas_price, .. } => assert!(gas_price.is_none()),
            other => panic!("unexpected update: {:?}", other),
        }

        task.abort();
    }

    #[tokio::test]
    async fn test_watcher_stops_when_evaluator_is_gone() {
        let (connection, handle) = MockChainConnection::new();
        let (tx, rx) = mpsc::channel(16);
        drop(rx);

        let watcher = BlockWatcher::new(
            ChainId(1),
            Arc::new(connection),
            tx,
            RetryConfig::default(),
        );
        let task = tokio::spawn(watcher.run());

        handle.push_block(BlockEvent {
            number: 1,
            timestamp: 1000,
            transaction_count: 0,
            gas_used: 0,
        });

        // Send to a closed channel makes the watcher return
        task.await.unwrap();
    }
}

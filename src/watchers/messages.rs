use crate::monitoring::MessageCorrelator;
use crate::recovery::{Backoff, RetryConfig};
use crate::traits::{BridgeEvent, ChainConnection};
use crate::types::{ChainId, MessageKey};
use crate::watchers::MetricUpdate;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Watches one chain's bridge events and correlates sends with deliveries
///
/// Sends are recorded against this chain as source; deliveries are matched
/// against the shared correlator with this chain as target. An unmatched
/// delivery is dropped silently with no metric impact.
pub struct MessageWatcher {
    chain_id: ChainId,
    connection: Arc<dyn ChainConnection>,
    correlator: Arc<MessageCorrelator>,
    updates: mpsc::Sender<MetricUpdate>,
    retry: RetryConfig,
}

impl MessageWatcher {
    pub fn new(
        chain_id: ChainId,
        connection: Arc<dyn ChainConnection>,
        correlator: Arc<MessageCorrelator>,
        updates: mpsc::Sender<MetricUpdate>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            chain_id,
            connection,
            correlator,
            updates,
            retry,
        }
    }

    /// Consume the bridge event stream until the engine stops
    pub async fn run(self) {
        let mut backoff = Backoff::new(self.retry.clone());

        loop {
            let mut stream = match self.connection.subscribe_bridge_events().await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(
                        "chain {}: bridge subscription failed, retrying in {:?}: {}",
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
                    Ok(event) => {
                        backoff.reset();
                        if let Some(update) = self.process_event(event) {
                            if self.updates.send(update).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("chain {}: bridge stream error: {}", self.chain_id, e);
                    }
                }
            }

            warn!(
                "chain {}: bridge subscription closed, resubscribing in {:?}",
                self.chain_id,
                backoff.delay()
            );
            backoff.wait().await;
        }
    }

    fn process_event(&self, event: BridgeEvent) -> Option<MetricUpdate> {
        match event {
            BridgeEvent::MessageSent { target, sequence } => {
                let key = MessageKey::new(self.chain_id, target, sequence);
                self.correlator.record_send(key);
                debug!(
                    "chain {}: message {} sent to chain {}",
                    self.chain_id, sequence, target
                );
                Some(MetricUpdate::MessageSent {
                    chain_id: self.chain_id,
                })
            }
            BridgeEvent::MessageReceived { source, sequence } => {
                let key = MessageKey::new(source, self.chain_id, sequence);
                match self.correlator.match_receive(&key) {
                    Some(latency) => Some(MetricUpdate::MessageDelivered {
                        chain_id: self.chain_id,
                        latency_ms: latency.as_secs_f64() * 1000.0,
                    }),
                    None => {
                        // No send recorded for this key, e.g. the process
                        // started after the send
                        debug!(
                            "chain {}: unmatched delivery of message {} from chain {}",
                            self.chain_id, sequence, source
                        );
                        None
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::MockChainConnection;
    use std::time::Duration;

    struct TwoChains {
        source_handle: crate::connectors::MockChainHandle,
        target_handle: crate::connectors::MockChainHandle,
        rx: mpsc::Receiver<MetricUpdate>,
        tasks: Vec<tokio::task::JoinHandle<()>>,
    }

    async fn two_chain_setup() -> TwoChains {
        let correlator = Arc::new(MessageCorrelator::new());
        let (tx, rx) = mpsc::channel(16);

        let (source_conn, source_handle) = MockChainConnection::new();
        let (target_conn, target_handle) = MockChainConnection::new();

        let source = MessageWatcher::new(
            ChainId(1),
            Arc::new(source_conn),
            correlator.clone(),
            tx.clone(),
            RetryConfig::default(),
        );
        let target = MessageWatcher::new(
            ChainId(2),
            Arc::new(target_conn),
            correlator,
            tx,
            RetryConfig::default(),
        );

        let tasks = vec![tokio::spawn(source.run()), tokio::spawn(target.run())];
        TwoChains {
            source_handle,
            target_handle,
            rx,
            tasks,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_then_receive_produces_latency_delta() {
        let mut setup = two_chain_setup().await;

        setup.source_handle.push_bridge_event(BridgeEvent::MessageSent {
            target: ChainId(2),
            sequence: 7,
        });
        assert_eq!(
            setup.rx.recv().await.unwrap(),
            MetricUpdate::MessageSent {
                chain_id: ChainId(1)
            }
        );

        tokio::time::advance(Duration::from_secs(3)).await;

        setup
            .target_handle
            .push_bridge_event(BridgeEvent::MessageReceived {
                source: ChainId(1),
                sequence: 7,
            });
        match setup.rx.recv().await.unwrap() {
            MetricUpdate::MessageDelivered {
                chain_id,
                latency_ms,
            } => {
                assert_eq!(chain_id, ChainId(2));
                assert_eq!(latency_ms, 3000.0);
            }
            other => panic!("unexpected update: {:?}", other),
        }

        for task in setup.tasks {
            task.abort();
        }
    }

    #[tokio::test]
    async fn test_orphan_receive_emits_no_delta() {
        let mut setup = two_chain_setup().await;

        setup
            .target_handle
            .push_bridge_event(BridgeEvent::MessageReceived {
                source: ChainId(1),
                sequence: 99,
            });

        // A subsequent send must be the next delta seen; the orphan receive
        // produced nothing
        setup.source_handle.push_bridge_event(BridgeEvent::MessageSent {
            target: ChainId(2),
            sequence: 1,
        });
        assert_eq!(
            setup.rx.recv().await.unwrap(),
            MetricUpdate::MessageSent {
                chain_id: ChainId(1)
            }
        );

        for task in setup.tasks {
            task.abort();
        }
    }
}

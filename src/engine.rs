use crate::monitoring::{
    Alert, AlertEngine, AlertRule, MessageCorrelator, MetricsPublisher, MetricsStore,
};
use crate::recovery::RetryConfig;
use crate::traits::ChainConnection;
use crate::types::{ChainConfig, ChainId, MetricKind, MetricsSnapshot};
use crate::watchers::{BlockWatcher, HealthPoller, MessageWatcher, MetricUpdate};
use log::{error, info};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Health poller period
    pub poll_interval: Duration,
    /// Metrics publish debounce window
    pub debounce_window: Duration,
    /// Depth of the metric update queue feeding the evaluator
    pub update_queue_depth: usize,
    /// Number of alerts retained for queries
    pub max_recent_alerts: usize,
    /// Backoff policy for watcher resubscription
    pub retry: RetryConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            debounce_window: Duration::from_millis(1000),
            update_queue_depth: 256,
            max_recent_alerts: 1000,
            retry: RetryConfig::default(),
        }
    }
}

/// Engine lifecycle error
#[derive(Debug)]
pub enum MonitorError {
    AlreadyRunning,
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::AlreadyRunning => write!(f, "monitor is already running"),
        }
    }
}

impl std::error::Error for MonitorError {}

/// Cross-chain monitoring and alerting engine
///
/// Owns the metrics store, the message correlator, the alert engine and the
/// debounced publisher, and drives one watcher task per chain per event
/// category plus the health poller. All metric deltas funnel through a
/// single evaluator task, so updates to one chain's snapshot are totally
/// ordered and alerts are emitted in update order.
pub struct ChainMonitor {
    config: MonitorConfig,
    chains: Vec<ChainConfig>,
    connections: HashMap<ChainId, Arc<dyn ChainConnection>>,
    store: Arc<MetricsStore>,
    correlator: Arc<MessageCorrelator>,
    alerts: Arc<AlertEngine>,
    publisher: Arc<MetricsPublisher>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    running: Arc<RwLock<bool>>,
}

impl ChainMonitor {
    /// Create an engine over a fixed set of chains
    ///
    /// The chain set cannot change at runtime; chains are monitored in the
    /// order given.
    pub fn new(
        config: MonitorConfig,
        chains: Vec<(ChainConfig, Arc<dyn ChainConnection>)>,
    ) -> Self {
        let alerts = Arc::new(AlertEngine::new(config.max_recent_alerts));
        let publisher = Arc::new(MetricsPublisher::new(config.debounce_window));

        let mut configs = Vec::with_capacity(chains.len());
        let mut connections = HashMap::with_capacity(chains.len());
        for (chain_config, connection) in chains {
            connections.insert(chain_config.chain_id, connection);
            configs.push(chain_config);
        }

        Self {
            config,
            chains: configs,
            connections,
            store: Arc::new(MetricsStore::new()),
            correlator: Arc::new(MessageCorrelator::new()),
            alerts,
            publisher,
            tasks: Mutex::new(Vec::new()),
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Spawn the evaluator, the publisher, per-chain watchers and the poller
    pub async fn start(&self) -> Result<(), MonitorError> {
        {
            let mut running = self.running.write().await;
            if *running {
                return Err(MonitorError::AlreadyRunning);
            }
            *running = true;
        }

        info!("starting monitor for {} chains", self.chains.len());
        let (tx, rx) = mpsc::channel(self.config.update_queue_depth);
        let mut tasks = self.tasks.lock().await;

        tasks.push(tokio::spawn(evaluator_loop(
            rx,
            self.store.clone(),
            self.alerts.clone(),
            self.publisher.clone(),
        )));
        tasks.push(tokio::spawn(
            self.publisher.clone().run(self.store.clone()),
        ));

        for chain in &self.chains {
            let connection = self.connections[&chain.chain_id].clone();
            info!(
                "watching chain {} ({}) at {}",
                chain.chain_id, chain.name, chain.endpoint
            );

            let watcher = BlockWatcher::new(
                chain.chain_id,
                connection.clone(),
                tx.clone(),
                self.config.retry.clone(),
            );
            tasks.push(tokio::spawn(watcher.run()));

            let watcher = MessageWatcher::new(
                chain.chain_id,
                connection,
                self.correlator.clone(),
                tx.clone(),
                self.config.retry.clone(),
            );
            tasks.push(tokio::spawn(watcher.run()));
        }

        let poller = HealthPoller::new(
            self.chains
                .iter()
                .map(|c| (c.chain_id, self.connections[&c.chain_id].clone()))
                .collect(),
            self.config.poll_interval,
            tx,
        );
        tasks.push(tokio::spawn(poller.run()));

        Ok(())
    }

    /// Stop all tasks; no events are processed after this returns
    ///
    /// Tasks blocked on subscriptions, timer ticks or in-flight probes are
    /// aborted rather than awaited.
    pub async fn stop(&self) {
        {
            let mut running = self.running.write().await;
            if !*running {
                return;
            }
            *running = false;
        }

        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            task.abort();
        }
        info!("monitor stopped");
    }

    /// Check if the engine is running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Chain configurations, in monitoring order
    pub fn chains(&self) -> &[ChainConfig] {
        &self.chains
    }

    /// Register or replace an alert rule
    pub async fn set_alert_config(&self, rule: AlertRule) {
        self.alerts.set_rule(rule).await;
    }

    /// Remove an alert rule
    pub async fn remove_alert_config(&self, chain_id: ChainId, kind: MetricKind) {
        self.alerts.remove_rule(chain_id, kind).await;
    }

    /// Current snapshot for one chain
    pub async fn get_metrics(&self, chain_id: ChainId) -> Option<MetricsSnapshot> {
        self.store.get(chain_id).await
    }

    /// Current snapshots for all chains seen so far
    pub async fn get_all_metrics(&self) -> Vec<MetricsSnapshot> {
        self.store.all().await
    }

    /// Subscribe to debounced snapshot batches
    pub async fn on_metrics<F>(&self, callback: F)
    where
        F: Fn(&[MetricsSnapshot]) + Send + Sync + 'static,
    {
        self.publisher.subscribe(callback).await;
    }

    /// Subscribe to alerts, delivered individually and undebounced
    pub async fn on_alerts<F>(&self, callback: F)
    where
        F: Fn(&Alert) + Send + Sync + 'static,
    {
        self.alerts.subscribe(callback).await;
    }

    /// Most recent alerts, newest first
    pub async fn recent_alerts(&self, count: usize) -> Vec<Alert> {
        self.alerts.recent(count).await
    }

    /// Cross-chain messages currently awaiting delivery
    pub fn pending_messages(&self) -> usize {
        self.correlator.pending_count()
    }
}

/// Single serialization point for snapshot mutation and rule evaluation
async fn evaluator_loop(
    mut updates: mpsc::Receiver<MetricUpdate>,
    store: Arc<MetricsStore>,
    alerts: Arc<AlertEngine>,
    publisher: Arc<MetricsPublisher>,
) {
    while let Some(update) = updates.recv().await {
        let chain_id = update.chain_id();
        let snapshot = store.update(chain_id, |s| update.apply(s)).await;

        for kind in update.affected_kinds() {
            alerts.evaluate(&snapshot, *kind).await;
        }
        publisher.mark_dirty(chain_id);
    }
    error!("metric update channel closed, evaluator exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::{MockChainConnection, MockChainHandle};

    fn chain(id: u64) -> (ChainConfig, Arc<dyn ChainConnection>, MockChainHandle) {
        let (connection, handle) = MockChainConnection::new();
        let config = ChainConfig::new(id, format!("chain-{}", id), "mock://", "0xbridge");
        (config, Arc::new(connection), handle)
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let (config, connection, _handle) = chain(1);
        let monitor = ChainMonitor::new(MonitorConfig::default(), vec![(config, connection)]);

        assert!(monitor.start().await.is_ok());
        assert!(monitor.is_running().await);
        assert!(matches!(
            monitor.start().await,
            Err(MonitorError::AlreadyRunning)
        ));
        monitor.stop().await;
        assert!(!monitor.is_running().await);
    }

    #[tokio::test]
    async fn test_stop_without_start_is_a_no_op() {
        let monitor = ChainMonitor::new(MonitorConfig::default(), Vec::new());
        monitor.stop().await;
        assert!(!monitor.is_running().await);
    }

    #[tokio::test]
    async fn test_metrics_absent_for_unknown_chain() {
        let monitor = ChainMonitor::new(MonitorConfig::default(), Vec::new());
        assert!(monitor.get_metrics(ChainId(99)).await.is_none());
        assert!(monitor.get_all_metrics().await.is_empty());
    }
}

use crate::types::{ChainId, MetricKind, MetricsSnapshot};
use chrono::{DateTime, Utc};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Minimum acceptable peer count, checked on every peer count update
pub const MIN_PEER_COUNT: u32 = 3;

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A threshold rule for one chain and metric kind
///
/// At most one rule is active per `(chain_id, kind)`; registering another
/// replaces it. Rules for unconfigured chains are accepted and simply never
/// fire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub chain_id: ChainId,
    pub kind: MetricKind,
    pub threshold: f64,
    pub severity: Severity,
}

/// An emitted alert
///
/// Immutable and fire-and-forget: delivered to subscribers in emission order
/// with no deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub chain_id: ChainId,
    pub kind: MetricKind,
    pub severity: Severity,
    pub message: String,
    pub emitted_at: DateTime<Utc>,
}

type AlertCallback = Box<dyn Fn(&Alert) + Send + Sync>;

/// Evaluates threshold rules against snapshot updates and emits alerts
///
/// Evaluation is level-triggered: a persistently violating metric produces
/// one alert per update, not one per violation episode. Downstream consumers
/// are expected to debounce on their side.
pub struct AlertEngine {
    rules: RwLock<HashMap<(ChainId, MetricKind), AlertRule>>,
    recent: RwLock<VecDeque<Alert>>,
    max_recent: usize,
    subscribers: RwLock<Vec<AlertCallback>>,
}

impl AlertEngine {
    pub fn new(max_recent: usize) -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
            recent: RwLock::new(VecDeque::new()),
            max_recent,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Register or replace the rule for `(rule.chain_id, rule.kind)`
    pub async fn set_rule(&self, rule: AlertRule) {
        let mut rules = self.rules.write().await;
        rules.insert((rule.chain_id, rule.kind), rule);
    }

    /// Remove the rule for a chain/kind pair, if present
    pub async fn remove_rule(&self, chain_id: ChainId, kind: MetricKind) {
        let mut rules = self.rules.write().await;
        rules.remove(&(chain_id, kind));
    }

    /// Register an alert callback; all subscribers receive every alert
    pub async fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&Alert) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.write().await;
        subscribers.push(Box::new(callback));
    }

    /// Get the most recent alerts, newest first
    pub async fn recent(&self, count: usize) -> Vec<Alert> {
        let recent = self.recent.read().await;
        recent.iter().rev().take(count).cloned().collect()
    }

    /// Re-check the rule covering `kind` against the updated snapshot
    ///
    /// SyncStatus and PeerCount are hard-wired checks that run whether or not
    /// a rule is registered; a registered rule only overrides the emitted
    /// severity. The remaining kinds fire only when a rule exists for that
    /// chain and kind.
    pub async fn evaluate(&self, snapshot: &MetricsSnapshot, kind: MetricKind) {
        let rule = {
            let rules = self.rules.read().await;
            rules.get(&(snapshot.chain_id, kind)).cloned()
        };

        match kind {
            MetricKind::SyncStatus => {
                if !snapshot.sync_status {
                    let severity = rule.map(|r| r.severity).unwrap_or(Severity::Critical);
                    self.emit(
                        snapshot.chain_id,
                        kind,
                        severity,
                        format!("chain {} reports out of sync", snapshot.chain_id),
                    )
                    .await;
                }
            }
            MetricKind::PeerCount => {
                if snapshot.peer_count < MIN_PEER_COUNT {
                    let severity = rule.map(|r| r.severity).unwrap_or(Severity::High);
                    self.emit(
                        snapshot.chain_id,
                        kind,
                        severity,
                        format!(
                            "chain {} has {} peers, below minimum {}",
                            snapshot.chain_id, snapshot.peer_count, MIN_PEER_COUNT
                        ),
                    )
                    .await;
                }
            }
            MetricKind::BlockProduction => {
                if let Some(rule) = rule {
                    if snapshot.block_interval as f64 > rule.threshold {
                        self.emit(
                            snapshot.chain_id,
                            kind,
                            rule.severity,
                            format!(
                                "block interval {}s on chain {} exceeds threshold {}s",
                                snapshot.block_interval, snapshot.chain_id, rule.threshold
                            ),
                        )
                        .await;
                    }
                }
            }
            MetricKind::TransactionVolume => {
                if let Some(rule) = rule {
                    if snapshot.transaction_count as f64 > rule.threshold {
                        self.emit(
                            snapshot.chain_id,
                            kind,
                            rule.severity,
                            format!(
                                "transaction count {} on chain {} exceeds threshold {}",
                                snapshot.transaction_count, snapshot.chain_id, rule.threshold
                            ),
                        )
                        .await;
                    }
                }
            }
            MetricKind::MessageLatency => {
                if let Some(rule) = rule {
                    if snapshot.average_message_latency > rule.threshold {
                        self.emit(
                            snapshot.chain_id,
                            kind,
                            rule.severity,
                            format!(
                                "average message latency {:.0}ms on chain {} exceeds threshold {:.0}ms",
                                snapshot.average_message_latency,
                                snapshot.chain_id,
                                rule.threshold
                            ),
                        )
                        .await;
                    }
                }
            }
        }
    }

    async fn emit(&self, chain_id: ChainId, kind: MetricKind, severity: Severity, message: String) {
        let alert = Alert {
            id: Uuid::new_v4(),
            chain_id,
            kind,
            severity,
            message,
            emitted_at: Utc::now(),
        };

        match severity {
            Severity::Critical => error!("[{}] [chain {}] {}", kind, chain_id, alert.message),
            _ => warn!("[{}] [chain {}] {}", kind, chain_id, alert.message),
        }

        {
            let mut recent = self.recent.write().await;
            recent.push_back(alert.clone());
            while recent.len() > self.max_recent {
                recent.pop_front();
            }
        }

        let subscribers = self.subscribers.read().await;
        for callback in subscribers.iter() {
            callback(&alert);
        }
    }
}

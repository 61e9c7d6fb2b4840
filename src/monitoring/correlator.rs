use crate::types::{MessageKey, PendingMessage};
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Tracks in-flight cross-chain messages and matches sends to deliveries
///
/// Shared by the message watchers of every chain. Matching is a single point
/// lookup: no reordering and no duplicate-delivery suppression. A duplicate
/// send with the same key overwrites the pending entry.
pub struct MessageCorrelator {
    pending: DashMap<MessageKey, PendingMessage>,
}

impl MessageCorrelator {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Record an outgoing message observed on its source chain
    pub fn record_send(&self, key: MessageKey) {
        self.pending.insert(key, PendingMessage::now());
    }

    /// Match a delivery observed on the target chain against a pending send
    ///
    /// Returns the send-to-delivery latency and removes the entry if a
    /// matching send was recorded; returns None otherwise (the delivery is
    /// dropped with no metric impact).
    pub fn match_receive(&self, key: &MessageKey) -> Option<Duration> {
        let (_, message) = self.pending.remove(key)?;
        Some(Instant::now().duration_since(message.sent_at))
    }

    /// Number of messages currently awaiting delivery
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for MessageCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChainId;

    fn key(seq: u64) -> MessageKey {
        MessageKey::new(ChainId(1), ChainId(2), seq)
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_then_receive_yields_latency_and_removes_entry() {
        let correlator = MessageCorrelator::new();
        correlator.record_send(key(7));
        assert_eq!(correlator.pending_count(), 1);

        tokio::time::advance(Duration::from_secs(5)).await;

        let latency = correlator.match_receive(&key(7)).unwrap();
        assert_eq!(latency, Duration::from_secs(5));
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_second_receive_is_a_no_op() {
        let correlator = MessageCorrelator::new();
        correlator.record_send(key(7));

        assert!(correlator.match_receive(&key(7)).is_some());
        assert!(correlator.match_receive(&key(7)).is_none());
    }

    #[tokio::test]
    async fn test_orphan_receive_matches_nothing() {
        let correlator = MessageCorrelator::new();
        assert!(correlator.match_receive(&key(9)).is_none());
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_send_overwrites() {
        let correlator = MessageCorrelator::new();
        correlator.record_send(key(7));

        tokio::time::advance(Duration::from_secs(10)).await;
        correlator.record_send(key(7));
        assert_eq!(correlator.pending_count(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;

        // Latency is measured from the retransmission, not the first send
        let latency = correlator.match_receive(&key(7)).unwrap();
        assert_eq!(latency, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_keys_with_different_direction_are_distinct() {
        let correlator = MessageCorrelator::new();
        correlator.record_send(MessageKey::new(ChainId(1), ChainId(2), 1));

        let reversed = MessageKey::new(ChainId(2), ChainId(1), 1);
        assert!(correlator.match_receive(&reversed).is_none());
        assert_eq!(correlator.pending_count(), 1);
    }
}

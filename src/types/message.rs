use crate::types::ChainId;
use tokio::time::Instant;

/// Identity of an in-flight cross-chain message
///
/// A send on the source chain and the matching delivery on the target chain
/// share the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKey {
    /// Chain the message was sent from
    pub source: ChainId,
    /// Chain the message is expected to be delivered on
    pub target: ChainId,
    /// Bridge sequence number
    pub sequence: u64,
}

impl MessageKey {
    pub fn new(source: ChainId, target: ChainId, sequence: u64) -> Self {
        Self {
            source,
            target,
            sequence,
        }
    }
}

/// A message observed leaving its source chain and not yet confirmed delivered
#[derive(Debug, Clone, Copy)]
pub struct PendingMessage {
    /// When the send event was observed
    pub sent_at: Instant,
}

impl PendingMessage {
    pub fn now() -> Self {
        Self {
            sent_at: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_key_equality() {
        let a = MessageKey::new(ChainId(1), ChainId(2), 7);
        let b = MessageKey::new(ChainId(1), ChainId(2), 7);
        let c = MessageKey::new(ChainId(2), ChainId(1), 7);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}

use crate::types::ChainId;
use serde::{Deserialize, Serialize};

/// A newly produced block observed on a chain's block subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEvent {
    /// Block height
    pub number: u64,
    /// Block timestamp (unix seconds)
    pub timestamp: u64,
    /// Number of transactions included in the block
    pub transaction_count: u64,
    /// Total gas used by the block
    pub gas_used: u64,
}

/// An application-level bridge event observed on a chain's message subscription
///
/// Events carry the counterpart chain only; the chain they were observed on
/// is known to the watcher that owns the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeEvent {
    /// A message left the observed chain, bound for `target`
    MessageSent { target: ChainId, sequence: u64 },
    /// A message from `source` was confirmed delivered on the observed chain
    MessageReceived { source: ChainId, sequence: u64 },
}

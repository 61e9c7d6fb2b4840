use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a monitored blockchain network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        ChainId(id)
    }
}

/// Static configuration for one monitored chain
///
/// Built once at startup from external configuration and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain identifier
    pub chain_id: ChainId,
    /// Human-readable chain name
    pub name: String,
    /// Node endpoint the connection dials
    pub endpoint: String,
    /// Address of the bridge/message contract to watch
    pub bridge_address: String,
}

impl ChainConfig {
    pub fn new(
        chain_id: impl Into<ChainId>,
        name: impl Into<String>,
        endpoint: impl Into<String>,
        bridge_address: impl Into<String>,
    ) -> Self {
        Self {
            chain_id: chain_id.into(),
            name: name.into(),
            endpoint: endpoint.into(),
            bridge_address: bridge_address.into(),
        }
    }
}

pub mod chain;
pub mod message;
pub mod metrics;

pub use chain::{ChainConfig, ChainId};
pub use message::{MessageKey, PendingMessage};
pub use metrics::{MetricKind, MetricsSnapshot};

pub mod alerts;
pub mod correlator;
pub mod publisher;
pub mod store;

pub use alerts::{Alert, AlertEngine, AlertRule, Severity, MIN_PEER_COUNT};
pub use correlator::MessageCorrelator;
pub use publisher::MetricsPublisher;
pub use store::MetricsStore;

pub mod connectors;
pub mod engine;
pub mod monitoring;
pub mod recovery;
pub mod traits;
pub mod types;
pub mod watchers;

pub use connectors::{MockChainConnection, MockChainHandle};
pub use engine::{ChainMonitor, MonitorConfig, MonitorError};
pub use monitoring::{
    Alert, AlertEngine, AlertRule, MessageCorrelator, MetricsPublisher, MetricsStore, Severity,
    MIN_PEER_COUNT,
};
pub use recovery::{Backoff, RetryConfig};
pub use traits::{
    BlockEvent, BlockStream, BridgeEvent, BridgeEventStream, ChainConnection, ConnectionError,
};
pub use types::{ChainConfig, ChainId, MessageKey, MetricKind, MetricsSnapshot, PendingMessage};
pub use watchers::{BlockWatcher, HealthPoller, MessageWatcher, MetricUpdate};

/// Initialize console (and optionally file) logging
pub fn init_logging(level: &str, log_file: Option<&str>) -> Result<(), fern::InitError> {
    let level = level.parse().unwrap_or(log::LevelFilter::Info);

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}

use chainwatch::{
    init_logging, Alert, AlertRule, BlockEvent, BridgeEvent, ChainConfig, ChainId, ChainMonitor,
    MetricKind, MetricsSnapshot, MockChainConnection, MonitorConfig, RetryConfig, Severity,
};
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn print_alert(alert: &Alert) {
    println!(
        "  🔔 [{:?}] chain {} {} - {}",
        alert.severity, alert.chain_id, alert.kind, alert.message
    );
}

fn print_snapshot(snapshot: &MetricsSnapshot) {
    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║ Chain {:53} ║", snapshot.chain_id.to_string());
    println!("╠════════════════════════════════════════════════════════════╣");
    println!("║ Last block time:      {:36} ║", snapshot.last_block_time);
    println!("║ Block interval:       {:36} ║", format!("{}s", snapshot.block_interval));
    println!("║ Transactions:         {:36} ║", snapshot.transaction_count);
    println!("║ Gas used:             {:36} ║", snapshot.gas_used);
    println!("║ Gas price:            {:36} ║", snapshot.average_gas_price);
    println!("║ Outgoing messages:    {:36} ║", snapshot.outgoing_messages);
    println!("║ Incoming messages:    {:36} ║", snapshot.incoming_messages);
    println!(
        "║ Avg message latency:  {:36} ║",
        format!("{:.0}ms", snapshot.average_message_latency)
    );
    println!("║ Peers:                {:36} ║", snapshot.peer_count);
    println!("║ In sync:              {:36} ║", snapshot.sync_status);
    println!("╚════════════════════════════════════════════════════════════╝");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("info", None)?;
    info!("chainwatch dry run starting");

    let (conn_a, handle_a) = MockChainConnection::new();
    let (conn_b, handle_b) = MockChainConnection::new();
    handle_a.set_gas_price(21.5).await;
    handle_b.set_gas_price(0.3).await;
    handle_b.set_peer_count(2);

    let config = MonitorConfig {
        poll_interval: Duration::from_secs(1),
        debounce_window: Duration::from_millis(500),
        retry: RetryConfig::default(),
        ..MonitorConfig::default()
    };
    let monitor = ChainMonitor::new(
        config,
        vec![
            (
                ChainConfig::new(1, "alpha", "mock://alpha", "0xaaaa"),
                Arc::new(conn_a) as Arc<dyn chainwatch::ChainConnection>,
            ),
            (
                ChainConfig::new(2, "beta", "mock://beta", "0xbbbb"),
                Arc::new(conn_b) as Arc<dyn chainwatch::ChainConnection>,
            ),
        ],
    );

    monitor
        .set_alert_config(AlertRule {
            chain_id: ChainId(1),
            kind: MetricKind::BlockProduction,
            threshold: 15.0,
            severity: Severity::High,
        })
        .await;

    monitor
        .on_alerts(|alert| {
            print_alert(alert);
        })
        .await;
    monitor
        .on_metrics(|batch| {
            println!("  📊 metrics batch: {} chain(s) updated", batch.len());
        })
        .await;

    monitor.start().await?;

    // Chain 1 produces blocks 20s apart, tripping the 15s rule
    handle_a.push_block(BlockEvent {
        number: 100,
        timestamp: 1_700_000_000,
        transaction_count: 41,
        gas_used: 8_200_000,
    });
    handle_a.push_block(BlockEvent {
        number: 101,
        timestamp: 1_700_000_020,
        transaction_count: 18,
        gas_used: 3_100_000,
    });

    // A message crosses from chain 1 to chain 2
    handle_a.push_bridge_event(BridgeEvent::MessageSent {
        target: ChainId(2),
        sequence: 7,
    });
    sleep(Duration::from_millis(200)).await;
    handle_b.push_bridge_event(BridgeEvent::MessageReceived {
        source: ChainId(1),
        sequence: 7,
    });

    // Let the health poller observe chain 2's low peer count
    sleep(Duration::from_millis(1500)).await;

    println!();
    for snapshot in monitor.get_all_metrics().await {
        print_snapshot(&snapshot);
    }

    println!(
        "recent alerts: {}",
        serde_json::to_string_pretty(&monitor.recent_alerts(10).await)?
    );
    println!("pending messages: {}", monitor.pending_messages());

    monitor.stop().await;
    info!("chainwatch dry run finished");
    Ok(())
}

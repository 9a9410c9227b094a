//! Meridian node binary.

use md_01_peer_network::NetworkApi;
use meridian_telemetry::{init_telemetry, TelemetryConfig};
use node_runtime::{build_node, NodeConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let telemetry = TelemetryConfig::from_env();
    let _guard = init_telemetry(&telemetry)?;

    let config = NodeConfig::from_env()?;
    tracing::info!(
        active_delegates = config.active_delegates,
        nonce = %config.network.node_nonce,
        "starting meridian node"
    );

    let mut node = build_node(&config).await?;
    let mut network_events = node
        .take_network_events()
        .expect("events taken once at startup");

    node.network.start().await?;

    let event_logger = tokio::spawn(async move {
        while let Some(event) = network_events.recv().await {
            tracing::debug!(?event, "network event");
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    node.network.stop().await?;
    event_logger.abort();
    Ok(())
}

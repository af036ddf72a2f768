//! Rime node binary
//!
//! Boots a full in-process simulation: random peer topology, one HTTP node
//! per port, and the public gateway in front of them.

use std::sync::Arc;

use rime_node::{build_network, serve_network, Gateway, HttpPeerClient, SimulationConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rime_node=info,rime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SimulationConfig::from_env();
    tracing::info!(?config, "starting rime network");

    let network = build_network(&config, Arc::new(HttpPeerClient::new())).await?;
    serve_network(&network);

    let gateway = Gateway::new(network.addresses(), config.gateway_port);
    gateway.serve().await?;

    Ok(())
}

//! Concord Node binary
//!
//! Serves collaborative documents and their proposal votes to local clients.

use concord_node::{ConcordNode, NodeConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "concord_node=info,concord_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Concord Node");

    let config = NodeConfig::default();

    let node = ConcordNode::new(config)?;
    node.run().await?;

    Ok(())
}

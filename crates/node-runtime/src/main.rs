//! # Slot-Chain Node Runtime
//!
//! Runs a development chain with the local key as its only authority.
//! Set `RUST_LOG` to tune verbosity (default `info`).

use anyhow::Result;
use node_runtime::{load_config, DevNode};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  Slot-Chain Node Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let config = load_config();
    let node = DevNode::new(config)?;
    let running = node.start();

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    running.shutdown().await;

    let metrics = node.metrics();
    info!(
        "Authored {} blocks, claim rate {:.2}",
        metrics.get_blocks_authored(),
        metrics.get_claim_rate()
    );

    Ok(())
}

//! # Transaction Pool Node
//!
//! Runs one transaction pool for a single shard.
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`RUST_LOG`, default `info`)
//! 2. Load configuration from the environment
//! 3. Load genesis into the ledger (skipped with `QC_TXPOOL_BYPASS`)
//! 4. Start the pool server and its endpoints
//! 5. Spawn and register the built-in validators
//! 6. Wait for Ctrl+C, then drain and stop

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use node_runtime::{NodeConfig, TxPoolContainer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .init();

    // Load configuration
    let config = NodeConfig::from_env().context("Failed to load configuration")?;
    info!(
        shard = %config.shard_id,
        max_workers = config.txpool.max_workers,
        capacity = config.txpool.max_pool_size,
        "Configuration loaded"
    );

    let container = TxPoolContainer::start(&config).await?;

    // Keep the node running
    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    // Graceful shutdown
    container.shutdown().await;

    Ok(())
}

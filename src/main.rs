//! pool-cycler
//!
//! Alternates `depositETH` / `withdrawETH` calls against a lending-pool
//! gateway until a fixed number of confirmed transactions is reached.
//! Progress survives restarts through a small JSON checkpoint.
//!
//! # Architecture Overview
//!
//! ```text
//!   .env / environment ──▶ config ──▶ Settings
//!                                        │
//!              ┌─────────────────────────┼──────────────────────┐
//!              ▼                         ▼                      ▼
//!        BlockchainClient             Wallet              CheckpointStore
//!              └────────────┬────────────┘                      │
//!                           ▼                                   │
//!                TxBuilder ─▶ ChainSubmitter ─────▶ Driver ◀────┘
//!                                                     │
//!                                   status block / checkpoint / metrics
//! ```

use std::path::PathBuf;
use std::time::Duration;

use pool_cycler::blockchain::{BlockchainClient, TxBuilder, Wallet};
use pool_cycler::checkpoint::CheckpointStore;
use pool_cycler::config::load_settings_from_env;
use pool_cycler::cycler::{ChainSubmitter, Driver, Limits};
use pool_cycler::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration errors are fatal before any transaction activity
    let settings = load_settings_from_env()?;
    let config = &settings.config;

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        rpc_url = %config.chain.rpc_url,
        gateway = %settings.gateway,
        lending_pool = %settings.lending_pool,
        quota = config.campaign.quota,
        amount_eth = %config.campaign.amount_eth,
        "pool-cycler v0.1.0 starting"
    );

    for warning in &settings.warnings {
        tracing::warn!("Configuration warning: {}", warning);
    }

    // Validation already rejected an unparsable address when metrics are enabled
    if let Some(addr) = config.observability.metrics_listen_addr() {
        metrics::init_metrics(addr);
    }

    let client = BlockchainClient::new(config.chain.clone()).await?;
    if !client.is_healthy().await {
        tracing::warn!("RPC endpoint not reachable yet; attempts will retry");
    }

    let wallet = Wallet::from_private_key(&settings.private_key)?;
    let submitter = ChainSubmitter::from_settings(&settings, TxBuilder::new(client, wallet))?;

    let store = CheckpointStore::new(PathBuf::from(&config.campaign.checkpoint_path));
    let driver = Driver::new(
        submitter,
        store,
        Limits::from(&config.campaign),
        Duration::from_secs(config.campaign.interval_secs),
    );

    let final_state = driver.run().await;

    tracing::info!(checkpoint = %final_state, "All transactions complete");
    Ok(())
}

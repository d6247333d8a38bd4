//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + failovers)
//! - Query chain state (chain id, nonce, base fee, receipts)
//! - Estimate gas and broadcast raw transactions
//! - Handle timeouts and network errors gracefully
//!
//! Per-provider failures are logged at `debug`; the caller gets the error
//! and reports it once.

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainConfig, ChainId};
use crate::observability::metrics;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Configuration.
    config: ChainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// Fails only on a malformed primary URL. An unreachable endpoint is
    /// logged and tolerated; every later call retries it.
    pub async fn new(config: ChainConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as Arc<dyn Provider + Send + Sync>);

        // 2. Add failover providers
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let client = Self {
            providers,
            config: config.clone(),
            timeout_duration,
        };

        match client.verify_chain_id().await {
            Ok(chain_id) => {
                tracing::info!(
                    providers = client.providers.len(),
                    chain_id = chain_id.0,
                    "Blockchain client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Blockchain client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Client over pre-built providers, skipping URL parsing and chain verification.
    #[cfg(test)]
    pub(crate) fn with_providers(
        providers: Vec<Arc<dyn Provider + Send + Sync>>,
        config: ChainConfig,
    ) -> Self {
        Self {
            providers,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            config,
        }
    }

    /// Verify the connected chain ID matches configuration, if one is configured.
    pub async fn verify_chain_id(&self) -> BlockchainResult<ChainId> {
        let chain_id = self.get_chain_id().await?;
        if let Some(expected) = self.config.chain_id {
            if chain_id.0 != expected {
                return Err(BlockchainError::ChainMismatch {
                    expected,
                    actual: chain_id.0,
                });
            }
        }
        Ok(chain_id)
    }

    /// Chain ID to sign with: the configured one, else the node's.
    pub async fn signing_chain_id(&self) -> BlockchainResult<ChainId> {
        match self.config.chain_id {
            Some(id) => Ok(ChainId(id)),
            None => self.get_chain_id().await,
        }
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_chain_id();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::debug!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::debug!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(BlockchainError::Rpc("All RPC providers failed".to_string()))
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_block_number();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::debug!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::debug!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get block number".to_string()))
    }

    /// Get the transaction count (nonce) for an address.
    pub async fn get_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_count(address);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::debug!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::debug!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get transaction count".to_string()))
    }

    /// Get the base fee of the latest block in wei.
    ///
    /// `None` when the chain does not report one (pre-London).
    pub async fn get_base_fee(&self) -> BlockchainResult<Option<u128>> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider
                .get_block_by_number(BlockNumberOrTag::Latest)
                .into_future();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(Some(block))) => {
                    return Ok(block.header.base_fee_per_gas.map(u128::from));
                }
                Ok(Ok(None)) => tracing::debug!(provider_idx = i, "Latest block not available"),
                Ok(Err(e)) => tracing::debug!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::debug!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get latest block".to_string()))
    }

    /// Estimate gas for a call.
    pub async fn estimate_gas(&self, tx: &TransactionRequest) -> BlockchainResult<u64> {
        let mut last_error = None;
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.estimate_gas(tx.clone()).into_future();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(gas)) => return Ok(gas),
                Ok(Err(e)) => {
                    tracing::debug!(provider_idx = i, error = %e, "Gas estimation failed");
                    last_error = Some(e.to_string());
                }
                Err(_) => tracing::debug!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::GasEstimation(
            last_error.unwrap_or_else(|| "all providers timed out".to_string()),
        ))
    }

    /// Broadcast a signed transaction and return its hash.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        let mut last_error = None;
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.send_raw_transaction(raw);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(pending)) => return Ok(*pending.tx_hash()),
                Ok(Err(e)) => {
                    tracing::debug!(provider_idx = i, error = %e, "Broadcast failed");
                    last_error = Some(e.to_string());
                }
                Err(_) => tracing::debug!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc(format!(
            "All providers failed to broadcast transaction: {}",
            last_error.unwrap_or_else(|| "timeout".to_string())
        )))
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_receipt(tx_hash);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::debug!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::debug!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get receipt".to_string()))
    }

    /// Check if the blockchain is reachable and healthy.
    ///
    /// Returns true if we can query the block number.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_rpc_health(healthy);
        healthy
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Get the number of confirmation blocks required.
    pub fn confirmation_blocks(&self) -> u32 {
        self.config.confirmation_blocks
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("failovers", &self.config.failover_urls.len())
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Counts this crate's events at WARN or above.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let meta = event.metadata();
            if *meta.level() <= tracing::Level::WARN && meta.target().starts_with("pool_cycler") {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn test_config() -> ChainConfig {
        ChainConfig {
            // Nothing listens here; calls fail fast with connection refused
            rpc_url: "http://127.0.0.1:9".to_string(),
            rpc_timeout_secs: 2,
            ..ChainConfig::default()
        }
    }

    #[tokio::test]
    async fn test_client_creation_tolerates_unreachable_rpc() {
        let result = BlockchainClient::new(test_config()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_rpc_url_rejected() {
        let config = ChainConfig {
            rpc_url: "not a url".to_string(),
            ..test_config()
        };
        let err = BlockchainClient::new(config).await.unwrap_err();
        assert!(err.to_string().contains("Invalid RPC URL"));
    }

    #[tokio::test]
    async fn test_rpc_failover_exhausted() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:10".to_string());
        config.failover_urls.push("::not-a-url::".to_string());

        let client = BlockchainClient::new(config).await.unwrap();
        assert_eq!(client.providers.len(), 2);

        let result = client.get_chain_id().await;
        assert!(result.unwrap_err().to_string().contains("All RPC providers failed"));
        assert!(!client.is_healthy().await);
    }

    #[tokio::test]
    async fn test_configured_chain_id_skips_rpc() {
        let config = ChainConfig {
            chain_id: Some(167_000),
            ..test_config()
        };
        let client = BlockchainClient::new(config).await.unwrap();
        assert_eq!(client.signing_chain_id().await.unwrap(), ChainId(167_000));
    }

    #[tokio::test]
    async fn test_failed_calls_leave_reporting_to_caller() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:10".to_string());
        let client = BlockchainClient::new(config).await.unwrap();

        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let err = client
            .estimate_gas(&TransactionRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BlockchainError::GasEstimation(_)));

        let err = client
            .send_raw_transaction(&Bytes::from_static(&[0x02]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to broadcast"));

        assert_eq!(warnings.load(Ordering::SeqCst), 0);
    }
}

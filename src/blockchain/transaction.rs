//! Transaction building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Build EIP-1559 transactions with estimated gas and policy fees
//! - Sign and broadcast transactions
//! - Monitor confirmations until a receipt timeout

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::contract::ContractCall;
use crate::blockchain::fees::{FeePolicy, FeeQuote, GasMargin};
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};
use crate::blockchain::wallet::Wallet;

/// Transaction builder bound to one client and one signing wallet.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    client: BlockchainClient,
    wallet: Wallet,
    gas_margin: GasMargin,
}

impl TxBuilder {
    /// Create a new transaction builder.
    pub fn new(client: BlockchainClient, wallet: Wallet) -> Self {
        let gas_margin = GasMargin::new(client.config().gas_margin_percent);
        Self {
            client,
            wallet,
            gas_margin,
        }
    }

    /// Resolve fees for `policy`, fetching the latest base fee only when needed.
    pub async fn quote_fees(&self, policy: &FeePolicy) -> BlockchainResult<FeeQuote> {
        let base_fee = if policy.needs_base_fee() {
            Some(
                self.client
                    .get_base_fee()
                    .await?
                    .ok_or(BlockchainError::MissingBaseFee)?,
            )
        } else {
            None
        };
        policy.quote(base_fee)
    }

    /// Build a fully populated transaction request for `call`.
    ///
    /// Gas is estimated against the chain and padded by the margin; the nonce
    /// is read fresh from the chain on every call.
    pub async fn build(
        &self,
        call: &ContractCall,
        policy: &FeePolicy,
    ) -> BlockchainResult<TransactionRequest> {
        let fees = self.quote_fees(policy).await?;

        let request = TransactionRequest::default()
            .with_from(self.wallet.address())
            .with_to(call.to)
            .with_value(call.value)
            .with_input(call.input.clone());

        let estimate = self.client.estimate_gas(&request).await?;
        let gas_limit = self.gas_margin.apply(estimate);

        let nonce = self.client.get_transaction_count(self.wallet.address()).await?;
        let chain_id = self.client.signing_chain_id().await?;

        tracing::debug!(
            nonce = nonce,
            gas_estimate = estimate,
            gas_limit = gas_limit,
            fees = %fees,
            "Transaction built"
        );

        Ok(request
            .with_nonce(nonce)
            .with_chain_id(chain_id.0)
            .with_gas_limit(gas_limit)
            .with_max_fee_per_gas(fees.max_fee_per_gas)
            .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas))
    }

    /// Build, sign, broadcast and wait for `call` to be confirmed.
    ///
    /// A reverted receipt is returned as [`BlockchainError::Reverted`].
    pub async fn send(&self, call: &ContractCall, policy: &FeePolicy) -> BlockchainResult<TxHash> {
        let request = self.build(call, policy).await?;
        let raw = self.wallet.sign_transaction(request).await?;
        let tx_hash = self.client.send_raw_transaction(&raw).await?;

        tracing::debug!(tx_hash = %tx_hash, "Transaction broadcast");

        let config = self.client.config();
        let status = self
            .wait_for_confirmation(
                tx_hash,
                Duration::from_secs(config.receipt_timeout_secs),
                Duration::from_millis(config.receipt_poll_ms),
            )
            .await?;

        match status {
            ConfirmationStatus::Confirmed { block_number } => {
                tracing::debug!(tx_hash = %tx_hash, block_number = block_number, "Transaction confirmed");
                Ok(tx_hash)
            }
            ConfirmationStatus::Failed(reason) => Err(BlockchainError::Reverted(format!(
                "{} ({})",
                tx_hash, reason
            ))),
        }
    }

    /// Wait for a transaction to be confirmed.
    ///
    /// # Arguments
    /// * `tx_hash` - Transaction hash to monitor
    /// * `max_wait` - Maximum time to wait for confirmation
    /// * `poll_interval` - Delay between receipt queries
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> BlockchainResult<ConfirmationStatus> {
        let required_confirmations = self.client.confirmation_blocks();

        let result = timeout(max_wait, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                // Transient RPC errors while polling are retried until the deadline
                let receipt = match self.client.get_transaction_receipt(tx_hash).await {
                    Ok(Some(r)) => r,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                    Err(e) => {
                        tracing::debug!(tx_hash = %tx_hash, error = %e, "Receipt lookup failed");
                        continue;
                    }
                };

                if !receipt.status() {
                    return Ok(ConfirmationStatus::Failed(
                        "Transaction reverted".to_string(),
                    ));
                }

                if required_confirmations == 0 {
                    return Ok(ConfirmationStatus::Confirmed {
                        block_number: receipt.block_number.unwrap_or_default(),
                    });
                }

                let current_block = match self.client.get_block_number().await {
                    Ok(block) => block,
                    Err(e) => {
                        tracing::debug!(tx_hash = %tx_hash, error = %e, "Block number lookup failed");
                        continue;
                    }
                };
                let tx_block = receipt.block_number.unwrap_or(current_block);
                let confirmations = current_block.saturating_sub(tx_block) as u32;

                if confirmations >= required_confirmations {
                    return Ok(ConfirmationStatus::Confirmed {
                        block_number: tx_block,
                    });
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = confirmations,
                    required = required_confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(BlockchainError::ConfirmationTimeout {
                tx_hash: tx_hash.to_string(),
                timeout_secs: max_wait.as_secs(),
            }),
        }
    }

    /// Get the wallet address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::ChainConfig;
    use alloy::primitives::{Bytes, U256};
    use alloy::providers::mock::Asserter;
    use alloy::providers::{Provider, ProviderBuilder};
    use serde_json::{json, Value};
    use std::sync::Arc;

    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    async fn offline_builder() -> TxBuilder {
        let config = ChainConfig {
            rpc_url: "http://127.0.0.1:9".to_string(),
            rpc_timeout_secs: 2,
            ..ChainConfig::default()
        };
        let client = BlockchainClient::new(config).await.unwrap();
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap();
        TxBuilder::new(client, wallet)
    }

    #[tokio::test]
    async fn test_flat_fees_need_no_rpc() {
        let builder = offline_builder().await;
        let policy = FeePolicy::new(15_000_000, Some(15_000_000)).unwrap();
        let quote = builder.quote_fees(&policy).await.unwrap();
        assert_eq!(quote.max_fee_per_gas, 15_000_000);
    }

    #[tokio::test]
    async fn test_send_fails_without_rpc() {
        let builder = offline_builder().await;
        let call = ContractCall {
            to: Address::repeat_byte(0x11),
            value: U256::ZERO,
            input: Bytes::new(),
        };
        let policy = FeePolicy::new(15_000_000, Some(15_000_000)).unwrap();

        let err = builder.send(&call, &policy).await.unwrap_err();
        assert!(matches!(err, BlockchainError::GasEstimation(_)));
    }

    #[tokio::test]
    async fn test_confirmation_times_out() {
        let builder = offline_builder().await;
        let err = builder
            .wait_for_confirmation(
                TxHash::repeat_byte(0xab),
                Duration::from_millis(300),
                Duration::from_millis(50),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BlockchainError::ConfirmationTimeout { .. }));
    }

    fn mocked_builder(asserter: &Asserter, config: ChainConfig) -> TxBuilder {
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());
        let providers: Vec<Arc<dyn Provider + Send + Sync>> = vec![Arc::new(provider)];
        let client = BlockchainClient::with_providers(providers, config);
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap();
        TxBuilder::new(client, wallet)
    }

    fn mocked_config() -> ChainConfig {
        ChainConfig {
            chain_id: Some(167_000),
            rpc_timeout_secs: 2,
            ..ChainConfig::default()
        }
    }

    fn receipt(tx_hash: TxHash, block_number: u64, success: bool) -> Value {
        json!({
            "type": "0x2",
            "status": if success { "0x1" } else { "0x0" },
            "cumulativeGasUsed": "0x5208",
            "logs": [],
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "transactionHash": tx_hash,
            "transactionIndex": "0x0",
            "blockHash": TxHash::repeat_byte(0xbb),
            "blockNumber": format!("{:#x}", block_number),
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "from": Address::repeat_byte(0x01),
            "to": Address::repeat_byte(0x11),
            "contractAddress": null
        })
    }

    fn latest_block(base_fee_per_gas: u64) -> Value {
        let zero_hash = TxHash::ZERO;
        json!({
            "hash": TxHash::repeat_byte(0xcc),
            "parentHash": zero_hash,
            "sha3Uncles": zero_hash,
            "miner": Address::ZERO,
            "stateRoot": zero_hash,
            "transactionsRoot": zero_hash,
            "receiptsRoot": zero_hash,
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "difficulty": "0x0",
            "number": "0x10",
            "gasLimit": "0x1c9c380",
            "gasUsed": "0x0",
            "timestamp": "0x6553f100",
            "extraData": "0x",
            "mixHash": zero_hash,
            "nonce": "0x0000000000000000",
            "baseFeePerGas": format!("{:#x}", base_fee_per_gas),
            "uncles": [],
            "transactions": []
        })
    }

    fn gateway_call() -> ContractCall {
        ContractCall {
            to: Address::repeat_byte(0x11),
            value: U256::from(400_000_000_000_000_000u64),
            input: Bytes::from_static(&[0x47, 0x4c, 0xf5, 0x3d]),
        }
    }

    #[tokio::test]
    async fn test_dynamic_fees_use_latest_base_fee() {
        let asserter = Asserter::new();
        asserter.push_success(&latest_block(1_000_000_000));
        let builder = mocked_builder(&asserter, mocked_config());

        let policy = FeePolicy::new(15_000_000, None).unwrap();
        let quote = builder.quote_fees(&policy).await.unwrap();
        assert_eq!(quote.max_fee_per_gas, 1_015_000_000);
        assert_eq!(quote.max_priority_fee_per_gas, 15_000_000);
    }

    #[tokio::test]
    async fn test_send_confirms_successful_receipt() {
        let tx_hash = TxHash::repeat_byte(0xab);
        let asserter = Asserter::new();
        asserter.push_success(&"0x5208"); // eth_estimateGas
        asserter.push_success(&"0x7"); // eth_getTransactionCount
        asserter.push_success(&tx_hash); // eth_sendRawTransaction
        asserter.push_success(&receipt(tx_hash, 0x10, true));
        let builder = mocked_builder(&asserter, mocked_config());

        let policy = FeePolicy::new(15_000_000, Some(15_000_000)).unwrap();
        let sent = builder.send(&gateway_call(), &policy).await.unwrap();
        assert_eq!(sent, tx_hash);
    }

    #[tokio::test]
    async fn test_send_reports_revert() {
        let tx_hash = TxHash::repeat_byte(0xab);
        let asserter = Asserter::new();
        asserter.push_success(&"0x5208");
        asserter.push_success(&"0x7");
        asserter.push_success(&tx_hash);
        asserter.push_success(&receipt(tx_hash, 0x10, false));
        let builder = mocked_builder(&asserter, mocked_config());

        let policy = FeePolicy::new(15_000_000, Some(15_000_000)).unwrap();
        let err = builder.send(&gateway_call(), &policy).await.unwrap_err();
        assert!(matches!(err, BlockchainError::Reverted(_)));
    }

    #[tokio::test]
    async fn test_block_number_error_is_retried() {
        let tx_hash = TxHash::repeat_byte(0xab);
        let asserter = Asserter::new();
        asserter.push_success(&receipt(tx_hash, 0x10, true));
        asserter.push_failure_msg("header not found");
        asserter.push_success(&receipt(tx_hash, 0x10, true));
        asserter.push_success(&"0x12");
        let config = ChainConfig {
            confirmation_blocks: 2,
            ..mocked_config()
        };
        let builder = mocked_builder(&asserter, config);

        let status = builder
            .wait_for_confirmation(tx_hash, Duration::from_secs(5), Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(status, ConfirmationStatus::Confirmed { block_number: 0x10 });
    }
}

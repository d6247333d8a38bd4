//! Configuration schema definitions.
//!
//! Tunables for the cycler. Every field has a default so an absent or partial
//! TOML overlay still yields a complete configuration. Secrets and contract
//! addresses are not part of the schema; they come from the environment
//! (see [`crate::config::loader`]).

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration for the cycler.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CyclerConfig {
    /// RPC and receipt settings.
    pub chain: ChainConfig,

    /// Quota, caps and loop pacing.
    pub campaign: CampaignConfig,

    /// Fee settings for `depositETH` calls.
    pub deposit: FeeConfig,

    /// Fee settings for `withdrawETH` calls.
    pub withdraw: FeeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Chain RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL. Always replaced by `TAIKO_RPC_URL`.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, tried in order after the primary.
    pub failover_urls: Vec<String>,

    /// Expected chain ID. When unset the node's chain ID is used for signing.
    pub chain_id: Option<u64>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Maximum time to wait for a receipt after broadcast, in seconds.
    pub receipt_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub receipt_poll_ms: u64,

    /// Blocks on top of the inclusion block before a receipt counts.
    pub confirmation_blocks: u32,

    /// Safety margin added to gas estimates (20 = +20%).
    pub gas_margin_percent: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: None,
            rpc_timeout_secs: 10,
            receipt_timeout_secs: 120,
            receipt_poll_ms: 1000,
            confirmation_blocks: 0,
            gas_margin_percent: 20,
        }
    }
}

/// Transaction campaign configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Total confirmed transactions before the cycler stops for good.
    pub quota: u64,

    /// Maximum number of deposits.
    pub deposit_cap: u64,

    /// Maximum number of withdrawals.
    pub withdraw_cap: u64,

    /// Amount moved per transaction, in ether (decimal string).
    pub amount_eth: String,

    /// Referral code passed to `depositETH`.
    pub referral_code: u16,

    /// Delay between loop iterations in seconds.
    pub interval_secs: u64,

    /// Location of the checkpoint file.
    pub checkpoint_path: String,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            quota: 110,
            deposit_cap: 55,
            withdraw_cap: 55,
            amount_eth: "0.4".to_string(),
            referral_code: 0,
            interval_secs: 3,
            checkpoint_path: "transaction_status.json".to_string(),
        }
    }
}

/// EIP-1559 fee settings for one transaction kind, in gwei.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FeeConfig {
    /// Priority fee (tip) in gwei.
    pub priority_fee_gwei: String,

    /// Flat max fee in gwei. When unset, latest base fee + priority fee is used.
    #[serde(default)]
    pub max_fee_gwei: Option<String>,
}

impl FeeConfig {
    /// Flat fee where max fee equals the priority fee.
    pub fn flat(gwei: &str) -> Self {
        Self {
            priority_fee_gwei: gwei.to_string(),
            max_fee_gwei: Some(gwei.to_string()),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Address for the metrics listener, `None` when disabled or unparsable.
    pub fn metrics_listen_addr(&self) -> Option<SocketAddr> {
        if !self.metrics_enabled {
            return None;
        }
        self.metrics_address.parse().ok()
    }
}

impl Default for CyclerConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            campaign: CampaignConfig::default(),
            deposit: FeeConfig::flat("0.015"),
            withdraw: FeeConfig::flat("0.011"),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_campaign() {
        let config = CyclerConfig::default();
        assert_eq!(config.campaign.quota, 110);
        assert_eq!(config.campaign.deposit_cap, 55);
        assert_eq!(config.campaign.withdraw_cap, 55);
        assert_eq!(config.campaign.checkpoint_path, "transaction_status.json");
        assert_eq!(config.deposit, FeeConfig::flat("0.015"));
        assert_eq!(config.withdraw, FeeConfig::flat("0.011"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: CyclerConfig = toml::from_str(
            r#"
            [campaign]
            quota = 20

            [withdraw]
            priority_fee_gwei = "0.02"
            "#,
        )
        .unwrap();

        assert_eq!(config.campaign.quota, 20);
        assert_eq!(config.campaign.deposit_cap, 55);
        assert_eq!(config.chain.gas_margin_percent, 20);
        assert_eq!(config.deposit, FeeConfig::flat("0.015"));
        assert_eq!(config.withdraw.priority_fee_gwei, "0.02");
        // No max fee given: base fee + tip at submission time
        assert!(config.withdraw.max_fee_gwei.is_none());
    }

    #[test]
    fn test_metrics_listen_addr() {
        let mut observability = ObservabilityConfig::default();
        assert_eq!(observability.metrics_listen_addr(), None);

        observability.metrics_enabled = true;
        assert_eq!(
            observability.metrics_listen_addr(),
            Some("127.0.0.1:9090".parse().unwrap())
        );

        observability.metrics_address = "localhost".to_string();
        assert_eq!(observability.metrics_listen_addr(), None);
    }
}

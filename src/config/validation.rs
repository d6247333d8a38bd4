//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (quota > 0, timeouts > 0, amounts parse)
//! - Flag cap/quota combinations that stall or are redundant
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Warnings never block startup; errors always do

use thiserror::Error;

use crate::blockchain::fees::{parse_eth, FeePolicy};
use crate::config::schema::CyclerConfig;

/// A configuration value that prevents startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("campaign.quota must be greater than zero")]
    ZeroQuota,

    #[error("campaign.amount_eth is invalid: {0}")]
    InvalidAmount(String),

    #[error("{kind} fee settings are invalid: {reason}")]
    InvalidFee { kind: &'static str, reason: String },

    #[error("RPC URL '{url}' is invalid: {reason}")]
    InvalidRpcUrl { url: String, reason: String },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("campaign.checkpoint_path must not be empty")]
    EmptyCheckpointPath,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// A suspicious but usable configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationWarning {
    #[error("deposit_cap + withdraw_cap = {caps} is below quota {quota}; the cycler will stall once both caps are reached")]
    CapsBelowQuota { caps: u64, quota: u64 },

    #[error("deposit_cap + withdraw_cap = {caps} exceeds quota {quota}; the quota ends the campaign first")]
    CapsExceedQuota { caps: u64, quota: u64 },
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &CyclerConfig) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let campaign = &config.campaign;

    if campaign.quota == 0 {
        errors.push(ValidationError::ZeroQuota);
    }

    match parse_eth(&campaign.amount_eth) {
        Ok(amount) if amount.is_zero() => {
            errors.push(ValidationError::InvalidAmount("must be greater than zero".to_string()));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::InvalidAmount(e.to_string())),
    }

    for (kind, fees) in [("deposit", &config.deposit), ("withdraw", &config.withdraw)] {
        if let Err(e) = FeePolicy::from_config(fees) {
            errors.push(ValidationError::InvalidFee {
                kind,
                reason: e.to_string(),
            });
        }
    }

    for url in std::iter::once(&config.chain.rpc_url).chain(&config.chain.failover_urls) {
        if let Err(e) = url.parse::<url::Url>() {
            errors.push(ValidationError::InvalidRpcUrl {
                url: url.clone(),
                reason: e.to_string(),
            });
        }
    }

    for (name, value) in [
        ("chain.rpc_timeout_secs", config.chain.rpc_timeout_secs),
        ("chain.receipt_timeout_secs", config.chain.receipt_timeout_secs),
        ("chain.receipt_poll_ms", config.chain.receipt_poll_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroDuration(name));
        }
    }

    if campaign.checkpoint_path.trim().is_empty() {
        errors.push(ValidationError::EmptyCheckpointPath);
    }

    if config.observability.metrics_enabled && config.observability.metrics_listen_addr().is_none() {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let caps = campaign.deposit_cap.saturating_add(campaign.withdraw_cap);
    if caps < campaign.quota {
        warnings.push(ValidationWarning::CapsBelowQuota {
            caps,
            quota: campaign.quota,
        });
    } else if caps > campaign.quota {
        warnings.push(ValidationWarning::CapsExceedQuota {
            caps,
            quota: campaign.quota,
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::FeeConfig;

    #[test]
    fn test_defaults_are_clean() {
        let warnings = validate_config(&CyclerConfig::default()).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_caps_below_quota_warns() {
        let mut config = CyclerConfig::default();
        config.campaign.deposit_cap = 50;

        let warnings = validate_config(&config).unwrap();
        assert_eq!(
            warnings,
            vec![ValidationWarning::CapsBelowQuota { caps: 105, quota: 110 }]
        );
        assert!(warnings[0].to_string().contains("stall"));
    }

    #[test]
    fn test_caps_above_quota_warns() {
        let mut config = CyclerConfig::default();
        config.campaign.quota = 100;

        let warnings = validate_config(&config).unwrap();
        assert_eq!(
            warnings,
            vec![ValidationWarning::CapsExceedQuota { caps: 110, quota: 100 }]
        );
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = CyclerConfig::default();
        config.campaign.quota = 0;
        config.campaign.deposit_cap = 0;
        config.campaign.withdraw_cap = 0;
        config.campaign.amount_eth = "0".to_string();
        config.withdraw = FeeConfig {
            priority_fee_gwei: "fast".to_string(),
            max_fee_gwei: None,
        };
        config.chain.receipt_poll_ms = 0;
        config.chain.rpc_url = "nowhere".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::ZeroQuota));
        assert!(errors.contains(&ValidationError::ZeroDuration("chain.receipt_poll_ms")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidFee { kind: "withdraw", .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidAmount(_))));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidRpcUrl { .. })));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = CyclerConfig::default();
        config.observability.metrics_address = "localhost".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidMetricsAddress("localhost".to_string())]
        );
    }
}

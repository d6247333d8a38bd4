//! Fee and gas limit policy.
//!
//! Fees are EIP-1559 only. A policy either carries a flat max fee or derives
//! it from the latest base fee at submission time:
//!
//! ```text
//! max_fee = configured flat rate            (max_fee_gwei set)
//! max_fee = latest base fee + priority fee  (max_fee_gwei unset)
//! ```
//!
//! This is a fixed-fee strategy for quiet test networks, not a fee market model.

use alloy::primitives::utils::{parse_ether, parse_units};
use alloy::primitives::U256;
use std::fmt;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::schema::FeeConfig;

/// Parse a decimal gwei string into wei.
pub fn parse_gwei(value: &str) -> BlockchainResult<u128> {
    let wei = parse_non_negative(value, |v| {
        parse_units(v, "gwei").map(|units| units.get_absolute())
    })?;
    u128::try_from(wei).map_err(|_| BlockchainError::InvalidAmount {
        value: value.to_string(),
        reason: "does not fit in 128 bits".to_string(),
    })
}

/// Parse a decimal ether string into wei.
pub fn parse_eth(value: &str) -> BlockchainResult<U256> {
    parse_non_negative(value, parse_ether)
}

fn parse_non_negative<E: fmt::Display>(
    value: &str,
    parse: impl FnOnce(&str) -> Result<U256, E>,
) -> BlockchainResult<U256> {
    let trimmed = value.trim();
    if trimmed.starts_with('-') {
        return Err(BlockchainError::InvalidAmount {
            value: value.to_string(),
            reason: "must not be negative".to_string(),
        });
    }
    parse(trimmed).map_err(|e| BlockchainError::InvalidAmount {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Concrete fee parameters for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    /// Maximum total fee per gas in wei.
    pub max_fee_per_gas: u128,
    /// Maximum priority fee per gas in wei.
    pub max_priority_fee_per_gas: u128,
}

impl fmt::Display for FeeQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max_fee={} wei, priority_fee={} wei",
            self.max_fee_per_gas, self.max_priority_fee_per_gas
        )
    }
}

/// Fee policy for one transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    priority_fee_per_gas: u128,
    max_fee_per_gas: Option<u128>,
}

impl FeePolicy {
    /// Policy with a flat max fee, or base-fee-derived when `max_fee_per_gas` is `None`.
    pub fn new(priority_fee_per_gas: u128, max_fee_per_gas: Option<u128>) -> BlockchainResult<Self> {
        if let Some(max_fee) = max_fee_per_gas {
            if max_fee < priority_fee_per_gas {
                return Err(BlockchainError::MaxFeeBelowPriority {
                    max_fee,
                    priority_fee: priority_fee_per_gas,
                });
            }
        }
        Ok(Self {
            priority_fee_per_gas,
            max_fee_per_gas,
        })
    }

    /// Build a policy from gwei settings.
    pub fn from_config(config: &FeeConfig) -> BlockchainResult<Self> {
        let priority = parse_gwei(&config.priority_fee_gwei)?;
        let max = config.max_fee_gwei.as_deref().map(parse_gwei).transpose()?;
        Self::new(priority, max)
    }

    /// Whether [`quote`](Self::quote) needs the latest base fee.
    pub fn needs_base_fee(&self) -> bool {
        self.max_fee_per_gas.is_none()
    }

    /// Resolve the fee parameters for a transaction.
    pub fn quote(&self, base_fee_per_gas: Option<u128>) -> BlockchainResult<FeeQuote> {
        let max_fee_per_gas = match self.max_fee_per_gas {
            Some(flat) => flat,
            None => base_fee_per_gas
                .ok_or(BlockchainError::MissingBaseFee)?
                .saturating_add(self.priority_fee_per_gas),
        };
        Ok(FeeQuote {
            max_fee_per_gas,
            max_priority_fee_per_gas: self.priority_fee_per_gas,
        })
    }
}

/// Percentage margin applied on top of gas estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasMargin {
    percent: u64,
}

impl GasMargin {
    /// Default margin percentage.
    pub const DEFAULT_PERCENT: u64 = 20;

    pub const fn new(percent: u64) -> Self {
        Self { percent }
    }

    /// Apply the margin, rounding down.
    pub fn apply(&self, estimate: u64) -> u64 {
        let scaled = estimate as u128 * (100 + self.percent as u128) / 100;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }
}

impl Default for GasMargin {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERCENT)
    }
}

//! Submission seam between the driver loop and the chain.

use alloy::primitives::{TxHash, U256};
use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::blockchain::fees::parse_eth;
use crate::blockchain::{BlockchainResult, FeePolicy, GatewayBinding, TxBuilder, TxKind};
use crate::config::Settings;

/// Result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Included on-chain and not reverted.
    Confirmed { tx_hash: TxHash, elapsed: Duration },
    /// Nothing to count; the reason is for diagnostics only.
    Failed { reason: String },
}

impl SubmitOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, SubmitOutcome::Confirmed { .. })
    }
}

/// Submits one deposit or withdraw and waits for the outcome.
///
/// Implementations never return errors: every failure is folded into
/// [`SubmitOutcome::Failed`] so the driver only branches on the tag.
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    async fn submit(&self, kind: TxKind) -> SubmitOutcome;
}

/// Submitter backed by the gateway contract.
///
/// Built once at startup and held immutably for the life of the process.
#[derive(Debug, Clone)]
pub struct ChainSubmitter {
    tx: TxBuilder,
    binding: GatewayBinding,
    amount: U256,
    deposit_fees: FeePolicy,
    withdraw_fees: FeePolicy,
}

impl ChainSubmitter {
    pub fn new(
        tx: TxBuilder,
        binding: GatewayBinding,
        amount: U256,
        deposit_fees: FeePolicy,
        withdraw_fees: FeePolicy,
    ) -> Self {
        Self {
            tx,
            binding,
            amount,
            deposit_fees,
            withdraw_fees,
        }
    }

    /// Build from validated settings. The signing account is both the
    /// deposit beneficiary and the withdraw recipient.
    pub fn from_settings(settings: &Settings, tx: TxBuilder) -> BlockchainResult<Self> {
        let campaign = &settings.config.campaign;
        let binding = GatewayBinding::new(
            settings.gateway,
            settings.lending_pool,
            tx.address(),
            campaign.referral_code,
        );

        Ok(Self::new(
            tx,
            binding,
            parse_eth(&campaign.amount_eth)?,
            FeePolicy::from_config(&settings.config.deposit)?,
            FeePolicy::from_config(&settings.config.withdraw)?,
        ))
    }

    fn fees(&self, kind: TxKind) -> &FeePolicy {
        match kind {
            TxKind::Deposit => &self.deposit_fees,
            TxKind::Withdraw => &self.withdraw_fees,
        }
    }
}

#[async_trait]
impl TxSubmitter for ChainSubmitter {
    async fn submit(&self, kind: TxKind) -> SubmitOutcome {
        let started = Instant::now();
        let call = self.binding.call(kind, self.amount);

        match self.tx.send(&call, self.fees(kind)).await {
            Ok(tx_hash) => SubmitOutcome::Confirmed {
                tx_hash,
                elapsed: started.elapsed(),
            },
            Err(e) => SubmitOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

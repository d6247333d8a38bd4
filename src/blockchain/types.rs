//! Chain-specific types and error definitions.

use thiserror::Error;

pub use crate::config::schema::ChainConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Transaction was not confirmed within the receipt timeout.
    #[error("Transaction {tx_hash} not confirmed within {timeout_secs} seconds")]
    ConfirmationTimeout { tx_hash: String, timeout_secs: u64 },

    /// Transaction was reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Invalid private key format or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Gas estimation for the call failed (usually a would-be revert).
    #[error("Gas estimation failed: {0}")]
    GasEstimation(String),

    /// Malformed amount or fee setting.
    #[error("Invalid amount '{value}': {reason}")]
    InvalidAmount { value: String, reason: String },

    /// Max fee is lower than the priority fee.
    #[error("Max fee {max_fee} wei is below priority fee {priority_fee} wei")]
    MaxFeeBelowPriority { max_fee: u128, priority_fee: u128 },

    /// Base fee was required but the latest block does not carry one.
    #[error("Latest block has no base fee")]
    MissingBaseFee,

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction is confirmed with required block depth.
    Confirmed { block_number: u64 },
    /// Transaction was mined but reverted.
    Failed(String),
}

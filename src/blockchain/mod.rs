//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key, RPC URL, contract addresses)
//!     → wallet.rs (key loading, signing)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → contract.rs (gateway ABI, call encoding)
//!     → fees.rs (fee policy, gas margin)
//!     → transaction.rs (build, sign, broadcast, confirm)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod contract;
pub mod fees;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use contract::{ContractCall, GatewayBinding, TxKind};
pub use fees::{FeePolicy, FeeQuote, GasMargin};
pub use transaction::TxBuilder;
pub use types::{BlockchainError, BlockchainResult, ChainId};
pub use wallet::Wallet;

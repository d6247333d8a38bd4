//! Resumable deposit/withdraw cycler for an ETH lending-pool gateway.

pub mod blockchain;
pub mod checkpoint;
pub mod config;
pub mod cycler;
pub mod observability;

pub use checkpoint::{Checkpoint, CheckpointStore};
pub use config::{CyclerConfig, Settings};
pub use cycler::{ChainSubmitter, Driver, Limits};

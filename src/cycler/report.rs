//! Console status block printed after every confirmed transaction.

use alloy::primitives::TxHash;
use std::fmt;
use std::time::Duration;

use crate::blockchain::TxKind;
use crate::checkpoint::Checkpoint;

const RULE: &str = "==================================================";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub kind: TxKind,
    pub tx_hash: TxHash,
    pub elapsed: Duration,
    pub progress: Checkpoint,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RULE)?;
        writeln!(f, "{} ETH succeeded", self.kind)?;
        writeln!(f, "Transaction Hash: {}", self.tx_hash)?;
        writeln!(f, "Execution Time: {:.2} seconds", self.elapsed.as_secs_f64())?;
        writeln!(
            f,
            "Total Transactions: {} (Deposit: {}, Withdraw: {})",
            self.progress.total_count, self.progress.deposit_count, self.progress.withdraw_count
        )?;
        write!(f, "{}", RULE)
    }
}

//! Progress checkpoint persistence.
//!
//! # Data Flow
//! ```text
//! startup:   store.rs load() → Checkpoint (or zeros)
//! success:   driver bumps counters → store.rs save() (tmp file + rename)
//! quota hit: store.rs clear()
//! ```
//!
//! The file is the only resumption anchor across restarts. A read problem is
//! never an error for the caller: missing, corrupt or inconsistent data starts
//! the campaign from zero.

pub mod store;

pub use store::{CheckpointError, CheckpointStore};

use serde::{Deserialize, Serialize};

/// Persisted counters. `total_count == deposit_count + withdraw_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(rename = "deposit_counter")]
    pub deposit_count: u64,
    #[serde(rename = "withdraw_counter")]
    pub withdraw_count: u64,
    #[serde(rename = "total_tx")]
    pub total_count: u64,
}

impl Checkpoint {
    pub const fn new(deposit_count: u64, withdraw_count: u64, total_count: u64) -> Self {
        Self {
            deposit_count,
            withdraw_count,
            total_count,
        }
    }

    /// Whether the total matches the per-kind counters.
    pub fn is_consistent(&self) -> bool {
        self.deposit_count.checked_add(self.withdraw_count) == Some(self.total_count)
    }
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.deposit_count, self.withdraw_count, self.total_count
        )
    }
}

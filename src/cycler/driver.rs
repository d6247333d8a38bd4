//! Resumable deposit/withdraw loop.
//!
//! ```text
//!            ┌──────────────────────────── sleep(interval) ◀──┐
//!            ▼                                                │
//! load ─▶ deposit? ─▶ withdraw? ─▶ total >= quota? ── no ─────┘
//!                                        │ yes
//!                                        ▼
//!                                  clear checkpoint ─▶ Done
//! ```
//!
//! Each branch runs only while its own cap and the quota allow it. Counters
//! move only on a confirmed submission and every move is persisted before
//! the next attempt.

use std::time::Duration;
use tokio::time::sleep;

use crate::blockchain::TxKind;
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::CampaignConfig;
use crate::cycler::report::StatusReport;
use crate::cycler::submitter::{SubmitOutcome, TxSubmitter};
use crate::observability::metrics;

/// Quota and per-kind caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub quota: u64,
    pub deposit_cap: u64,
    pub withdraw_cap: u64,
}

impl Limits {
    /// Whether another `kind` transaction may be attempted from `state`.
    pub fn allows(&self, kind: TxKind, state: &Checkpoint) -> bool {
        if state.total_count >= self.quota {
            return false;
        }
        match kind {
            TxKind::Deposit => state.deposit_count < self.deposit_cap,
            TxKind::Withdraw => state.withdraw_count < self.withdraw_cap,
        }
    }

    pub fn is_complete(&self, state: &Checkpoint) -> bool {
        state.total_count >= self.quota
    }

    /// Both caps reached but the quota is not: no further progress possible.
    pub fn is_stalled(&self, state: &Checkpoint) -> bool {
        !self.is_complete(state)
            && !self.allows(TxKind::Deposit, state)
            && !self.allows(TxKind::Withdraw, state)
    }
}

impl From<&CampaignConfig> for Limits {
    fn from(campaign: &CampaignConfig) -> Self {
        Self {
            quota: campaign.quota,
            deposit_cap: campaign.deposit_cap,
            withdraw_cap: campaign.withdraw_cap,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::from(&CampaignConfig::default())
    }
}

/// Loop state after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Done,
}

/// One submission attempt within an iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub kind: TxKind,
    pub outcome: SubmitOutcome,
}

/// What a single iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iteration {
    pub attempts: Vec<Attempt>,
    pub state: LoopState,
}

/// The cycling loop.
pub struct Driver<S> {
    submitter: S,
    store: CheckpointStore,
    limits: Limits,
    interval: Duration,
    state: Checkpoint,
    stall_reported: bool,
}

impl<S: TxSubmitter> Driver<S> {
    /// Create a driver resuming from whatever the store holds.
    pub fn new(submitter: S, store: CheckpointStore, limits: Limits, interval: Duration) -> Self {
        let state = store.load();
        metrics::record_progress(state.deposit_count, state.withdraw_count, state.total_count);

        tracing::info!(
            checkpoint = %state,
            quota = limits.quota,
            deposit_cap = limits.deposit_cap,
            withdraw_cap = limits.withdraw_cap,
            "Driver ready"
        );

        Self {
            submitter,
            store,
            limits,
            interval,
            state,
            stall_reported: false,
        }
    }

    /// Current counters.
    pub fn state(&self) -> Checkpoint {
        self.state
    }

    /// Run until the quota is reached. Returns the final counters.
    pub async fn run(mut self) -> Checkpoint {
        loop {
            let iteration = self.step().await;
            if iteration.state == LoopState::Done {
                return self.state;
            }
            sleep(self.interval).await;
        }
    }

    /// One iteration: deposit if allowed, withdraw if allowed, then the quota check.
    ///
    /// Does not sleep; [`run`](Self::run) owns the pacing.
    pub async fn step(&mut self) -> Iteration {
        let mut attempts = Vec::new();

        for kind in [TxKind::Deposit, TxKind::Withdraw] {
            if self.limits.allows(kind, &self.state) {
                attempts.push(self.attempt(kind).await);
            }
        }

        if self.limits.is_complete(&self.state) {
            self.finish();
            return Iteration {
                attempts,
                state: LoopState::Done,
            };
        }

        if self.limits.is_stalled(&self.state) && !self.stall_reported {
            tracing::warn!(
                checkpoint = %self.state,
                quota = self.limits.quota,
                "Both caps reached below quota; no further transactions will be attempted"
            );
            self.stall_reported = true;
        }

        Iteration {
            attempts,
            state: LoopState::Running,
        }
    }

    async fn attempt(&mut self, kind: TxKind) -> Attempt {
        let outcome = self.submitter.submit(kind).await;

        match &outcome {
            SubmitOutcome::Confirmed { tx_hash, elapsed } => {
                match kind {
                    TxKind::Deposit => self.state.deposit_count += 1,
                    TxKind::Withdraw => self.state.withdraw_count += 1,
                }
                self.state.total_count += 1;

                metrics::record_submission(kind.as_str(), true, *elapsed);
                metrics::record_progress(
                    self.state.deposit_count,
                    self.state.withdraw_count,
                    self.state.total_count,
                );

                // In-memory counters stay authoritative; the next save rewrites the file
                if let Err(e) = self.store.save(&self.state) {
                    tracing::error!(error = %e, checkpoint = %self.state, "Failed to persist checkpoint");
                }

                let report = StatusReport {
                    kind,
                    tx_hash: *tx_hash,
                    elapsed: *elapsed,
                    progress: self.state,
                };
                println!("{}", report);
                tracing::info!(
                    kind = kind.as_str(),
                    tx_hash = %tx_hash,
                    elapsed_secs = elapsed.as_secs_f64(),
                    checkpoint = %self.state,
                    "Transaction confirmed"
                );
            }
            SubmitOutcome::Failed { reason } => {
                metrics::record_submission(kind.as_str(), false, Duration::ZERO);
                tracing::warn!(kind = kind.as_str(), "{} ETH error: {}", kind, reason);
            }
        }

        Attempt { kind, outcome }
    }

    fn finish(&mut self) {
        match self.store.clear() {
            Ok(true) => {
                println!("Status: Transaction status file deleted after reaching total transactions.");
                tracing::info!(path = %self.store.path().display(), "Checkpoint removed");
            }
            Ok(false) => tracing::debug!("No checkpoint to remove"),
            Err(e) => tracing::error!(error = %e, "Failed to remove checkpoint"),
        }
        tracing::info!(checkpoint = %self.state, "Quota reached");
    }
}

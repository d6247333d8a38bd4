//! Shared helpers for driver scenario tests.

use alloy::primitives::TxHash;
use async_trait::async_trait;
use pool_cycler::blockchain::TxKind;
use pool_cycler::checkpoint::CheckpointStore;
use pool_cycler::cycler::{SubmitOutcome, TxSubmitter};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Submitter that replays scripted outcomes and records every call.
///
/// Once the script runs out every call succeeds.
#[derive(Clone, Default)]
pub struct ScriptedSubmitter {
    script: Arc<Mutex<VecDeque<bool>>>,
    calls: Arc<Mutex<Vec<TxKind>>>,
    next_hash: Arc<AtomicU8>,
}

impl ScriptedSubmitter {
    /// Always confirms.
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// Replays `outcomes` (true = confirmed) in call order.
    pub fn scripted(outcomes: &[bool]) -> Self {
        let submitter = Self::default();
        submitter.script.lock().unwrap().extend(outcomes.iter().copied());
        submitter
    }

    /// Kinds submitted so far, in order.
    pub fn calls(&self) -> Vec<TxKind> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TxSubmitter for ScriptedSubmitter {
    async fn submit(&self, kind: TxKind) -> SubmitOutcome {
        self.calls.lock().unwrap().push(kind);
        let confirmed = self.script.lock().unwrap().pop_front().unwrap_or(true);

        if confirmed {
            let byte = self.next_hash.fetch_add(1, Ordering::SeqCst);
            SubmitOutcome::Confirmed {
                tx_hash: TxHash::repeat_byte(byte),
                elapsed: Duration::from_millis(10),
            }
        } else {
            SubmitOutcome::Failed {
                reason: "RPC error: connection refused".to_string(),
            }
        }
    }
}

/// Checkpoint store at a per-test scratch path, emptied first.
pub fn scratch_store(name: &str) -> CheckpointStore {
    let path: PathBuf = std::env::temp_dir().join(format!(
        "pool_cycler_it_{}_{}.json",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    CheckpointStore::new(path)
}

//! Transaction cycling subsystem.
//!
//! # Data Flow
//! ```text
//! checkpoint (load) → driver.rs (guards, counters)
//!     → submitter.rs (TxSubmitter seam; ChainSubmitter hits the gateway)
//!     → report.rs (status block) + checkpoint (save / clear)
//! ```

pub mod driver;
pub mod report;
pub mod submitter;

pub use driver::{Attempt, Driver, Iteration, Limits, LoopState};
pub use report::StatusReport;
pub use submitter::{ChainSubmitter, SubmitOutcome, TxSubmitter};

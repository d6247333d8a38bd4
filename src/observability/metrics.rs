//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pool_cycler_submissions_total` (counter): attempts by kind, outcome
//! - `pool_cycler_confirmation_seconds` (histogram): submit-to-receipt latency by kind
//! - `pool_cycler_progress` (gauge): persisted counters by name
//! - `pool_cycler_rpc_healthy` (gauge): 1=reachable, 0=unreachable
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one submission attempt.
pub fn record_submission(kind: &'static str, confirmed: bool, elapsed: Duration) {
    let outcome = if confirmed { "confirmed" } else { "failed" };
    counter!("pool_cycler_submissions_total", "kind" => kind, "outcome" => outcome).increment(1);
    if confirmed {
        histogram!("pool_cycler_confirmation_seconds", "kind" => kind).record(elapsed.as_secs_f64());
    }
}

/// Record the current counters.
pub fn record_progress(deposits: u64, withdrawals: u64, total: u64) {
    gauge!("pool_cycler_progress", "counter" => "deposit").set(deposits as f64);
    gauge!("pool_cycler_progress", "counter" => "withdraw").set(withdrawals as f64);
    gauge!("pool_cycler_progress", "counter" => "total").set(total as f64);
}

/// Record RPC reachability.
pub fn record_rpc_health(healthy: bool) {
    gauge!("pool_cycler_rpc_healthy").set(if healthy { 1.0 } else { 0.0 });
}

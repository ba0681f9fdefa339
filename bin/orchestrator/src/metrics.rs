//! Prometheus metrics for withdrawals.
//!
//! All metrics are aggregated in the [`Metrics`] struct. Without an installed
//! exporter the recording calls are no-ops.

use ::metrics::{counter, describe_counter, describe_histogram, histogram};
use alloy_primitives::{ChainId, U256};
use std::time::Duration;
use withdrawal::WithdrawalError;

/// Aggregated withdrawal metrics.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        describe_counter!(
            "withdrawals_total",
            "Total number of withdrawal runs started"
        );
        describe_counter!(
            "withdrawals_outcome_total",
            "Finished withdrawal runs by outcome and failed step"
        );
        describe_histogram!(
            "withdrawal_duration_seconds",
            "Duration of each withdrawal run in seconds"
        );
        describe_counter!(
            "withdrawal_amount_total",
            "Total amount withdrawn in token base units"
        );
    }

    /// Record the start of a run.
    pub fn record_started(&self, chain_id: ChainId) {
        counter!("withdrawals_total", "chain_id" => chain_id.to_string()).increment(1);
    }

    /// Record a completed withdrawal.
    pub fn record_success(&self, chain_id: ChainId, amount: U256, duration: Duration) {
        let chain = chain_id.to_string();

        counter!(
            "withdrawals_outcome_total",
            "chain_id" => chain.clone(),
            "outcome" => "success",
            "step" => "none"
        )
        .increment(1);
        // Saturates for amounts beyond u64.
        counter!("withdrawal_amount_total", "chain_id" => chain.clone())
            .increment(amount.saturating_to::<u64>());
        histogram!("withdrawal_duration_seconds", "chain_id" => chain)
            .record(duration.as_secs_f64());
    }

    /// Record a failed withdrawal, labelled by error kind.
    pub fn record_failure(&self, chain_id: ChainId, error: &WithdrawalError, duration: Duration) {
        let chain = chain_id.to_string();
        let step = error.step().map_or("none", |step| step.as_str());

        counter!(
            "withdrawals_outcome_total",
            "chain_id" => chain.clone(),
            "outcome" => error.kind(),
            "step" => step
        )
        .increment(1);
        histogram!("withdrawal_duration_seconds", "chain_id" => chain)
            .record(duration.as_secs_f64());
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}

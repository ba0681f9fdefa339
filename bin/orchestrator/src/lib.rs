pub mod config;
pub mod metrics;

use crate::{config::Config, metrics::Metrics};
use alloy_provider::DynProvider;
use capability::{BridgeAdapterClient, Erc20};
use client::ChainClient;
use confirm::{Cancellation, PollingConfirmer, RpcReceipts};
use std::time::{Duration, Instant};
use tracing::{error, info};
use withdrawal::{Account, Orchestrator, WithdrawalError, WithdrawalReceipt, WithdrawalRequest};

/// Orchestrator wired to a live RPC endpoint.
pub type LiveOrchestrator = Orchestrator<
    Erc20<DynProvider>,
    BridgeAdapterClient<DynProvider>,
    PollingConfirmer<RpcReceipts<DynProvider>>,
>;

/// Bind an orchestrator to a connected chain.
///
/// `timeout` replaces the configured confirmation timeout when set.
pub fn build_orchestrator(
    client: &ChainClient,
    config: &Config,
    timeout: Option<Duration>,
) -> LiveOrchestrator {
    let chain_id = client.chain_id();
    let mut policy = config.policy(chain_id);
    if let Some(timeout) = timeout {
        policy.timeout = timeout;
    }

    info!(
        chain_id,
        confirmations = policy.confirmations,
        poll_interval = ?policy.poll_interval,
        timeout = ?policy.timeout,
        "Confirmation policy"
    );

    let provider = client.provider().clone();
    Orchestrator::new(
        Account::new(chain_id, client.signer()),
        Erc20::new(provider.clone(), chain_id),
        BridgeAdapterClient::new(provider.clone(), chain_id),
        PollingConfirmer::new(RpcReceipts::new(provider, chain_id), policy),
    )
}

/// Execute a withdrawal and record its outcome.
pub async fn execute_withdrawal(
    orchestrator: &LiveOrchestrator,
    request: &WithdrawalRequest,
    cancel: &Cancellation,
    metrics: &Metrics,
) -> Result<WithdrawalReceipt, WithdrawalError> {
    let chain_id = request.chain_id();
    let started = Instant::now();
    metrics.record_started(chain_id);

    let result = orchestrator.execute(request, cancel).await;
    let elapsed = started.elapsed();

    match &result {
        Ok(_) => metrics.record_success(chain_id, request.amount(), elapsed),
        Err(e) => {
            error!(
                kind = e.kind(),
                step = e.step().map(|step| step.as_str()),
                approval_may_be_live = e.approval_may_be_live(),
                error = %e,
                "Withdrawal failed"
            );
            metrics.record_failure(chain_id, e, elapsed);
        }
    }

    result
}

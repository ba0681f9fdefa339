use alloy_primitives::{Address, Bytes, ChainId, U256};
use clap::{Parser, ValueEnum};
use client::{ChainClient, Environment};
use confirm::cancellation;
use orchestrator::{
    build_orchestrator,
    config::Config,
    execute_withdrawal,
    metrics::{install_prometheus_exporter, Metrics},
};
use std::{path::PathBuf, time::Duration};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use withdrawal::WithdrawalRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Withdraw an ERC20 balance from an L2 to L1 through a bridge adapter.
#[derive(Debug, Parser)]
#[command(name = "withdraw", version)]
struct Cli {
    /// Path to the chain configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Hex private key of the withdrawing account
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: String,

    /// L2 chain to withdraw from
    #[arg(long)]
    chain_id: ChainId,

    /// Bridge adapter contract on the L2
    #[arg(long, value_parser = parse_address)]
    adapter: Address,

    /// Token contract on the L2
    #[arg(long, value_parser = parse_address)]
    token: Address,

    /// Receiver on L1
    #[arg(long, value_parser = parse_address)]
    recipient: Address,

    /// Amount in token base units
    #[arg(long, value_parser = parse_amount)]
    amount: U256,

    /// Token contract on L1, if the adapter needs it
    #[arg(long, value_parser = parse_address, default_value_t = Address::ZERO)]
    remote_token: Address,

    /// Hex encoded adapter specific payload
    #[arg(long, value_parser = parse_bytes, default_value = "0x")]
    extension_data: Bytes,

    /// Only report balance and allowance, submit nothing
    #[arg(long)]
    dry_run: bool,

    /// Override the confirmation timeout
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Serve Prometheus metrics on this port
    #[arg(long)]
    metrics_port: Option<u16>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn parse_address(value: &str) -> Result<Address, String> {
    value.parse().map_err(|e| format!("invalid address: {}", e))
}

fn parse_amount(value: &str) -> Result<U256, String> {
    value.parse().map_err(|e| format!("invalid amount: {}", e))
}

fn parse_bytes(value: &str) -> Result<Bytes, String> {
    value.parse().map_err(|e| format!("invalid hex: {}", e))
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    if let Some(port) = cli.metrics_port {
        install_prometheus_exporter(port)?;
        info!(port, "Serving metrics");
    }
    let metrics = Metrics::new();

    info!(config = %cli.config.display(), "Loading config");
    let config = Config::from_file(&cli.config)?;
    let entry = config.chain(cli.chain_id)?;

    let signer = client::parse_signer(&cli.private_key)?;
    let mut env = Environment::new();
    env.insert(ChainClient::connect(entry.chain_id, &entry.rpc_url, signer).await?);

    let chain = env.chain(cli.chain_id)?;
    let orchestrator = build_orchestrator(
        chain,
        &config,
        cli.timeout_secs.map(Duration::from_secs),
    );

    let request = WithdrawalRequest::new(
        cli.chain_id,
        cli.adapter,
        cli.token,
        cli.recipient,
        cli.amount,
    )
    .with_remote_token(cli.remote_token)
    .with_extension_data(cli.extension_data);

    if cli.dry_run {
        let preflight = orchestrator.preflight(&request).await?;
        info!(
            balance = %preflight.balance,
            allowance = %preflight.allowance,
            requested = %preflight.requested,
            sufficient_balance = preflight.has_sufficient_balance(),
            approved = preflight.is_approved(),
            "Dry run, nothing submitted"
        );
        return Ok(());
    }

    let (handle, cancel) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl-C, cancelling withdrawal");
            handle.cancel();
        }
    });

    let receipt = execute_withdrawal(&orchestrator, &request, &cancel, &metrics).await?;

    info!(
        approval_tx = %receipt.approval.tx_hash,
        withdrawal_tx = %receipt.withdrawal.tx_hash,
        block_number = receipt.withdrawal.block_number,
        gas_used = receipt.withdrawal.gas_used,
        "Done"
    );

    Ok(())
}

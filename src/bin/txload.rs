//! CLI for the transaction load tool.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use clap::Parser;
use eyre::{Result, WrapErr};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use txload::config::parse_amount;
use txload::{
    AccountPool, DistributionConfig, Distributor, Engine, HttpLedger, LedgerClient, RunConfig,
    ScheduleMode,
};

/// Transaction load generator for dev/test chains.
#[derive(Debug, Parser)]
#[command(name = "txload", about = "Drive value transfers against a dev chain and measure TPS")]
struct Args {
    /// RPC node URL (overrides ETH_RPC_URL).
    #[arg(long, value_name = "URL")]
    rpc: Option<String>,

    /// Source account private key (overrides PRODUCER_PRIVATE_KEY).
    #[arg(long, value_name = "HEX")]
    key: Option<String>,

    /// Per-transfer value in ether.
    #[arg(long, value_name = "ETH")]
    transfer: Option<String>,

    /// Per-account funding value in ether.
    #[arg(long, value_name = "ETH")]
    distribution: Option<String>,

    /// Maximum concurrent submissions.
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Pool size; first half senders, second half receivers.
    #[arg(long, value_name = "N")]
    accounts: Option<usize>,

    /// Gas price in gwei.
    #[arg(long, value_name = "GWEI")]
    gas_price: Option<u128>,

    /// Account cache file.
    #[arg(long, value_name = "PATH", default_value = "test_accounts.json")]
    accounts_file: PathBuf,

    /// Generate a fresh account pool, replacing any cache.
    #[arg(long)]
    create: bool,

    /// Fund every pooled account from the source account.
    #[arg(long)]
    distribute: bool,

    /// Check pooled account balances.
    #[arg(long)]
    verify: bool,

    /// Run the TPS test for the given number of seconds.
    #[arg(long, value_name = "SECONDS")]
    test: Option<u64>,

    /// Use the cooperative single-threaded scheduler instead of the worker
    /// pool.
    #[arg(long)]
    cooperative: bool,

    /// Also print the final report as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    config.validate()?;

    let ledger: Arc<dyn LedgerClient> = Arc::new(HttpLedger::new(&config.rpc_url)?);
    let chain_id = ledger.chain_id().await.wrap_err("failed to reach the rpc node")?;
    tracing::info!(rpc = %config.rpc_url, chain_id, "connected");

    let pool = if args.create {
        let pool = AccountPool::create(config.pool_size);
        pool.persist(&config.accounts_path)?;
        tracing::info!(
            count = pool.len(),
            path = %config.accounts_path.display(),
            "account pool generated"
        );
        pool
    } else {
        AccountPool::load_or_create(&config.accounts_path, config.pool_size)?
    };

    let distributor = Distributor::new(
        ledger.clone(),
        DistributionConfig {
            amount: config.distribution_amount,
            gas_limit: config.gas_limit,
            gas_price: config.gas_price,
            batch_size: config.batch_size,
            receipt_timeout: config.receipt_timeout,
        },
    );

    if args.distribute {
        let source = config.source_account()?;
        let report = distributor.distribute(&source, pool.accounts()).await?;
        println!("distribution complete: funded={} failed={}", report.funded, report.failed);
    }

    if args.verify {
        // Ready means enough balance for at least ten transfers.
        let min_balance = config.transfer_amount * U256::from(10u64);
        let (ready, underfunded) = distributor.verify_funding(pool.accounts(), min_balance).await?;
        println!("balance check: ready={ready} underfunded={underfunded}");
    }

    if let Some(secs) = args.test {
        let run = RunConfig { duration: Duration::from_secs(secs), ..config };

        let shutdown = CancellationToken::new();
        let interrupt = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, finishing up");
                interrupt.cancel();
            }
        });

        let engine = Engine::new(ledger, run);
        let report = engine.run(&pool, shutdown).await?;

        println!("{report}");
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn build_config(args: &Args) -> Result<RunConfig> {
    let mut config = RunConfig::from_env()?;
    if let Some(rpc) = &args.rpc {
        config.rpc_url = rpc.clone();
    }
    if let Some(key) = &args.key {
        config.source_key = Some(key.clone());
    }
    if let Some(transfer) = &args.transfer {
        config.transfer_amount = parse_amount(transfer)?;
    }
    if let Some(distribution) = &args.distribution {
        config.distribution_amount = parse_amount(distribution)?;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(accounts) = args.accounts {
        config.pool_size = accounts;
    }
    if let Some(gwei) = args.gas_price {
        config.gas_price = gwei * 1_000_000_000;
    }
    config.accounts_path = args.accounts_file.clone();
    if args.cooperative {
        config.mode = ScheduleMode::Cooperative;
    }
    Ok(config)
}

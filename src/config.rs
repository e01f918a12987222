//! Run configuration.

use std::path::PathBuf;
use std::time::Duration;

use alloy_primitives::utils::parse_ether;
use alloy_primitives::{B256, U256};

use crate::accounts::Account;
use crate::error::{Error, Result};

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Scheduling model for the dispatch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleMode {
    /// Fixed pool of worker tasks pulling from a shared queue.
    #[default]
    Workers,
    /// Single task cooperatively multiplexing pending submissions.
    Cooperative,
}

/// Configuration for one load-test run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// RPC endpoint URL.
    pub rpc_url: String,
    /// Hex private key of the funded source account.
    pub source_key: Option<String>,
    /// Per-transfer value in wei.
    pub transfer_amount: U256,
    /// Per-account funding value in wei.
    pub distribution_amount: U256,
    /// Maximum concurrent submission units.
    pub concurrency: usize,
    /// Pool size; first half senders, second half receivers.
    pub pool_size: usize,
    /// Gas limit per transfer.
    pub gas_limit: u64,
    /// Fixed gas price in wei.
    pub gas_price: u128,
    /// Measurement window length.
    pub duration: Duration,
    /// Scheduling model.
    pub mode: ScheduleMode,
    /// Path of the account cache file.
    pub accounts_path: PathBuf,
    /// Accounts funded per distribution batch.
    pub batch_size: usize,
    /// Per-receipt wait bound during distribution.
    pub receipt_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            source_key: None,
            transfer_amount: parse_ether("0.001").expect("valid default amount"),
            distribution_amount: parse_ether("0.1").expect("valid default amount"),
            concurrency: 50,
            pool_size: 2000,
            gas_limit: 21_000,
            gas_price: 20 * WEI_PER_GWEI,
            duration: Duration::from_secs(60),
            mode: ScheduleMode::Workers,
            accounts_path: PathBuf::from("test_accounts.json"),
            batch_size: 100,
            receipt_timeout: Duration::from_secs(120),
        }
    }
}

impl RunConfig {
    /// Loads configuration from environment variables, keeping defaults for
    /// anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("ETH_RPC_URL") {
            config.rpc_url = url;
        }
        if let Ok(key) = std::env::var("PRODUCER_PRIVATE_KEY") {
            if !key.is_empty() {
                config.source_key = Some(key);
            }
        }
        if let Ok(amount) = std::env::var("TRANSFER_AMOUNT") {
            config.transfer_amount = parse_amount(&amount)?;
        }
        if let Ok(amount) = std::env::var("DISTRIBUTION_AMOUNT") {
            config.distribution_amount = parse_amount(&amount)?;
        }
        if let Ok(concurrency) = std::env::var("CONCURRENCY") {
            config.concurrency = concurrency
                .parse()
                .map_err(|err| Error::Config(format!("bad CONCURRENCY: {err}")))?;
        }
        if let Ok(gwei) = std::env::var("GAS_PRICE_GWEI") {
            let gwei: u128 =
                gwei.parse().map_err(|err| Error::Config(format!("bad GAS_PRICE_GWEI: {err}")))?;
            config.gas_price = gwei * WEI_PER_GWEI;
        }
        Ok(config)
    }

    /// Sets the maximum concurrent submission units.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the pool size.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Sets the measurement window length.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the scheduling model.
    pub fn with_mode(mut self, mode: ScheduleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the per-transfer value in wei.
    pub fn with_transfer_amount(mut self, amount: U256) -> Self {
        self.transfer_amount = amount;
        self
    }

    /// Sets the per-account funding value in wei.
    pub fn with_distribution_amount(mut self, amount: U256) -> Self {
        self.distribution_amount = amount;
        self
    }

    /// Sets the distribution batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the per-receipt wait bound.
    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    /// Checks invariants that must hold before any on-chain action.
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            return Err(Error::Config("rpc url is required".into()));
        }
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".into()));
        }
        if self.pool_size < 2 || self.pool_size % 2 != 0 {
            return Err(Error::Config("pool size must be an even number of at least 2".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch size must be at least 1".into()));
        }
        Ok(())
    }

    /// Parses the configured source key into an account.
    pub fn source_account(&self) -> Result<Account> {
        let key = self
            .source_key
            .as_deref()
            .ok_or_else(|| Error::Config("source private key is required".into()))?;
        let bytes: B256 =
            key.parse().map_err(|err| Error::Config(format!("bad source key: {err}")))?;
        Account::try_from_private_key(bytes)
    }
}

/// Parses an ether-denominated decimal string into wei.
pub fn parse_amount(value: &str) -> Result<U256> {
    parse_ether(value).map_err(|err| Error::Config(format!("bad amount {value:?}: {err}")))
}

//! Transaction load generator and TPS measurement for dev/test chains.
//!
//! `txload` funds a pool of throwaway accounts from one source account, then
//! drives value transfers between the pool halves for a fixed duration under
//! bounded concurrency, and reports sustained throughput.
//!
//! The pieces compose in dependency order: [`AccountPool`] carves senders and
//! receivers out of a generated key set, [`NonceTracker`] hands out
//! per-sender nonces, [`Distributor`] funds the pool in bounded batches, and
//! [`Engine`] runs the measurement loop against a [`LedgerClient`], feeding
//! [`Stats`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use txload::{AccountPool, Engine, HttpLedger, RunConfig};
//!
//! let config = RunConfig::from_env()?;
//! let ledger = Arc::new(HttpLedger::new(&config.rpc_url)?);
//! let pool = AccountPool::load_or_create(&config.accounts_path, config.pool_size)?;
//!
//! let engine = Engine::new(ledger, config);
//! let report = engine.run(&pool, CancellationToken::new()).await?;
//! println!("{report}");
//! ```

#![warn(missing_docs)]

pub mod accounts;
pub mod config;
pub mod dispatch;
pub mod distributor;
pub mod error;
pub mod ledger;
pub mod nonce;
pub mod stats;

pub use accounts::{Account, AccountPool};
pub use config::{RunConfig, ScheduleMode};
pub use dispatch::Engine;
pub use distributor::{DistributionConfig, DistributionReport, Distributor};
pub use error::Error;
pub use ledger::{HttpLedger, LedgerClient, ReceiptStatus, TransferRequest, TxId};
pub use nonce::NonceTracker;
pub use stats::{Report, Stats};

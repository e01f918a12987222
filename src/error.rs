//! Error types for the load tool.

use alloy_primitives::{B256, U256};
use thiserror::Error;

/// Errors produced by the load tool.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is missing or malformed. Fatal before any state mutation.
    #[error("config error: {0}")]
    Config(String),

    /// Cached account set does not match the configured pool size.
    ///
    /// Recoverable: callers treat this as "no valid cache" and regenerate.
    #[error("account cache size mismatch: expected {expected}, found {found}")]
    SizeMismatch {
        /// Configured pool size.
        expected: usize,
        /// Number of records found in the cache.
        found: usize,
    },

    /// Source account cannot cover the distribution value plus gas.
    #[error("insufficient funds: {required} wei required, source holds {available}")]
    InsufficientFunds {
        /// Total wei the distribution would consume.
        required: U256,
        /// Source balance at check time.
        available: U256,
    },

    /// The node rejected a transaction submission.
    ///
    /// Recorded as a failure and never retried; retrying would need a fresh
    /// nonce and risks double-spend races.
    #[error("submission rejected: {0}")]
    Submission(String),

    /// No receipt observed within the per-receipt timeout.
    #[error("no receipt for {tx} within {timeout_secs}s")]
    ReceiptTimeout {
        /// Transaction still awaiting its receipt.
        tx: B256,
        /// Wait bound that elapsed.
        timeout_secs: u64,
    },

    /// The run was interrupted by the user.
    #[error("cancelled")]
    Cancelled,

    /// RPC transport failure outside the per-transaction path.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// Account cache I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Account cache encoding failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Shared mock ledger for integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use tokio::time::sleep;
use txload::error::{Error, Result};
use txload::ledger::{LedgerClient, ReceiptStatus, TransferRequest, TxId};

/// How the mock answers receipt waits.
#[derive(Debug, Clone, Copy, Default)]
#[allow(dead_code)] // not every test binary uses every mode
pub enum ReceiptMode {
    /// Every receipt confirms successfully.
    #[default]
    Success,
    /// Every receipt reports an unsuccessful transaction.
    Unsuccessful,
    /// No receipt ever arrives; waits run into their timeout.
    Timeout,
}

/// Mock [`LedgerClient`] with deterministic latency and failure injection.
#[derive(Debug)]
pub struct MockLedger {
    latency: Duration,
    fail_every: Option<u64>,
    balance: U256,
    receipt_mode: ReceiptMode,
    submissions: AtomicU64,
    nonces: Mutex<HashMap<Address, Vec<u64>>>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            fail_every: None,
            balance: U256::MAX,
            receipt_mode: ReceiptMode::Success,
            submissions: AtomicU64::new(0),
            nonces: Mutex::new(HashMap::new()),
        }
    }
}

#[allow(dead_code)] // not every test binary uses every knob
impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Artificial latency applied to every submission.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Rejects every n-th submission with a submission error.
    pub fn with_fail_every(mut self, n: u64) -> Self {
        self.fail_every = Some(n);
        self
    }

    /// Balance reported for every address.
    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    /// Receipt behavior for `wait_for_receipt`.
    pub fn with_receipt_mode(mut self, mode: ReceiptMode) -> Self {
        self.receipt_mode = mode;
        self
    }

    /// Submission attempts observed so far (accepted and rejected).
    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Nonces observed for `address`, in arrival order.
    pub fn nonces_for(&self, address: Address) -> Vec<u64> {
        self.nonces.lock().unwrap().get(&address).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn chain_id(&self) -> Result<u64> {
        Ok(1337)
    }

    async fn get_nonce(&self, _address: Address) -> Result<u64> {
        Ok(0)
    }

    async fn get_balance(&self, _address: Address) -> Result<U256> {
        Ok(self.balance)
    }

    async fn submit(&self, request: TransferRequest) -> Result<TxId> {
        let n = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }

        self.nonces
            .lock()
            .unwrap()
            .entry(request.sender.address)
            .or_default()
            .push(request.nonce);

        if let Some(every) = self.fail_every {
            if n % every == 0 {
                return Err(Error::Submission(format!("injected rejection #{n}")));
            }
        }

        Ok(B256::from(U256::from(n)))
    }

    async fn wait_for_receipt(&self, tx: TxId, timeout: Duration) -> Result<ReceiptStatus> {
        match self.receipt_mode {
            ReceiptMode::Success => Ok(ReceiptStatus::Success),
            ReceiptMode::Unsuccessful => Ok(ReceiptStatus::Failed),
            ReceiptMode::Timeout => {
                sleep(timeout).await;
                Err(Error::ReceiptTimeout { tx, timeout_secs: timeout.as_secs() })
            }
        }
    }
}

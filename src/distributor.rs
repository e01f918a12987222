//! Batched balance distribution from the source account to the pool.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;

use crate::accounts::Account;
use crate::error::{Error, Result};
use crate::ledger::{LedgerClient, ReceiptStatus, TransferRequest};
use crate::nonce::NonceTracker;

/// Aggregate outcome of one distribution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistributionReport {
    /// Accounts whose funding transfer confirmed successfully.
    pub funded: u64,
    /// Transfers that failed to submit, did not succeed, or timed out.
    pub failed: u64,
}

/// Funding parameters for the distributor.
#[derive(Debug, Clone)]
pub struct DistributionConfig {
    /// Value transferred to each pooled account, in wei.
    pub amount: U256,
    /// Gas limit per funding transfer.
    pub gas_limit: u64,
    /// Fixed gas price in wei.
    pub gas_price: u128,
    /// Transfers submitted per batch before waiting for receipts.
    pub batch_size: usize,
    /// Wait bound per receipt.
    pub receipt_timeout: Duration,
}

/// Funds every pooled account from a single source account.
///
/// Work proceeds in fixed-size batches: all transfers of a batch are
/// submitted first, then every batch receipt is awaited before the next
/// batch starts. This keeps the source's unconfirmed nonce window small
/// enough that node-side queuing limits cannot invalidate it.
pub struct Distributor {
    ledger: Arc<dyn LedgerClient>,
    config: DistributionConfig,
}

impl Distributor {
    /// Creates a distributor over the given ledger.
    pub fn new(ledger: Arc<dyn LedgerClient>, config: DistributionConfig) -> Self {
        Self { ledger, config }
    }

    /// Transfers the configured amount to every target account.
    ///
    /// Fails fast with [`Error::InsufficientFunds`] before sending anything
    /// when the source cannot cover value plus gas for the whole set.
    /// Individual submission failures, unsuccessful receipts, and receipt
    /// timeouts are counted and skipped rather than aborting: partial
    /// funding is recoverable, the affected accounts simply drop out of the
    /// later measurement.
    pub async fn distribute(
        &self,
        source: &Account,
        targets: &[Account],
    ) -> Result<DistributionReport> {
        let available = self.ledger.get_balance(source.address).await?;
        let per_account = self.config.amount
            + U256::from(self.config.gas_price) * U256::from(self.config.gas_limit);
        let required = per_account * U256::from(targets.len());
        if available < required {
            return Err(Error::InsufficientFunds { required, available });
        }

        let chain_id = self.ledger.chain_id().await?;
        let mut tracker = NonceTracker::new();
        tracker.seed(source.address, self.ledger.get_nonce(source.address).await?);

        tracing::info!(
            targets = targets.len(),
            batch_size = self.config.batch_size,
            "starting balance distribution"
        );

        let mut report = DistributionReport::default();

        for (batch_index, batch) in targets.chunks(self.config.batch_size).enumerate() {
            let mut pending = Vec::with_capacity(batch.len());

            for target in batch {
                // One increment per attempt, failed submissions included:
                // the source's nonce sequence must stay gapless.
                let nonce = tracker
                    .next(&source.address)
                    .expect("source nonce seeded before the first batch");
                let request = TransferRequest {
                    sender: *source,
                    receiver: target.address,
                    amount: self.config.amount,
                    gas_limit: self.config.gas_limit,
                    gas_price: self.config.gas_price,
                    nonce,
                    chain_id,
                };
                match self.ledger.submit(request).await {
                    Ok(tx) => pending.push(tx),
                    Err(err) => {
                        tracing::warn!(%err, receiver = %target.address, "funding submission failed");
                        report.failed += 1;
                    }
                }
            }

            for tx in pending {
                match self.ledger.wait_for_receipt(tx, self.config.receipt_timeout).await {
                    Ok(ReceiptStatus::Success) => report.funded += 1,
                    Ok(ReceiptStatus::Failed) => {
                        tracing::warn!(%tx, "funding transfer did not succeed");
                        report.failed += 1;
                    }
                    Err(err) => {
                        tracing::warn!(%err, %tx, "funding receipt not observed");
                        report.failed += 1;
                    }
                }
            }

            tracing::info!(
                batch = batch_index + 1,
                funded = report.funded,
                failed = report.failed,
                "distribution batch settled"
            );
        }

        if report.failed > 0 {
            tracing::warn!(
                failed = report.failed,
                "some accounts were not funded and will drop out of the measurement"
            );
        }

        Ok(report)
    }

    /// Counts targets holding at least `min_balance`, as `(ready, underfunded)`.
    pub async fn verify_funding(
        &self,
        targets: &[Account],
        min_balance: U256,
    ) -> Result<(usize, usize)> {
        let mut ready = 0;
        let mut underfunded = 0;
        for (index, target) in targets.iter().enumerate() {
            if self.ledger.get_balance(target.address).await? >= min_balance {
                ready += 1;
            } else {
                underfunded += 1;
            }
            if (index + 1) % 500 == 0 {
                tracing::info!(checked = index + 1, total = targets.len(), "verifying balances");
            }
        }
        Ok((ready, underfunded))
    }
}

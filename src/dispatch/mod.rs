//! Dispatch engine: the bounded-concurrency transfer submission loop.

mod cooperative;
mod workers;

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::accounts::{Account, AccountPool};
use crate::config::{RunConfig, ScheduleMode};
use crate::error::{Error, Result};
use crate::ledger::{LedgerClient, TransferRequest, TxId};
use crate::nonce::NonceTracker;
use crate::stats::{Report, Stats};

use cooperative::Cooperative;
use workers::WorkerPool;

/// Executes submission units and yields their outcomes.
///
/// The engine owns the state machine; a backend only runs units. Nonces are
/// assigned before a unit reaches the backend, so per-sender ordering holds
/// no matter which executor runs it.
trait Backend {
    /// Hands one unit to the executor.
    async fn dispatch(&mut self, request: TransferRequest);

    /// Waits for the next resolved unit; `None` once every dispatched unit
    /// has been collected.
    async fn join_next(&mut self) -> Option<Result<TxId>>;

    /// Units dispatched but not yet collected.
    fn in_flight(&self) -> usize;
}

/// Bounded-concurrency dispatch engine.
///
/// Runs `SEEDING → RUNNING → DRAINING → DONE`: seed every sender's nonce
/// from the chain, submit transfers until the deadline under an admission
/// cap of `concurrency × 10` outstanding units (draining to `concurrency ×
/// 5` when the cap is hit), then collect everything still outstanding.
///
/// Submissions are fire-and-forget: success means the node accepted the
/// transaction into its local pool. The reported figure is offered-load
/// handling, not settlement throughput.
pub struct Engine {
    ledger: Arc<dyn LedgerClient>,
    config: RunConfig,
    stats: Arc<Stats>,
}

impl Engine {
    /// Creates an engine for one run. Statistics start at zero.
    pub fn new(ledger: Arc<dyn LedgerClient>, config: RunConfig) -> Self {
        Self { ledger, config, stats: Arc::new(Stats::new()) }
    }

    /// Shared handle to the live statistics.
    pub fn stats(&self) -> Arc<Stats> {
        self.stats.clone()
    }

    /// Runs the full cycle and reports.
    ///
    /// Cancellation interrupts `RUNNING` or `DRAINING` directly: in-flight
    /// work is abandoned, the measurement window freezes at the interruption
    /// instant, and the partial report is still returned.
    pub async fn run(&self, pool: &AccountPool, shutdown: CancellationToken) -> Result<Report> {
        let senders = pool.senders();
        let receivers = pool.receivers();
        if senders.is_empty() || receivers.is_empty() {
            return Err(Error::Config("account pool has no sender/receiver halves".into()));
        }

        let chain_id = self.ledger.chain_id().await?;
        let tracker = self.seed(senders).await?;

        tracing::info!(
            senders = senders.len(),
            receivers = receivers.len(),
            concurrency = self.config.concurrency,
            duration_secs = self.config.duration.as_secs(),
            mode = ?self.config.mode,
            "starting dispatch engine"
        );

        self.stats.start();
        let outcome = match self.config.mode {
            ScheduleMode::Workers => {
                let backend = WorkerPool::new(
                    self.ledger.clone(),
                    self.config.concurrency,
                    self.config.concurrency * 10,
                );
                self.drive(backend, &tracker, senders, receivers, chain_id, &shutdown).await
            }
            ScheduleMode::Cooperative => {
                let backend = Cooperative::new(self.ledger.clone());
                self.drive(backend, &tracker, senders, receivers, chain_id, &shutdown).await
            }
        };
        self.stats.finish();

        match outcome {
            Err(Error::Cancelled) => {
                tracing::warn!("run interrupted, reporting partial results");
            }
            other => other?,
        }

        Ok(self.stats.report())
    }

    /// `SEEDING`: queries the on-chain nonce of every sender once.
    async fn seed(&self, senders: &[Account]) -> Result<NonceTracker> {
        let mut tracker = NonceTracker::new();
        for (index, sender) in senders.iter().enumerate() {
            tracker.seed(sender.address, self.ledger.get_nonce(sender.address).await?);
            if (index + 1) % 200 == 0 {
                tracing::info!(seeded = index + 1, total = senders.len(), "seeding sender nonces");
            }
        }
        Ok(tracker)
    }

    /// `RUNNING` and `DRAINING` over an arbitrary backend.
    async fn drive<B: Backend>(
        &self,
        mut backend: B,
        tracker: &NonceTracker,
        senders: &[Account],
        receivers: &[Account],
        chain_id: u64,
        shutdown: &CancellationToken,
    ) -> Result<()> {
        let deadline = Instant::now() + self.config.duration;
        let cap = self.config.concurrency * 10;
        let drain_to = self.config.concurrency * 5;
        let mut index = 0usize;

        while Instant::now() < deadline {
            if shutdown.is_cancelled() {
                return Err(Error::Cancelled);
            }

            if backend.in_flight() >= cap {
                self.drain(&mut backend, drain_to, shutdown).await?;
                continue;
            }

            let sender = &senders[index % senders.len()];
            let receiver = &receivers[index % receivers.len()];
            index += 1;

            let nonce =
                tracker.next(&sender.address).expect("every sender is seeded before RUNNING");
            let request = TransferRequest {
                sender: *sender,
                receiver: receiver.address,
                amount: self.config.transfer_amount,
                gas_limit: self.config.gas_limit,
                gas_price: self.config.gas_price,
                nonce,
                chain_id,
            };

            // Counted at admission so live figures reflect submission rate.
            self.stats.record_submitted();
            backend.dispatch(request).await;

            let submitted = self.stats.submitted();
            if submitted % 100 == 0 {
                let elapsed = self.stats.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    submitted,
                    rate = submitted as f64 / elapsed,
                    remaining_secs =
                        deadline.saturating_duration_since(Instant::now()).as_secs(),
                    "dispatch progress"
                );
            }
        }

        // DRAINING: no new admissions, collect everything still outstanding.
        self.drain(&mut backend, 0, shutdown).await
    }

    /// Collects resolved units until the backlog is at most `target`.
    async fn drain<B: Backend>(
        &self,
        backend: &mut B,
        target: usize,
        shutdown: &CancellationToken,
    ) -> Result<()> {
        while backend.in_flight() > target {
            tokio::select! {
                _ = shutdown.cancelled() => return Err(Error::Cancelled),
                outcome = backend.join_next() => match outcome {
                    Some(Ok(tx)) => {
                        self.stats.record_succeeded();
                        tracing::trace!(%tx, "transfer accepted");
                    }
                    Some(Err(err)) => {
                        self.stats.record_failed();
                        tracing::debug!(%err, "transfer rejected");
                    }
                    None => break,
                },
            }
        }
        Ok(())
    }
}

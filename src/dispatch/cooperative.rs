//! Cooperative single-task backend.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::time::sleep;

use crate::error::Result;
use crate::ledger::{LedgerClient, TransferRequest, TxId};

use super::Backend;

/// Pacing delay after each admission, so a burst of admissions cannot starve
/// other runnable work on the thread.
const ADMISSION_PACE: Duration = Duration::from_millis(1);

/// Multiplexes many pending submissions on the caller's own task, with no
/// OS-level parallelism.
///
/// Pending work progresses whenever the engine awaits the set: admissions
/// batch up to the cap, then the set is polled until it drains to the low
/// watermark.
pub(super) struct Cooperative {
    ledger: Arc<dyn LedgerClient>,
    pending: FuturesUnordered<BoxFuture<'static, Result<TxId>>>,
}

impl Cooperative {
    pub(super) fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger, pending: FuturesUnordered::new() }
    }
}

impl Backend for Cooperative {
    async fn dispatch(&mut self, request: TransferRequest) {
        let ledger = self.ledger.clone();
        self.pending.push(async move { ledger.submit(request).await }.boxed());
        sleep(ADMISSION_PACE).await;
    }

    async fn join_next(&mut self) -> Option<Result<TxId>> {
        self.pending.next().await
    }

    fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

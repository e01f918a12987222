//! Parallel worker-pool backend.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::error::Result;
use crate::ledger::{LedgerClient, TransferRequest, TxId};

use super::Backend;

/// Fixed pool of worker tasks pulling submission units from one shared
/// bounded queue.
///
/// Dropping the pool aborts the workers, abandoning whatever is still in
/// flight; that is the cancellation path.
pub(super) struct WorkerPool {
    queue: mpsc::Sender<TransferRequest>,
    results: mpsc::Receiver<Result<TxId>>,
    in_flight: usize,
    _workers: JoinSet<()>,
}

impl WorkerPool {
    pub(super) fn new(
        ledger: Arc<dyn LedgerClient>,
        concurrency: usize,
        queue_depth: usize,
    ) -> Self {
        let (queue, requests) = mpsc::channel::<TransferRequest>(queue_depth.max(1));
        let requests = Arc::new(Mutex::new(requests));
        let (done, results) = mpsc::channel(queue_depth.max(1));

        let mut workers = JoinSet::new();
        for _ in 0..concurrency.max(1) {
            let requests = requests.clone();
            let done = done.clone();
            let ledger = ledger.clone();
            workers.spawn(async move {
                loop {
                    // The lock is held only while waiting for a unit, never
                    // across the submission itself.
                    let request = requests.lock().await.recv().await;
                    let Some(request) = request else { break };
                    let outcome = ledger.submit(request).await;
                    if done.send(outcome).await.is_err() {
                        break;
                    }
                }
            });
        }

        Self { queue, results, in_flight: 0, _workers: workers }
    }
}

impl Backend for WorkerPool {
    async fn dispatch(&mut self, request: TransferRequest) {
        // The queue is sized to the admission cap, so this does not block
        // the engine loop.
        if self.queue.send(request).await.is_ok() {
            self.in_flight += 1;
        }
    }

    async fn join_next(&mut self) -> Option<Result<TxId>> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.results.recv().await?;
        self.in_flight -= 1;
        Some(outcome)
    }

    fn in_flight(&self) -> usize {
        self.in_flight
    }
}

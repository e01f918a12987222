//! Atomic statistics collection and the throughput report.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Thread-safe statistics for one load-test run.
///
/// Counters start at zero and the measurement window is finalized exactly
/// once, so one instance measures exactly one run.
#[derive(Debug, Default)]
pub struct Stats {
    submitted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    started: OnceLock<Instant>,
    finished: OnceLock<Instant>,
}

impl Stats {
    /// Creates a zeroed stats collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of the measurement window. Idempotent.
    pub fn start(&self) {
        let _ = self.started.set(Instant::now());
    }

    /// Freezes the end of the measurement window.
    ///
    /// The first call wins: a cancellation instant is preserved over a later
    /// drain completion.
    pub fn finish(&self) {
        let _ = self.finished.set(Instant::now());
    }

    /// Records one admitted submission.
    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one transaction the node accepted.
    pub fn record_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one rejected or errored transaction.
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Total submissions admitted so far.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Submissions the node accepted.
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    /// Submissions that were rejected or errored.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Elapsed measurement time; still ticking while the run is live.
    pub fn elapsed(&self) -> Duration {
        let Some(started) = self.started.get() else { return Duration::ZERO };
        match self.finished.get() {
            Some(finished) => finished.saturating_duration_since(*started),
            None => started.elapsed(),
        }
    }

    /// Average accepted transactions per second.
    ///
    /// Returns 0.0 before any measurable time has elapsed; never divides by
    /// zero.
    pub fn tps(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs <= f64::EPSILON {
            return 0.0;
        }
        self.succeeded() as f64 / secs
    }

    /// Pure snapshot of the current counters.
    ///
    /// Has no effect on the counters, so it is safe to call mid-run for live
    /// progress.
    pub fn report(&self) -> Report {
        let total = self.submitted();
        let succeeded = self.succeeded();
        Report {
            total,
            succeeded,
            failed: self.failed(),
            duration_secs: self.elapsed().as_secs_f64(),
            tps: self.tps(),
            success_rate: if total == 0 { 0.0 } else { succeeded as f64 / total as f64 },
        }
    }
}

/// Final (or mid-run) throughput summary.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Submissions admitted into the run.
    pub total: u64,
    /// Submissions the node accepted.
    pub succeeded: u64,
    /// Submissions rejected or errored.
    pub failed: u64,
    /// Measurement window length in seconds.
    pub duration_secs: f64,
    /// Accepted transactions per second.
    pub tps: f64,
    /// `succeeded / total`, 0.0 for an empty run.
    pub success_rate: f64,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "TPS test results")?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "total submitted:   {}", self.total)?;
        writeln!(f, "succeeded:         {}", self.succeeded)?;
        writeln!(f, "failed:            {}", self.failed)?;
        writeln!(f, "duration:          {:.2}s", self.duration_secs)?;
        writeln!(f, "average TPS:       {:.2}", self.tps)?;
        writeln!(f, "success rate:      {:.2}%", self.success_rate * 100.0)?;
        write!(f, "{}", "=".repeat(60))
    }
}

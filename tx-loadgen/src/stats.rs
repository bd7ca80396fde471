//! Counters for a single load run.

use std::fmt;
use std::time::{Duration, Instant};

use crate::dispatch::Strategy;

/// Separator line framing the banner and the summary block.
pub const RULE: &str = "============================================================";

/// Success/failure tallies owned by the thread driving a run.
#[derive(Debug)]
pub struct RunStatistics {
    success: usize,
    failed: usize,
    started: Instant,
}

/// A point-in-time view printed while a run is in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub processed: usize,
    pub requested: usize,
    pub rate: f64,
    pub success: usize,
    pub failed: usize,
}

/// Final figures of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub strategy: Strategy,
    pub success: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl RunStatistics {
    /// Starts the clock.
    #[must_use]
    pub fn new() -> Self {
        RunStatistics {
            success: 0,
            failed: 0,
            started: Instant::now(),
        }
    }

    pub fn record_success(&mut self, transactions: usize) {
        self.success += transactions;
    }

    pub fn record_failure(&mut self, transactions: usize) {
        self.failed += transactions;
    }

    #[must_use]
    pub fn success(&self) -> usize {
        self.success
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    #[must_use]
    pub fn progress(&self, processed: usize, requested: usize) -> Progress {
        Progress {
            processed,
            requested,
            rate: per_second(processed, self.elapsed()),
            success: self.success,
            failed: self.failed,
        }
    }

    #[must_use]
    pub fn summary(&self, strategy: Strategy) -> RunSummary {
        RunSummary {
            strategy,
            success: self.success,
            failed: self.failed,
            duration: self.elapsed(),
        }
    }
}

impl RunSummary {
    /// Transactions actually generated and submitted.
    #[must_use]
    pub fn dispatched(&self) -> usize {
        self.success + self.failed
    }

    /// Percentage of dispatched transactions that were accepted.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        let dispatched = self.dispatched();
        if dispatched == 0 {
            return 0.0;
        }
        self.success as f64 / dispatched as f64 * 100.0
    }

    /// Dispatched transactions per second over the whole run.
    #[must_use]
    pub fn average_rate(&self) -> f64 {
        per_second(self.dispatched(), self.duration)
    }
}

#[allow(clippy::cast_precision_loss)]
fn per_second(transactions: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        transactions as f64 / secs
    } else {
        0.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Progress: {}/{} | Rate: {:.1} txn/sec | Success: {} | Failed: {}",
            self.processed, self.requested, self.rate, self.success, self.failed
        )
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "{} Test Results:", self.strategy.name())?;
        writeln!(f, "   Total Transactions: {}", self.strategy.requested())?;
        match self.strategy {
            Strategy::Concurrent { workers, .. } => writeln!(f, "   Workers: {workers}")?,
            Strategy::Batched { batch_size, .. } => {
                writeln!(f, "   Batch Size: {batch_size}")?;
                writeln!(f, "   Dispatched: {}", self.dispatched())?;
            }
            Strategy::Sequential { .. } => {}
        }
        writeln!(
            f,
            "   Successful: {} ({:.1}%)",
            self.success,
            self.success_rate()
        )?;
        writeln!(f, "   Failed: {}", self.failed)?;
        writeln!(f, "   Duration: {:.2} seconds", self.duration.as_secs_f64())?;
        writeln!(
            f,
            "   Average Rate: {:.1} transactions/second",
            self.average_rate()
        )?;
        write!(f, "{RULE}")
    }
}

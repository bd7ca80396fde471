//! The three ways of pushing generated transactions at the ingestion API.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use log::{error, info, warn};
use rayon::ThreadPoolBuilder;

use crate::client::{DispatchResult, Transport};
use crate::error::{DispatchError, LoadError};
use crate::generator::{generate, generate_batch};
use crate::stats::{Progress, RunStatistics, RunSummary, RULE};

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Single and concurrent runs report progress every this many transactions.
pub const PROGRESS_INTERVAL: usize = 100;
/// Batched runs report progress every this many batches.
pub const BATCH_PROGRESS_INTERVAL: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One request at a time, strictly in order.
    Sequential { count: usize },
    /// `count` independent requests spread over a pool of `workers` threads.
    Concurrent { count: usize, workers: usize },
    /// `total / batch_size` batch requests, one at a time.
    Batched { total: usize, batch_size: usize },
}

impl Strategy {
    #[must_use]
    pub fn sequential(count: usize) -> Self {
        Strategy::Sequential { count }
    }

    /// # Errors
    /// Errors when `workers` is zero
    pub fn concurrent(count: usize, workers: usize) -> Result<Self, LoadError> {
        check_workers(workers)?;
        Ok(Strategy::Concurrent { count, workers })
    }

    /// # Errors
    /// Errors when `batch_size` is zero
    pub fn batched(total: usize, batch_size: usize) -> Result<Self, LoadError> {
        check_batch_size(batch_size)?;
        Ok(Strategy::Batched { total, batch_size })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Sequential { .. } => "Sequential",
            Strategy::Concurrent { .. } => "Parallel",
            Strategy::Batched { .. } => "Batch",
        }
    }

    /// The number of transactions asked for, before any batch truncation.
    #[must_use]
    pub fn requested(&self) -> usize {
        match *self {
            Strategy::Sequential { count } | Strategy::Concurrent { count, .. } => count,
            Strategy::Batched { total, .. } => total,
        }
    }

    /// Runs the strategy to completion, handing each progress snapshot to `on_progress`.
    /// Failed submissions are counted, never fatal.
    ///
    /// # Errors
    /// Errors only on invalid parameters or when the worker pool cannot be created
    pub fn run(
        &self,
        transport: &Arc<dyn Transport>,
        on_progress: &mut dyn FnMut(Progress),
    ) -> Result<RunSummary, LoadError> {
        info!("Starting {} run of {} transactions", self.name(), self.requested());
        match *self {
            Strategy::Sequential { count } => {
                Ok(run_sequential(transport.as_ref(), count, on_progress))
            }
            Strategy::Concurrent { count, workers } => {
                run_concurrent(transport, count, workers, on_progress)
            }
            Strategy::Batched { total, batch_size } => {
                run_batched(transport.as_ref(), total, batch_size, on_progress)
            }
        }
    }
}

fn check_workers(workers: usize) -> Result<(), LoadError> {
    if workers == 0 {
        return Err(LoadError::InvalidConfig(
            "worker count must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn check_batch_size(batch_size: usize) -> Result<(), LoadError> {
    if batch_size == 0 {
        return Err(LoadError::InvalidConfig(
            "batch size must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Sends `count` transactions one at a time, reporting every [`PROGRESS_INTERVAL`].
#[must_use]
pub fn run_sequential(
    transport: &dyn Transport,
    count: usize,
    on_progress: &mut dyn FnMut(Progress),
) -> RunSummary {
    println!("\nStarting sequential load test: {count} transactions");
    println!("{RULE}");

    let mut stats = RunStatistics::new();
    for done in 1..=count {
        let transaction = generate();
        match transport.send_one(&transaction) {
            Ok(_) => stats.record_success(1),
            Err(e) => {
                stats.record_failure(1);
                warn!("Failed: {e}");
            }
        }
        if done % PROGRESS_INTERVAL == 0 {
            on_progress(stats.progress(done, count));
        }
    }
    stats.summary(Strategy::Sequential { count })
}

/// Fans `count` submissions out over a pool of `workers` threads.
///
/// Results are collected on the calling thread in submission order: task `i + 1` is not
/// looked at until task `i` has reported, even if it finished first. Progress snapshots
/// follow that same order.
///
/// # Errors
/// Errors when `workers` is zero or the pool cannot be built
pub fn run_concurrent(
    transport: &Arc<dyn Transport>,
    count: usize,
    workers: usize,
    on_progress: &mut dyn FnMut(Progress),
) -> Result<RunSummary, LoadError> {
    check_workers(workers)?;
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("tx-loadgen-worker-{i}"))
        .panic_handler(|_| error!("A worker panicked while submitting a transaction"))
        .build()?;

    println!("\nStarting parallel load test: {count} transactions with {workers} workers");
    println!("{RULE}");

    let mut stats = RunStatistics::new();
    let pending: Vec<Receiver<DispatchResult>> = (0..count)
        .map(|_| {
            let (sender, receiver) = mpsc::channel();
            let transport = Arc::clone(transport);
            pool.spawn(move || {
                let transaction = generate();
                // The receiver outlives every task, so this only fails if the driver is gone.
                sender.send(transport.send_one(&transaction)).ok();
            });
            receiver
        })
        .collect();

    for (i, receiver) in pending.into_iter().enumerate() {
        let result = receiver
            .recv()
            .unwrap_or_else(|_| Err(DispatchError::WorkerLost));
        match result {
            Ok(_) => stats.record_success(1),
            Err(e) => {
                stats.record_failure(1);
                warn!("Failed: {e}");
            }
        }
        let done = i + 1;
        if done % PROGRESS_INTERVAL == 0 {
            on_progress(stats.progress(done, count));
        }
    }
    Ok(stats.summary(Strategy::Concurrent { count, workers }))
}

/// Sends `total / batch_size` batches one after another.
///
/// A remainder that does not fill a whole batch is never generated or counted. A failed
/// batch counts every transaction in it as failed.
///
/// # Errors
/// Errors when `batch_size` is zero
pub fn run_batched(
    transport: &dyn Transport,
    total: usize,
    batch_size: usize,
    on_progress: &mut dyn FnMut(Progress),
) -> Result<RunSummary, LoadError> {
    check_batch_size(batch_size)?;
    let batches = total / batch_size;
    let remainder = total % batch_size;
    if remainder > 0 {
        warn!(
            "{remainder} of {total} transactions do not fill a batch of {batch_size} and will not be sent"
        );
    }

    println!("\nStarting batch load test: {total} transactions in {batches} batches");
    println!("{RULE}");

    let mut stats = RunStatistics::new();
    for batch in 1..=batches {
        let transactions = generate_batch(batch_size);
        match transport.send_batch(&transactions) {
            Ok(_) => stats.record_success(batch_size),
            Err(e) => {
                stats.record_failure(batch_size);
                warn!("Batch {batch} failed: {e}");
            }
        }
        if batch % BATCH_PROGRESS_INTERVAL == 0 {
            on_progress(stats.progress(batch * batch_size, total));
        }
    }
    Ok(stats.summary(Strategy::Batched { total, batch_size }))
}

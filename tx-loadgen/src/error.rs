use thiserror::Error;

use crate::transaction::TransactionType;

/// Errors that stop a run before (or instead of) dispatching anything.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Could not build the worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Transaction amounts must be positive")]
    InvalidAmount,
    #[error("A {0:?} transaction cannot carry that counterparty")]
    CounterpartyMismatch(TransactionType),
}

/// Why a single submission (one transaction or one batch) was not accepted.
///
/// The `Display` output is the human readable cause printed next to the failure.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Status {0}")]
    Status(u16),
    #[error("{0}")]
    Transport(reqwest::Error),
    #[error("Malformed response: {0}")]
    MalformedResponse(reqwest::Error),
    #[error("Worker exited without reporting a result")]
    WorkerLost,
}

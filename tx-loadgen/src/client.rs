use std::time::Duration;

use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use serde_json::Value;

use crate::error::{DispatchError, LoadError};
use crate::transaction::Transaction;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";
pub const DEFAULT_SINGLE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(30);

const TRANSACTIONS_PATH: &str = "api/v1/transactions";
const BATCH_PATH: &str = "api/v1/transactions/batch";
const HEALTH_PATH: &str = "api/v1/transactions/health";
const STATS_PATH: &str = "api/v1/transactions/stats";

const ACCEPTED_STATUSES: [StatusCode; 2] = [StatusCode::OK, StatusCode::ACCEPTED];

/// Whatever JSON the ingestion API answered with.
pub type Acknowledgement = Value;

/// Outcome of one submission attempt.
pub type DispatchResult = Result<Acknowledgement, DispatchError>;

/// Submits transactions to the ingestion API.
///
/// Implementations make exactly one attempt per call; failures are reported, never retried.
pub trait Transport: Send + Sync {
    /// # Errors
    /// Errors when the request fails or the API does not accept the transaction
    fn send_one(&self, transaction: &Transaction) -> DispatchResult;

    /// Sends all of `transactions` as one request, preserving their order.
    ///
    /// # Errors
    /// Errors when the request fails or the API does not accept the batch
    fn send_batch(&self, transactions: &[Transaction]) -> DispatchResult;
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the ingestion service, e.g. `http://localhost:8081`.
    pub base_url: String,
    /// Timeout for single-transaction requests and the auxiliary GET endpoints.
    pub single_timeout: Duration,
    /// Timeout for batch requests, which carry many records per call.
    pub batch_timeout: Duration,
    /// Honour the `HTTP_PROXY` family of environment variables.
    pub use_system_proxy: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            single_timeout: DEFAULT_SINGLE_TIMEOUT,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
            use_system_proxy: true,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_single_timeout(mut self, timeout: Duration) -> Self {
        self.single_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_system_proxy(mut self, enabled: bool) -> Self {
        self.use_system_proxy = enabled;
        self
    }
}

/// [`Transport`] over blocking HTTP.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
    single_url: Url,
    batch_url: Url,
    health_url: Url,
    stats_url: Url,
}

impl HttpTransport {
    /// # Errors
    /// Errors when `config.base_url` is not an absolute http(s) URL or the HTTP client
    /// cannot be built
    pub fn new(config: ClientConfig) -> Result<Self, LoadError> {
        let base = parse_base_url(&config.base_url)?;
        let endpoint = |path: &str| {
            base.join(path).map_err(|e| {
                LoadError::InvalidConfig(format!("cannot build endpoint {path} on {base}: {e}"))
            })
        };
        let single_url = endpoint(TRANSACTIONS_PATH)?;
        let batch_url = endpoint(BATCH_PATH)?;
        let health_url = endpoint(HEALTH_PATH)?;
        let stats_url = endpoint(STATS_PATH)?;

        let mut builder = Client::builder();
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(HttpTransport {
            client,
            config,
            single_url,
            batch_url,
            health_url,
            stats_url,
        })
    }

    /// The single-transaction ingestion endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.single_url
    }

    /// Queries the service's health endpoint.
    ///
    /// # Errors
    /// Errors when the service is unreachable, answers with a status other than 200/202,
    /// or the body is not JSON
    pub fn health(&self) -> DispatchResult {
        self.get(&self.health_url)
    }

    /// Fetches the service's ingestion statistics.
    ///
    /// # Errors
    /// Same conditions as [`HttpTransport::health`]
    pub fn server_stats(&self) -> DispatchResult {
        self.get(&self.stats_url)
    }

    fn get(&self, url: &Url) -> DispatchResult {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.config.single_timeout)
            .send()
            .map_err(DispatchError::Transport)?;
        acknowledge(url, response)
    }

    fn post<T>(&self, url: &Url, body: &T, timeout: Duration) -> DispatchResult
    where
        T: Serialize + ?Sized,
    {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .timeout(timeout)
            .send()
            .map_err(DispatchError::Transport)?;
        acknowledge(url, response)
    }
}

impl Transport for HttpTransport {
    fn send_one(&self, transaction: &Transaction) -> DispatchResult {
        self.post(&self.single_url, transaction, self.config.single_timeout)
    }

    fn send_batch(&self, transactions: &[Transaction]) -> DispatchResult {
        self.post(&self.batch_url, transactions, self.config.batch_timeout)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, LoadError> {
    let mut base = Url::parse(raw)
        .map_err(|e| LoadError::InvalidConfig(format!("invalid base URL {raw:?}: {e}")))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(LoadError::InvalidConfig(format!(
            "base URL {raw:?} must use http or https"
        )));
    }
    // Url::join replaces the last path segment unless the path ends with a slash.
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

fn acknowledge(url: &Url, response: Response) -> DispatchResult {
    let status = response.status();
    debug!("{url} answered {status}");
    if !ACCEPTED_STATUSES.contains(&status) {
        return Err(DispatchError::Status(status.as_u16()));
    }
    response.json().map_err(DispatchError::MalformedResponse)
}

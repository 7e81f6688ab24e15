use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use super::retry::{with_retry, RetryConfig};
use super::{DataHolder, FetchError, HolderBatch};

/// Path on every data holder that evaluates an aggregate query.
pub const AGGREGATE_PATH: &str = "/run/aggregate";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct AggregateBody<'a> {
    query: &'a Value,
    agg: &'a Value,
}

/// Build the aggregate endpoint URL for a holder base address.
pub fn aggregate_url(addr: &str) -> Result<Url, FetchError> {
    let base = Url::parse(addr).map_err(|e| FetchError::Address(format!("{}: {}", addr, e)))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(FetchError::Address(format!(
            "{}: unsupported scheme '{}'",
            addr,
            base.scheme()
        )));
    }
    if base.query().is_some() || base.fragment().is_some() {
        return Err(FetchError::Address(format!(
            "{}: query string and fragment are not allowed",
            addr
        )));
    }
    let path = format!("{}{}", base.path().trim_end_matches('/'), AGGREGATE_PATH);
    let mut url = base;
    url.set_path(&path);
    Ok(url)
}

/// HTTP client for data holders
pub struct HolderClient {
    client: Client,
    retry: RetryConfig,
}

impl HolderClient {
    /// Create a new client whose requests are bounded by `timeout`.
    /// Returns an error if the HTTP client fails to build (e.g., TLS configuration issues).
    pub fn new(timeout: Duration) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {}", e))?;
        Ok(Self {
            client,
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_once(
        &self,
        url: &Url,
        addr: &str,
        body: &AggregateBody<'_>,
    ) -> Result<HolderBatch, FetchError> {
        let to_fetch_error = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    addr: addr.to_string(),
                }
            } else {
                FetchError::Network(e.to_string())
            }
        };

        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(to_fetch_error)?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            // Try to get response body for better error diagnostics
            let resp_body = response
                .text()
                .await
                .unwrap_or_else(|_| "(failed to read body)".to_string());
            error!(
                addr,
                status,
                response_body = %resp_body,
                "data holder returned error status"
            );
            return Err(FetchError::Http {
                status,
                addr: addr.to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(to_fetch_error)?;
        serde_json::from_slice::<HolderBatch>(&bytes)
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl DataHolder for HolderClient {
    #[tracing::instrument(name = "holder_fetch", skip(self, query, agg))]
    async fn fetch(
        &self,
        addr: &str,
        query: &Value,
        agg: &Value,
    ) -> Result<HolderBatch, FetchError> {
        let url = aggregate_url(addr)?;
        let body = AggregateBody { query, agg };
        debug!(%url, "forwarding query to data holder");

        let batch = with_retry(&self.retry, || self.fetch_once(&url, addr, &body)).await?;

        debug!(records = batch.phone_data.len(), "data holder responded");
        Ok(batch)
    }
}

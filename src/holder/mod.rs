// src/holder/mod.rs
//! Data holder access: the outbound side of a query session.

pub mod client;
pub mod retry;

pub use client::{aggregate_url, HolderClient, AGGREGATE_PATH, DEFAULT_FETCH_TIMEOUT};
pub use retry::RetryConfig;

use serde::Deserialize;
use serde_json::Value;

use retry::IsRetryable;

/// One batch of matching records returned by a data holder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HolderBatch {
    pub phone_data: Vec<Value>,
    /// Present when the holder streams results; `Some(false)` means more
    /// batches would follow.
    #[serde(default)]
    pub end_of_stream: Option<bool>,
}

impl HolderBatch {
    pub fn new(phone_data: Vec<Value>) -> Self {
        Self {
            phone_data,
            end_of_stream: None,
        }
    }
}

/// Errors that can occur when fetching records from a data holder
#[derive(Debug)]
pub enum FetchError {
    Timeout { addr: String },
    Http { status: u16, addr: String },
    Network(String),
    Address(String),
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Timeout { addr } => write!(f, "request to {} timed out", addr),
            FetchError::Http { status, addr } => write!(f, "HTTP {} from {}", status, addr),
            FetchError::Network(msg) => write!(f, "network error: {}", msg),
            FetchError::Address(msg) => write!(f, "bad holder address: {}", msg),
            FetchError::Decode(msg) => write!(f, "decode error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout { .. } => true,
            FetchError::Http { status, .. } => matches!(status, 502..=504),
            FetchError::Network(_) => true,
            FetchError::Address(_) | FetchError::Decode(_) => false,
        }
    }
}

/// Capability for asking a data holder to evaluate a query locally and
/// return only the matching records (abstracts the HTTP client).
#[async_trait::async_trait]
pub trait DataHolder: Send + Sync {
    async fn fetch(&self, addr: &str, query: &Value, agg: &Value)
        -> Result<HolderBatch, FetchError>;
}

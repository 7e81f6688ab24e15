// src/aggregator/mod.rs
//! Aggregator endpoint: resolves a query type, asks one data holder for its
//! matching records, and folds the local statistic into a fresh session.

mod session;
mod state;

pub use session::{AggregationSession, SessionState};
pub use state::AggregationState;

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::AggregateError;
use crate::holder::{DataHolder, DEFAULT_FETCH_TIMEOUT};
use crate::query::QueryValue;
use crate::registry::QueryRegistry;
use crate::request::QueryRequest;

/// Handles `receive_query` calls. Holds no per-session state, so one
/// instance serves concurrent independent sessions.
pub struct Aggregator<H> {
    registry: Arc<QueryRegistry>,
    holder: H,
    holder_timeout: Duration,
    next_session: AtomicU64,
}

impl<H: DataHolder> Aggregator<H> {
    pub fn new(registry: Arc<QueryRegistry>, holder: H) -> Self {
        Self {
            registry,
            holder,
            holder_timeout: DEFAULT_FETCH_TIMEOUT,
            next_session: AtomicU64::new(1),
        }
    }

    /// Upper bound on the whole holder exchange, including any retries.
    pub fn with_holder_timeout(mut self, timeout: Duration) -> Self {
        self.holder_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &QueryRegistry {
        &self.registry
    }

    /// Validate a raw request body and aggregate it.
    pub async fn receive_query(&self, body: Value) -> Result<QueryValue, AggregateError> {
        let request = QueryRequest::from_json(body).inspect_err(|e| {
            warn!(error = %e, "rejected query request");
        })?;
        self.aggregate(&request).await
    }

    /// Run one session for an already validated request.
    pub async fn aggregate(&self, request: &QueryRequest) -> Result<QueryValue, AggregateError> {
        let tag = request.query.query_type();
        let query = self.registry.lookup(tag).inspect_err(|_| {
            warn!(query_type = tag, known = ?self.registry.tags(), "unknown query type");
        })?;

        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let mut session = AggregationSession::new(id, query);

        match session
            .collect(&self.holder, request, self.holder_timeout)
            .await
        {
            Ok(value) => {
                info!(session = id, query_type = tag, value, "aggregation complete");
                Ok(value)
            }
            Err(e) => {
                warn!(
                    session = id,
                    query_type = tag,
                    kind = e.kind(),
                    error = %e,
                    "aggregation failed"
                );
                Err(e)
            }
        }
    }
}

// src/aggregator/session.rs
use std::time::Duration;
use tracing::{debug, warn};

use super::state::AggregationState;
use crate::error::AggregateError;
use crate::holder::DataHolder;
use crate::query::{QueryType, QueryValue};
use crate::request::QueryRequest;

/// Lifecycle of a query session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Created,
    AwaitingHolderResponse,
    Aggregated,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Aggregated | SessionState::Failed)
    }
}

/// One in-flight query: owns its accumulator exclusively, so updates are
/// single-writer and nothing leaks between sessions.
#[derive(Debug)]
pub struct AggregationSession {
    id: u64,
    state: SessionState,
    aggregation: AggregationState,
}

impl AggregationSession {
    pub fn new(id: u64, query: Box<dyn QueryType>) -> Self {
        Self {
            id,
            state: SessionState::Created,
            aggregation: AggregationState::new(query),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn aggregation(&self) -> &AggregationState {
        &self.aggregation
    }

    /// Fetch the holder's matching records, fold their statistic, and return
    /// the running result. Holder failures leave the accumulator unchanged.
    #[tracing::instrument(
        name = "query_session",
        skip(self, holder, request),
        fields(
            session = self.id,
            query_type = %self.aggregation.query(),
            holder = %request.user_cloud_addr,
        )
    )]
    pub(crate) async fn collect<H: DataHolder + ?Sized>(
        &mut self,
        holder: &H,
        request: &QueryRequest,
        timeout: Duration,
    ) -> Result<QueryValue, AggregateError> {
        debug_assert_eq!(self.state, SessionState::Created);
        self.state = SessionState::AwaitingHolderResponse;

        let result = self.fetch_and_fold(holder, request, timeout).await;
        self.state = match &result {
            Ok(_) => SessionState::Aggregated,
            Err(_) => SessionState::Failed,
        };
        result
    }

    async fn fetch_and_fold<H: DataHolder + ?Sized>(
        &mut self,
        holder: &H,
        request: &QueryRequest,
        timeout: Duration,
    ) -> Result<QueryValue, AggregateError> {
        let addr = request.user_cloud_addr.as_str();
        let fetch = holder.fetch(addr, request.query.as_json(), &request.agg);

        let batch = match tokio::time::timeout(timeout, fetch).await {
            Ok(batch) => batch?,
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "data holder timed out");
                return Err(AggregateError::Timeout {
                    addr: addr.to_string(),
                });
            }
        };

        if batch.end_of_stream == Some(false) {
            warn!("holder signalled more batches; aggregating the first batch only");
        }

        let partial = self.aggregation.fold_batch(&batch.phone_data)?;
        debug!(
            records = batch.phone_data.len(),
            partial,
            result = self.aggregation.get_current_query_result(),
            "folded holder batch"
        );

        Ok(self.aggregation.get_current_query_result())
    }
}

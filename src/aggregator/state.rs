// src/aggregator/state.rs
//! Running result of one query session.

use serde_json::Value;
use std::fmt;

use crate::query::{InvalidRecord, QueryType, QueryValue};

/// Accumulator for a single session. The value changes only through
/// [`update_current_query_result`](AggregationState::update_current_query_result).
pub struct AggregationState {
    query: Box<dyn QueryType>,
    value: QueryValue,
    updates: u64,
}

impl AggregationState {
    pub fn new(query: Box<dyn QueryType>) -> Self {
        let value = query.identity();
        Self {
            query,
            value,
            updates: 0,
        }
    }

    pub fn query(&self) -> &dyn QueryType {
        self.query.as_ref()
    }

    /// Fold one partial result into the running value.
    pub fn update_current_query_result(&mut self, partial: QueryValue) {
        self.value = self.query.fold(self.value, partial);
        self.updates += 1;
    }

    pub fn get_current_query_result(&self) -> QueryValue {
        self.value
    }

    /// Number of partial results folded so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Run the query over one holder batch and fold its statistic.
    /// A rejected batch leaves the accumulator untouched.
    pub fn fold_batch(&mut self, records: &[Value]) -> Result<QueryValue, InvalidRecord> {
        let partial = self.query.run_query(records)?;
        self.update_current_query_result(partial);
        Ok(partial)
    }
}

impl fmt::Debug for AggregationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregationState")
            .field("query", &self.query.tag())
            .field("value", &self.value)
            .field("updates", &self.updates)
            .finish()
    }
}

// src/query/mod.rs
//! Query types: the statistics the aggregator computes over data holder records.

mod count;
mod sum;

pub use count::RecordCount;
pub use sum::Sum;

use serde_json::Value;
use std::fmt;

/// Scalar produced by a query and folded into a session's running result.
pub type QueryValue = u64;

/// A record returned by a data holder that a query type refuses to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecord {
    pub index: usize,
    pub reason: String,
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record {}: {}", self.index, self.reason)
    }
}

impl std::error::Error for InvalidRecord {}

/// Capability implemented by every statistic the aggregator can compute.
///
/// Implementations are stateless: the running value lives in
/// [`AggregationState`](crate::aggregator::AggregationState), which calls
/// [`fold`](QueryType::fold) for every partial result. `fold` must be
/// associative and commutative with [`identity`](QueryType::identity) as its
/// neutral element, so the order in which partial results arrive never
/// changes the final value.
pub trait QueryType: fmt::Display + Send + Sync {
    /// Stable tag used as the registry key and in request payloads.
    fn tag(&self) -> &'static str;

    /// Compute the local statistic for one batch of holder records.
    /// Must not skip records it cannot evaluate; the whole batch fails instead.
    fn run_query(&self, records: &[Value]) -> Result<QueryValue, InvalidRecord>;

    /// Value reported before any partial result has been folded.
    fn identity(&self) -> QueryValue {
        0
    }

    /// Combine a partial result into the running value.
    fn fold(&self, acc: QueryValue, partial: QueryValue) -> QueryValue {
        acc.saturating_add(partial)
    }
}

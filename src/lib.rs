// src/lib.rs
pub mod aggregator;
pub mod cli;
mod error;
pub mod holder;
pub mod native;
pub mod query;
pub mod registry;
mod request;

pub use aggregator::{AggregationSession, AggregationState, Aggregator, SessionState};
pub use error::AggregateError;
pub use holder::{DataHolder, FetchError, HolderBatch, HolderClient, RetryConfig};
pub use native::build_router;
pub use query::{QueryType, QueryValue};
pub use registry::QueryRegistry;
pub use request::{QueryDescriptor, QueryRequest};

// Re-export tracing for use in other modules
pub use tracing;

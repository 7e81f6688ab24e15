use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::aggregator::Aggregator;
use crate::error::AggregateError;
use crate::holder::DataHolder;
use crate::query::QueryValue;
use crate::request::QueryRequest;

/// Initialize tracing subscriber.
/// Uses RUST_LOG env var for filtering (defaults to info).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(true))
        .with(filter)
        .init();
}

/// Error payload returned for failed sessions.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl From<&AggregateError> for ErrorBody {
    fn from(err: &AggregateError) -> Self {
        Self {
            error: err.kind(),
            message: err.to_string(),
        }
    }
}

/// HTTP status reported for each failure kind.
pub fn status_for(err: &AggregateError) -> StatusCode {
    match err {
        AggregateError::BadRequest(_) | AggregateError::UnknownQueryType(_) => {
            StatusCode::BAD_REQUEST
        }
        AggregateError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        AggregateError::UnreachableHolder(_)
        | AggregateError::InvalidHolderResponse(_)
        | AggregateError::InvalidRecord(_) => StatusCode::BAD_GATEWAY,
    }
}

pub fn build_router<H: DataHolder + 'static>(aggregator: Arc<Aggregator<H>>) -> Router {
    Router::new()
        .route("/receive_query", post(handle_receive_query::<H>))
        .route("/health", get(|| async { "ok" }))
        .with_state(aggregator)
}

async fn handle_receive_query<H: DataHolder + 'static>(
    State(aggregator): State<Arc<Aggregator<H>>>,
    body: Bytes,
) -> Result<Json<QueryValue>, (StatusCode, Json<ErrorBody>)> {
    let request = QueryRequest::from_slice(&body).map_err(|e| {
        warn!(error = %e, "rejected query request");
        error_response(e)
    })?;

    aggregator
        .aggregate(&request)
        .await
        .map(Json)
        .map_err(error_response)
}

fn error_response(err: AggregateError) -> (StatusCode, Json<ErrorBody>) {
    (status_for(&err), Json(ErrorBody::from(&err)))
}

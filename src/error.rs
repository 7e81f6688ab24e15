// src/error.rs
use crate::holder::FetchError;
use crate::query::InvalidRecord;

/// Why a query session failed. Every variant is reported to the caller of
/// `receive_query`; none of them resolve to a zero statistic.
#[derive(Debug)]
pub enum AggregateError {
    BadRequest(String),
    UnknownQueryType(String),
    UnreachableHolder(String),
    Timeout { addr: String },
    InvalidHolderResponse(String),
    InvalidRecord(InvalidRecord),
}

impl AggregateError {
    /// Stable machine-readable name, used in error payloads and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AggregateError::BadRequest(_) => "bad_request",
            AggregateError::UnknownQueryType(_) => "unknown_query_type",
            AggregateError::UnreachableHolder(_) => "unreachable_holder",
            AggregateError::Timeout { .. } => "timeout",
            AggregateError::InvalidHolderResponse(_) => "invalid_holder_response",
            AggregateError::InvalidRecord(_) => "invalid_record",
        }
    }
}

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateError::BadRequest(e) => write!(f, "bad request: {}", e),
            AggregateError::UnknownQueryType(tag) => write!(f, "unknown query type: {}", tag),
            AggregateError::UnreachableHolder(e) => write!(f, "data holder unreachable: {}", e),
            AggregateError::Timeout { addr } => {
                write!(f, "timed out waiting for data holder at {}", addr)
            }
            AggregateError::InvalidHolderResponse(e) => {
                write!(f, "invalid data holder response: {}", e)
            }
            AggregateError::InvalidRecord(e) => write!(f, "invalid record: {}", e),
        }
    }
}

impl std::error::Error for AggregateError {}

impl From<InvalidRecord> for AggregateError {
    fn from(err: InvalidRecord) -> Self {
        AggregateError::InvalidRecord(err)
    }
}

impl From<FetchError> for AggregateError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout { addr } => AggregateError::Timeout { addr },
            FetchError::Decode(msg) => AggregateError::InvalidHolderResponse(msg),
            err @ (FetchError::Http { .. } | FetchError::Network(_) | FetchError::Address(_)) => {
                AggregateError::UnreachableHolder(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_map_to_aggregation_failures() {
        let timeout: AggregateError = FetchError::Timeout {
            addr: "http://holder1".into(),
        }
        .into();
        assert_eq!(timeout.kind(), "timeout");

        let refused: AggregateError = FetchError::Network("connection refused".into()).into();
        assert_eq!(refused.kind(), "unreachable_holder");
        assert!(refused.to_string().contains("connection refused"));

        let status: AggregateError = FetchError::Http {
            status: 503,
            addr: "http://holder1".into(),
        }
        .into();
        assert_eq!(status.kind(), "unreachable_holder");
        assert!(status.to_string().contains("503"));

        let decode: AggregateError = FetchError::Decode("missing phone_data".into()).into();
        assert_eq!(decode.kind(), "invalid_holder_response");
    }

    #[test]
    fn invalid_record_keeps_index() {
        let err: AggregateError = InvalidRecord {
            index: 4,
            reason: "expected a JSON object, got null".into(),
        }
        .into();
        assert_eq!(err.kind(), "invalid_record");
        assert!(err.to_string().contains("record 4"));
    }
}

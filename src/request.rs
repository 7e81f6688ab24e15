// src/request.rs
//! Inbound query request parsing and validation.

use serde_json::{Map, Value};

use crate::error::AggregateError;
use crate::holder::aggregate_url;

/// Query descriptor: a `query_type` tag plus query-specific parameters.
/// The whole object is forwarded to the data holder unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    query_type: String,
    raw: Value,
}

impl QueryDescriptor {
    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    pub fn as_json(&self) -> &Value {
        &self.raw
    }

    fn from_json(raw: Value) -> Result<Self, AggregateError> {
        let query_type = match raw.get("query_type") {
            Some(Value::String(tag)) if !tag.is_empty() => tag.clone(),
            Some(Value::String(_)) => return Err(bad_request("query.query_type is empty")),
            Some(_) => return Err(bad_request("query.query_type must be a string")),
            None => return Err(bad_request("missing field query.query_type")),
        };
        Ok(Self { query_type, raw })
    }
}

/// A validated request naming a data holder, a query, and an aggregation descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub user_cloud_addr: String,
    pub query: QueryDescriptor,
    /// Opaque to the aggregator; passed through to the holder.
    pub agg: Value,
}

impl QueryRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self, AggregateError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| bad_request(&format!("invalid JSON: {}", e)))?;
        Self::from_json(value)
    }

    pub fn from_json(value: Value) -> Result<Self, AggregateError> {
        let Value::Object(mut fields) = value else {
            return Err(bad_request("request body must be a JSON object"));
        };

        let user_cloud_addr = match take(&mut fields, "user_cloud_addr")? {
            Value::String(addr) => addr,
            _ => return Err(bad_request("user_cloud_addr must be a string")),
        };
        aggregate_url(&user_cloud_addr).map_err(|e| bad_request(&e.to_string()))?;

        let query = match take(&mut fields, "query")? {
            query @ Value::Object(_) => QueryDescriptor::from_json(query)?,
            _ => return Err(bad_request("query must be a JSON object")),
        };

        let agg = take(&mut fields, "agg")?;

        Ok(Self {
            user_cloud_addr,
            query,
            agg,
        })
    }
}

fn take(fields: &mut Map<String, Value>, name: &str) -> Result<Value, AggregateError> {
    match fields.remove(name) {
        Some(Value::Null) | None => Err(bad_request(&format!("missing field {}", name))),
        Some(value) => Ok(value),
    }
}

fn bad_request(msg: &str) -> AggregateError {
    AggregateError::BadRequest(msg.to_string())
}

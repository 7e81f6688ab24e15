// src/query/sum.rs
use serde_json::Value;
use std::fmt;

use super::{InvalidRecord, QueryType, QueryValue};

/// User count: each data holder contributes 1 when it has any trip entries
/// matching the query's time and location window, 0 otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sum;

impl QueryType for Sum {
    fn tag(&self) -> &'static str {
        "sum"
    }

    fn run_query(&self, records: &[Value]) -> Result<QueryValue, InvalidRecord> {
        Ok(if records.is_empty() { 0 } else { 1 })
    }
}

impl fmt::Display for Sum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

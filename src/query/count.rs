// src/query/count.rs
use serde_json::Value;
use std::fmt;

use super::{InvalidRecord, QueryType, QueryValue};

/// Total number of matching trip entries across all holders.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordCount;

impl QueryType for RecordCount {
    fn tag(&self) -> &'static str {
        "count"
    }

    fn run_query(&self, records: &[Value]) -> Result<QueryValue, InvalidRecord> {
        Ok(records.len() as QueryValue)
    }
}

impl fmt::Display for RecordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

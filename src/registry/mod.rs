// src/registry/mod.rs
//! Query type registry: maps request tags to query type factories.
//!
//! The registry is assembled once at startup and shared read-only behind an
//! `Arc`, so lookups from concurrent sessions need no locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::error::AggregateError;
use crate::query::{QueryType, RecordCount, Sum};

/// Builds a fresh query type instance for one session.
pub type QueryFactory = fn() -> Box<dyn QueryType>;

/// Process-wide registry of the built-in query types.
static BUILTIN: OnceLock<Arc<QueryRegistry>> = OnceLock::new();

fn sum() -> Box<dyn QueryType> {
    Box::new(Sum)
}

fn record_count() -> Box<dyn QueryType> {
    Box::new(RecordCount)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateTag(&'static str),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateTag(tag) => {
                write!(f, "query type '{}' is already registered", tag)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

#[derive(Debug, Default)]
pub struct QueryRegistry {
    factories: HashMap<&'static str, QueryFactory>,
}

impl QueryRegistry {
    /// Registry with no query types, for building custom sets.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding every built-in query type.
    pub fn with_builtins() -> Self {
        let builtins: [(&'static str, QueryFactory); 2] = [("sum", sum), ("count", record_count)];
        Self {
            factories: builtins.into_iter().collect(),
        }
    }

    /// Shared handle to the built-in registry, initialized on first use.
    pub fn builtin() -> Arc<QueryRegistry> {
        BUILTIN
            .get_or_init(|| {
                let registry = Self::with_builtins();
                debug!(tags = ?registry.tags(), "query registry initialized");
                Arc::new(registry)
            })
            .clone()
    }

    /// Add a query type. The tag is taken from the instance the factory builds.
    pub fn register(&mut self, factory: QueryFactory) -> Result<(), RegistryError> {
        let tag = factory().tag();
        if self.factories.contains_key(tag) {
            return Err(RegistryError::DuplicateTag(tag));
        }
        self.factories.insert(tag, factory);
        Ok(())
    }

    /// Build a fresh query type instance for `tag`.
    pub fn lookup(&self, tag: &str) -> Result<Box<dyn QueryType>, AggregateError> {
        self.factories
            .get(tag)
            .map(|factory| factory())
            .ok_or_else(|| AggregateError::UnknownQueryType(tag.to_string()))
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.factories.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::StoreError;
use crate::models::{Collection, Document};

pub mod memory_store;

pub use memory_store::InMemoryStore;

/// `field == value`, compared on the field's text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EqFilter {
    pub field: String,
    pub value: String,
}

impl EqFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Documents where every filter holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EqQuery {
    pub collection: Collection,
    pub filters: Vec<EqFilter>,
    pub limit: Option<usize>,
}

impl EqQuery {
    pub fn new(collection: Collection, filters: Vec<EqFilter>) -> Self {
        Self {
            collection,
            filters,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Documents whose timestamp lies in `[start, end]`, at most `limit`.
///
/// A document's timestamp is read from the first of `fields` holding a
/// usable value, the same way the field resolver reads it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeQuery {
    pub collection: Collection,
    pub fields: Vec<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: usize,
}

/// Read-only access to the document store.
///
/// The engine only ever issues equality and range queries; implementations
/// decide how those map onto the backing store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_eq(&self, query: EqQuery) -> Result<Vec<Document>, StoreError>;

    async fn find_in_range(&self, query: RangeQuery) -> Result<Vec<Document>, StoreError>;
}

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use warehouse_recon::{
    config::ReportConfig,
    diagnostics::ReportContext,
    errors::{ServiceError, StoreError},
    models::{Collection, Document, ReportRow},
    repositories::{DocumentStore, EqQuery, InMemoryStore, RangeQuery},
    services::reports::{ReportBatchDriver, ReportWindow},
};

/// Helper harness wiring an in-memory store into a batch driver.
pub struct TestHarness {
    pub store: InMemoryStore,
    pub config: ReportConfig,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new(),
            config: ReportConfig::default(),
        }
    }

    pub fn with_config(mut self, configure: impl FnOnce(&mut ReportConfig)) -> Self {
        configure(&mut self.config);
        self
    }

    pub fn insert(&self, collection: Collection, value: Value) -> &Self {
        self.store.insert(collection, doc(value));
        self
    }

    pub fn driver(&self) -> ReportBatchDriver {
        self.driver_over(Arc::new(self.store.clone()))
    }

    pub fn driver_over(&self, store: Arc<dyn DocumentStore>) -> ReportBatchDriver {
        ReportBatchDriver::from_config(store, &self.config)
    }

    /// Runs a batch over July 2025 and returns the rows with their context.
    pub async fn run_july(&self) -> (Result<Vec<ReportRow>, ServiceError>, ReportContext) {
        let ctx = ReportContext::new();
        let result = self
            .driver()
            .run(&july(), &ctx, &CancellationToken::new())
            .await;
        (result, ctx)
    }
}

pub fn doc(value: Value) -> Document {
    Document::from_value(value).expect("fixture must be a JSON object")
}

pub fn july() -> ReportWindow {
    ReportWindow::from_dates(date(2025, 7, 1), date(2025, 7, 31))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// An inward lot in the shape the entry form writes today.
pub fn lot(id: &str, tag: &str, created: &str, bags: i64, quantity: &str) -> Value {
    json!({
        "id": id,
        "receiptType": tag,
        "createdAt": created,
        "totalBags": bags,
        "totalQuantity": quantity,
    })
}

pub fn release(key: &str, status: &str, bags: i64, quantity: f64) -> Value {
    json!({
        "srwrNo": key,
        "roStatus": status,
        "releaseBags": bags,
        "releaseQuantity": quantity,
    })
}

pub fn delivery(key: &str, status: &str, bags: i64, quantity: f64) -> Value {
    json!({
        "srwrNo": key,
        "doStatus": status,
        "deliveryBags": bags,
        "deliveryQuantity": quantity,
    })
}

/// Wraps a store and delays equality lookups.
///
/// Delays are chosen per collection, or per key value when one is
/// registered for the first filter's value.
pub struct DelayedStore {
    inner: InMemoryStore,
    by_collection: HashMap<Collection, Duration>,
    by_value: HashMap<String, Duration>,
    pub lookups: Arc<AtomicUsize>,
}

impl DelayedStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            by_collection: HashMap::new(),
            by_value: HashMap::new(),
            lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn delay_collection(mut self, collection: Collection, delay: Duration) -> Self {
        self.by_collection.insert(collection, delay);
        self
    }

    pub fn delay_value(mut self, value: &str, delay: Duration) -> Self {
        self.by_value.insert(value.to_string(), delay);
        self
    }
}

#[async_trait]
impl DocumentStore for DelayedStore {
    async fn find_eq(&self, query: EqQuery) -> Result<Vec<Document>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let by_value = query
            .filters
            .first()
            .and_then(|f| self.by_value.get(&f.value));
        if let Some(delay) = by_value.or_else(|| self.by_collection.get(&query.collection)) {
            tokio::time::sleep(*delay).await;
        }
        self.inner.find_eq(query).await
    }

    async fn find_in_range(&self, query: RangeQuery) -> Result<Vec<Document>, StoreError> {
        self.inner.find_in_range(query).await
    }
}

/// Serves primary records but fails every related-collection lookup.
pub struct FailingLookupStore {
    inner: InMemoryStore,
}

impl FailingLookupStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DocumentStore for FailingLookupStore {
    async fn find_eq(&self, _query: EqQuery) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::Transport("connection reset by peer".into()))
    }

    async fn find_in_range(&self, query: RangeQuery) -> Result<Vec<Document>, StoreError> {
        self.inner.find_in_range(query).await
    }
}

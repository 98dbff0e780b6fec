use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::key_strategy::generate_keys;
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerError};
use crate::diagnostics::ReportContext;
use crate::errors::LookupFailure;
use crate::fields::table::{bank, client, events, warehouse};
use crate::metrics;
use crate::models::{Collection, Document, EventKind, PrimaryRecord};
use crate::repositories::{DocumentStore, EqFilter, EqQuery};

/// Ordered equality probes against one related collection.
///
/// `candidates` are tried against `key_field` in order; the first
/// non-empty answer wins. If every candidate misses, `fallback` is queried
/// on its own. `filters` are added to every candidate query but not to the
/// fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupPlan {
    pub collection: Collection,
    pub key_field: String,
    pub candidates: Vec<String>,
    pub filters: Vec<EqFilter>,
    pub fallback: Option<EqFilter>,
}

impl LookupPlan {
    pub fn new(collection: Collection, key_field: impl Into<String>) -> Self {
        Self {
            collection,
            key_field: key_field.into(),
            candidates: Vec::new(),
            filters: Vec::new(),
            fallback: None,
        }
    }

    /// Adds a candidate key; blank values are ignored.
    pub fn candidate(mut self, key: Option<impl Into<String>>) -> Self {
        if let Some(key) = key.map(Into::into).filter(|k| !k.trim().is_empty()) {
            if !self.candidates.contains(&key) {
                self.candidates.push(key);
            }
        }
        self
    }

    /// Adds an equality filter to every candidate query; `None` is ignored.
    pub fn filter(mut self, field: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.filters.push(EqFilter::new(field, value));
        }
        self
    }

    pub fn fallback(mut self, field: &str, value: Option<&str>) -> Self {
        self.fallback = value
            .filter(|v| !v.trim().is_empty())
            .map(|v| EqFilter::new(field, v));
        self
    }

    /// True when the plan has nothing to query.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.fallback.is_none()
    }

    /// Release or delivery events for a lot: composite keys from the key
    /// strategy generator against `key_field`, then the inward document id
    /// against `fallback_id_field`.
    pub fn for_events(
        collection: Collection,
        primary: &PrimaryRecord,
        key_field: &str,
        fallback_id_field: &str,
    ) -> Self {
        generate_keys(primary)
            .into_iter()
            .fold(Self::new(collection, key_field), |plan, candidate| {
                plan.candidate(Some(candidate.key))
            })
            .fallback(fallback_id_field, Some(&primary.id))
    }

    pub fn for_event_kind(kind: EventKind, primary: &PrimaryRecord) -> Self {
        Self::for_events(
            kind.collection(),
            primary,
            events::LINK_FIELD,
            events::INWARD_ID_FIELD,
        )
    }

    /// Warehouse inspection metadata, scoped by location when known.
    pub fn for_warehouse(primary: &PrimaryRecord) -> Self {
        Self::new(Collection::WarehouseInspections, warehouse::NAME_FIELD)
            .candidate(primary.warehouse_name.clone())
            .filter(
                warehouse::LOCATION_FIELD,
                primary.warehouse_location.as_deref(),
            )
    }

    /// Bank master by bank name within the lot's state and branch; the
    /// unscoped bank name is the fallback.
    pub fn for_bank(primary: &PrimaryRecord) -> Self {
        let plan = Self::new(Collection::Banks, bank::NAME_FIELD)
            .candidate(primary.bank_name.clone())
            .filter(bank::STATE_FIELD, primary.state.as_deref())
            .filter(bank::BRANCH_FIELD, primary.branch.as_deref());
        // Without scoping filters the fallback repeats the candidate query.
        if plan.filters.is_empty() {
            plan
        } else {
            plan.fallback(bank::NAME_FIELD, primary.bank_name.as_deref())
        }
    }

    /// Client master by client code, falling back to the client name.
    pub fn for_client(primary: &PrimaryRecord) -> Self {
        Self::new(Collection::Clients, client::CODE_FIELD)
            .candidate(primary.client_code.clone())
            .fallback(client::NAME_FIELD, primary.client_name.as_deref())
    }
}

/// Runs [`LookupPlan`]s against the store with a per-query timeout.
///
/// A miss, a timeout or a transport failure all produce an empty list;
/// failures are additionally logged and recorded on the [`ReportContext`].
#[derive(Clone)]
pub struct RelationFetcher {
    store: Arc<dyn DocumentStore>,
    breaker: Arc<CircuitBreaker>,
    lookup_timeout: Duration,
}

impl RelationFetcher {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        breaker: Arc<CircuitBreaker>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            store,
            breaker,
            lookup_timeout,
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    /// Executes a plan for one primary record.
    ///
    /// The first failing query ends the plan: later, broader candidates are
    /// not tried, so a timeout never lets a less specific key match.
    pub async fn fetch(
        &self,
        plan: &LookupPlan,
        record_id: &str,
        ctx: &ReportContext,
    ) -> Vec<Document> {
        let collection = plan.collection;
        if plan.is_empty() {
            return Vec::new();
        }

        for key in &plan.candidates {
            let mut filters = Vec::with_capacity(plan.filters.len() + 1);
            filters.push(EqFilter::new(plan.key_field.as_str(), key.as_str()));
            filters.extend(plan.filters.iter().cloned());

            match self.query(EqQuery::new(collection, filters)).await {
                Ok(docs) if !docs.is_empty() => {
                    debug!(%collection, key = %key, matches = docs.len(), "Lookup hit");
                    metrics::record_lookup(collection.as_str(), "hit");
                    return docs;
                }
                Ok(_) => continue,
                Err(failure) => return self.degrade(collection, record_id, failure, ctx),
            }
        }

        if let Some(fallback) = &plan.fallback {
            match self
                .query(EqQuery::new(collection, vec![fallback.clone()]))
                .await
            {
                Ok(docs) if !docs.is_empty() => {
                    debug!(
                        %collection,
                        field = %fallback.field,
                        matches = docs.len(),
                        "Lookup hit on fallback identifier"
                    );
                    metrics::record_lookup(collection.as_str(), "fallback_hit");
                    return docs;
                }
                Ok(_) => {}
                Err(failure) => return self.degrade(collection, record_id, failure, ctx),
            }
        }

        metrics::record_lookup(collection.as_str(), "miss");
        Vec::new()
    }

    /// Events of one kind for a lot.
    pub async fn fetch_events(
        &self,
        kind: EventKind,
        primary: &PrimaryRecord,
        ctx: &ReportContext,
    ) -> Vec<Document> {
        self.fetch(&LookupPlan::for_event_kind(kind, primary), &primary.id, ctx)
            .await
    }

    async fn query(&self, query: EqQuery) -> Result<Vec<Document>, LookupFailure> {
        let timeout = self.lookup_timeout;
        let store = &self.store;
        let outcome = self
            .breaker
            .call(|| async move {
                match tokio::time::timeout(timeout, store.find_eq(query)).await {
                    Ok(result) => result.map_err(LookupFailure::from),
                    Err(_) => Err(LookupFailure::Timeout(timeout)),
                }
            })
            .await;
        metrics::LOOKUP_CIRCUIT_STATE.set(self.breaker.state().as_gauge());

        outcome.map_err(|err| match err {
            CircuitBreakerError::CircuitOpen => LookupFailure::CircuitOpen,
            CircuitBreakerError::ServiceFailure(failure) => failure,
        })
    }

    fn degrade(
        &self,
        collection: Collection,
        record_id: &str,
        failure: LookupFailure,
        ctx: &ReportContext,
    ) -> Vec<Document> {
        warn!(
            request_id = %ctx.request_id(),
            %collection,
            record_id,
            error = %failure,
            "Lookup degraded to empty result"
        );
        metrics::record_lookup(collection.as_str(), failure.as_label());
        ctx.record_degraded(record_id, collection, failure);
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::repositories::MockDocumentStore;
    use serde_json::json;
    use std::sync::Mutex;

    fn primary() -> PrimaryRecord {
        let doc = Document::from_value(json!({
            "id": "doc-47",
            "inwardId": "INW-047",
            "receiptType": "SR",
            "createdAt": "2025-07-25",
            "warehouseName": "WH-North",
            "warehouseLocation": "Indore",
            "clientName": "Shree Traders"
        }))
        .unwrap();
        PrimaryRecord::from_document(&doc).unwrap()
    }

    fn fetcher(store: MockDocumentStore) -> RelationFetcher {
        RelationFetcher::new(
            Arc::new(store),
            Arc::new(CircuitBreaker::default()),
            Duration::from_secs(1),
        )
    }

    fn key_of(query: &EqQuery) -> String {
        query
            .filters
            .first()
            .map(|f| format!("{}={}", f.field, f.value))
            .unwrap_or_default()
    }

    #[test]
    fn event_plan_orders_keys_then_fallback() {
        let plan = LookupPlan::for_event_kind(EventKind::Release, &primary());
        assert_eq!(plan.collection, Collection::ReleaseOrders);
        assert_eq!(
            plan.candidates,
            vec!["SR-INW-047-2025-07-25", "SR-INW-047", "INW-047"]
        );
        assert_eq!(plan.fallback, Some(EqFilter::new("inwardId", "doc-47")));
    }

    #[test]
    fn warehouse_plan_adds_location_discriminator() {
        let plan = LookupPlan::for_warehouse(&primary());
        assert_eq!(plan.candidates, vec!["WH-North"]);
        assert_eq!(plan.filters, vec![EqFilter::new("location", "Indore")]);
    }

    #[test]
    fn client_plan_without_code_goes_straight_to_fallback() {
        let plan = LookupPlan::for_client(&primary());
        assert!(plan.candidates.is_empty());
        assert_eq!(
            plan.fallback,
            Some(EqFilter::new("clientName", "Shree Traders"))
        );
        assert!(LookupPlan::for_bank(&primary()).is_empty());
    }

    #[tokio::test]
    async fn unscoped_bank_plan_queries_the_name_once() {
        let doc = Document::from_value(json!({
            "inwardId": "INW-052",
            "bankName": "State Bank"
        }))
        .unwrap();
        let unscoped = LookupPlan::for_bank(&PrimaryRecord::from_document(&doc).unwrap());
        assert_eq!(unscoped.candidates, vec!["State Bank"]);
        assert!(unscoped.filters.is_empty());
        assert_eq!(unscoped.fallback, None);

        let mut store = MockDocumentStore::new();
        store.expect_find_eq().times(1).returning(|_| Ok(vec![]));
        let ctx = ReportContext::new();
        let docs = fetcher(store).fetch(&unscoped, "INW-052", &ctx).await;
        assert!(docs.is_empty());

        let doc = Document::from_value(json!({
            "inwardId": "INW-053",
            "bankName": "State Bank",
            "branch": "Indore"
        }))
        .unwrap();
        let scoped = LookupPlan::for_bank(&PrimaryRecord::from_document(&doc).unwrap());
        assert_eq!(scoped.filters, vec![EqFilter::new("branch", "Indore")]);
        assert_eq!(scoped.fallback, Some(EqFilter::new("bankName", "State Bank")));
    }

    #[tokio::test]
    async fn stops_at_first_non_empty_candidate() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let mut store = MockDocumentStore::new();
        store.expect_find_eq().returning(move |query| {
            let key = key_of(&query);
            log.lock().unwrap().push(key.clone());
            if key == "srwrNo=SR-INW-047" {
                Ok(vec![Document::from_value(json!({"srwrNo": "SR-INW-047"})).unwrap()])
            } else {
                Ok(vec![])
            }
        });

        let ctx = ReportContext::new();
        let docs = fetcher(store)
            .fetch_events(EventKind::Release, &primary(), &ctx)
            .await;

        assert_eq!(docs.len(), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["srwrNo=SR-INW-047-2025-07-25", "srwrNo=SR-INW-047"]
        );
    }

    #[tokio::test]
    async fn falls_back_to_identifier_query() {
        let mut store = MockDocumentStore::new();
        store.expect_find_eq().times(4).returning(|query| {
            if key_of(&query) == "inwardId=doc-47" {
                Ok(vec![Document::default()])
            } else {
                Ok(vec![])
            }
        });

        let ctx = ReportContext::new();
        let docs = fetcher(store)
            .fetch_events(EventKind::Delivery, &primary(), &ctx)
            .await;
        assert_eq!(docs.len(), 1);
        assert_eq!(ctx.degraded_lookups(), 0);
    }

    #[tokio::test]
    async fn transport_failure_degrades_and_stops_probing() {
        let mut store = MockDocumentStore::new();
        store
            .expect_find_eq()
            .times(1)
            .returning(|_| Err(StoreError::Transport("connection reset".into())));

        let ctx = ReportContext::new();
        let docs = fetcher(store)
            .fetch_events(EventKind::Release, &primary(), &ctx)
            .await;

        assert!(docs.is_empty());
        assert_eq!(ctx.degraded_lookups(), 1);
    }

    #[tokio::test]
    async fn open_circuit_short_circuits_without_querying() {
        let mut store = MockDocumentStore::new();
        store.expect_find_eq().never();

        let breaker = Arc::new(CircuitBreaker::new(1, Duration::from_secs(60), 1));
        let _ = breaker.call(|| async { Err::<(), &str>("down") }).await;

        let fetcher = RelationFetcher::new(Arc::new(store), breaker, Duration::from_secs(1));
        let ctx = ReportContext::new();
        let docs = fetcher
            .fetch(&LookupPlan::for_warehouse(&primary()), "doc-47", &ctx)
            .await;

        assert!(docs.is_empty());
        assert!(matches!(
            ctx.diagnostics().as_slice(),
            [crate::diagnostics::Diagnostic::LookupDegraded {
                failure: LookupFailure::CircuitOpen,
                ..
            }]
        ));
    }
}

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use super::{DocumentStore, EqQuery, RangeQuery};
use crate::errors::StoreError;
use crate::fields::{self, coerce};
use crate::models::{Collection, Document};

/// JSON dataset layout accepted by [`InMemoryStore::from_json`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Dataset {
    #[serde(default)]
    inward: Vec<Value>,
    #[serde(default)]
    release_orders: Vec<Value>,
    #[serde(default)]
    delivery_orders: Vec<Value>,
    #[serde(default)]
    warehouse_inspections: Vec<Value>,
    #[serde(default)]
    banks: Vec<Value>,
    #[serde(default)]
    clients: Vec<Value>,
}

/// Document store held in memory, used for fixtures, the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a dataset of the form `{"inward": [...], "releaseOrders": [...]}`.
    ///
    /// Entries that are not JSON objects are skipped.
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        let dataset: Dataset = serde_json::from_str(raw)?;
        let store = Self::new();
        for (collection, values) in [
            (Collection::Inward, dataset.inward),
            (Collection::ReleaseOrders, dataset.release_orders),
            (Collection::DeliveryOrders, dataset.delivery_orders),
            (Collection::WarehouseInspections, dataset.warehouse_inspections),
            (Collection::Banks, dataset.banks),
            (Collection::Clients, dataset.clients),
        ] {
            for (index, value) in values.into_iter().enumerate() {
                match Document::from_value(value) {
                    Some(doc) => store.insert(collection, doc),
                    None => warn!(%collection, index, "Skipping non-object dataset entry"),
                }
            }
        }
        Ok(store)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn insert(&self, collection: Collection, doc: Document) {
        self.write().entry(collection).or_default().push(doc);
    }

    pub fn extend(&self, collection: Collection, docs: impl IntoIterator<Item = Document>) {
        self.write().entry(collection).or_default().extend(docs);
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.read().get(&collection).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.read().values().all(Vec::is_empty)
    }

    // A poisoned lock only means a writer panicked mid-insert; the data is
    // still readable.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Collection, Vec<Document>>> {
        match self.collections.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Collection, Vec<Document>>> {
        match self.collections.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find_eq(&self, query: EqQuery) -> Result<Vec<Document>, StoreError> {
        let collections = self.read();
        let limit = query.limit.unwrap_or(usize::MAX);
        let docs: Vec<Document> = collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| {
                        query.filters.iter().all(|filter| {
                            doc.get_path(&filter.field)
                                .and_then(coerce::as_text)
                                .is_some_and(|text| text == filter.value)
                        })
                    })
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        debug!(collection = %query.collection, matches = docs.len(), "find_eq");
        Ok(docs)
    }

    async fn find_in_range(&self, query: RangeQuery) -> Result<Vec<Document>, StoreError> {
        let paths: Vec<&str> = query.fields.iter().map(String::as_str).collect();
        let collections = self.read();
        let mut hits: Vec<_> = collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter_map(|doc| {
                        let ts = fields::resolve_timestamp(doc, &paths)?;
                        (ts >= query.start && ts <= query.end).then_some((ts, doc))
                    })
                    .collect()
            })
            .unwrap_or_default();
        // Stable sort keeps insertion order for equal timestamps.
        hits.sort_by_key(|(ts, _)| *ts);
        let docs: Vec<Document> = hits
            .into_iter()
            .take(query.limit)
            .map(|(_, doc)| doc.clone())
            .collect();
        debug!(collection = %query.collection, matches = docs.len(), "find_in_range");
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::EqFilter;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn equality_compares_text_forms() {
        let store = InMemoryStore::new();
        store.insert(Collection::Clients, doc(json!({"clientCode": 1042})));
        store.insert(Collection::Clients, doc(json!({"clientCode": "1043"})));

        let hits = store
            .find_eq(EqQuery::new(
                Collection::Clients,
                vec![EqFilter::new("clientCode", "1042")],
            ))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn all_filters_must_hold() {
        let store = InMemoryStore::new();
        store.insert(
            Collection::WarehouseInspections,
            doc(json!({"warehouseName": "WH-1", "location": "Indore"})),
        );
        store.insert(
            Collection::WarehouseInspections,
            doc(json!({"warehouseName": "WH-1", "location": "Dewas"})),
        );

        let hits = store
            .find_eq(EqQuery::new(
                Collection::WarehouseInspections,
                vec![
                    EqFilter::new("warehouseName", "WH-1"),
                    EqFilter::new("location", "Dewas"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].get_path("location"), Some(&json!("Dewas")));
    }

    #[tokio::test]
    async fn range_is_inclusive_ordered_and_capped() {
        let store = InMemoryStore::new();
        for (id, day) in [("c", 27), ("a", 25), ("out", 30), ("b", 26)] {
            store.insert(
                Collection::Inward,
                doc(json!({"id": id, "createdAt": format!("2025-07-{day:02}")})),
            );
        }
        store.insert(Collection::Inward, doc(json!({"id": "undated"})));

        let query = RangeQuery {
            collection: Collection::Inward,
            fields: vec!["createdAt".into()],
            start: Utc.with_ymd_and_hms(2025, 7, 25, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 7, 27, 0, 0, 0).unwrap(),
            limit: 2,
        };
        let hits = store.find_in_range(query).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|d| d.get_path("id").cloned()).collect();
        assert_eq!(ids, vec![Some(json!("a")), Some(json!("b"))]);
    }

    #[tokio::test]
    async fn range_reads_the_first_usable_candidate_field() {
        let store = InMemoryStore::new();
        store.insert(
            Collection::Inward,
            doc(json!({"id": "legacy", "dateOfInward": "2025-07-25"})),
        );
        store.insert(
            Collection::Inward,
            doc(json!({"id": "moved", "dateOfInward": "2025-08-02", "createdAt": "2025-07-26"})),
        );
        store.insert(
            Collection::Inward,
            doc(json!({"id": "garbled", "dateOfInward": "soon", "createdAt": "2025-07-26"})),
        );

        let query = RangeQuery {
            collection: Collection::Inward,
            fields: vec!["dateOfInward".into(), "createdAt".into()],
            start: Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 7, 31, 23, 59, 59).unwrap(),
            limit: 10,
        };
        let hits = store.find_in_range(query).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|d| d.get_path("id").cloned()).collect();
        assert_eq!(ids, vec![Some(json!("legacy")), Some(json!("garbled"))]);
    }

    #[test]
    fn dataset_loading_skips_non_objects() {
        let store = InMemoryStore::from_json(
            r#"{"inward": [{"id": "INW-1"}, 7], "banks": [{"bankName": "SBI"}]}"#,
        )
        .unwrap();
        assert_eq!(store.len(Collection::Inward), 1);
        assert_eq!(store.len(Collection::Banks), 1);
        assert_eq!(store.len(Collection::Clients), 0);
    }

    #[test]
    fn malformed_dataset_is_an_error() {
        assert!(matches!(
            InMemoryStore::from_json("{not json"),
            Err(StoreError::Dataset(_))
        ));
    }
}

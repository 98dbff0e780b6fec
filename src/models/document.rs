use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use strum::{EnumIter, EnumString};

/// A schemaless document as returned by the document store.
///
/// Fields are only read through [`crate::fields`]; nothing outside that
/// module should index into the underlying map directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wraps a JSON value; anything other than an object is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Looks up a dotted path such as `insurance.name`.
    ///
    /// A literal key containing dots wins over nested traversal.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.0.get(path) {
            return Some(value);
        }
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// The read-only collections the reconciliation engine queries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Collection {
    /// Inward lots, the primary collection.
    Inward,
    ReleaseOrders,
    DeliveryOrders,
    WarehouseInspections,
    Banks,
    Clients,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Inward => "inward",
            Collection::ReleaseOrders => "releaseOrders",
            Collection::DeliveryOrders => "deliveryOrders",
            Collection::WarehouseInspections => "warehouseInspections",
            Collection::Banks => "banks",
            Collection::Clients => "clients",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn dotted_paths_walk_nested_objects() {
        let d = doc(json!({"insurance": {"managedBy": {"name": "Bank"}}}));
        assert_eq!(
            d.get_path("insurance.managedBy.name"),
            Some(&json!("Bank"))
        );
        assert_eq!(d.get_path("insurance.missing"), None);
    }

    #[test]
    fn literal_dotted_key_wins() {
        let d = doc(json!({"a.b": 1, "a": {"b": 2}}));
        assert_eq!(d.get_path("a.b"), Some(&json!(1)));
    }

    #[test]
    fn non_objects_are_not_documents() {
        assert!(Document::from_value(json!([1, 2])).is_none());
        assert!(Document::from_value(json!("x")).is_none());
    }

    #[test]
    fn collection_names_round_trip_through_strum() {
        for collection in Collection::iter() {
            assert_eq!(
                Collection::from_str(collection.as_str()).ok(),
                Some(collection)
            );
        }
    }
}

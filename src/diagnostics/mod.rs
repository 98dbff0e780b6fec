//! Per-request diagnostic context.
//!
//! A [`ReportContext`] is created by the caller for each report request and
//! passed explicitly into the batch driver, which threads it through every
//! enrichment and lookup. It carries the request id used in tracing spans
//! and collects the reasons rows were skipped or lookups degraded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::errors::LookupFailure;
use crate::models::Collection;

/// Request ID tracking information
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RequestId(pub String);

impl Default for RequestId {
    fn default() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }
}

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        RequestId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One noteworthy event during a report run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A primary record was dropped from the batch.
    SkippedRecord {
        record_id: Option<String>,
        reason: String,
    },
    /// A lookup failed and was treated as a miss.
    LookupDegraded {
        record_id: String,
        collection: Collection,
        failure: LookupFailure,
    },
}

/// Diagnostic context for a single report request.
#[derive(Debug)]
pub struct ReportContext {
    request_id: RequestId,
    started_at: DateTime<Utc>,
    entries: Mutex<Vec<Diagnostic>>,
}

impl ReportContext {
    pub fn new() -> Self {
        Self::with_request_id(RequestId::default())
    }

    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            started_at: Utc::now(),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn record(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }

    pub fn record_skip(&self, record_id: Option<String>, reason: impl Into<String>) {
        self.record(Diagnostic::SkippedRecord {
            record_id,
            reason: reason.into(),
        });
    }

    pub fn record_degraded(&self, record_id: &str, collection: Collection, failure: LookupFailure) {
        self.record(Diagnostic::LookupDegraded {
            record_id: record_id.to_string(),
            collection,
            failure,
        });
    }

    /// Snapshot of everything recorded so far, in recording order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    pub fn skipped(&self) -> Vec<Diagnostic> {
        self.lock()
            .iter()
            .filter(|d| matches!(d, Diagnostic::SkippedRecord { .. }))
            .cloned()
            .collect()
    }

    pub fn degraded_lookups(&self) -> usize {
        self.lock()
            .iter()
            .filter(|d| matches!(d, Diagnostic::LookupDegraded { .. }))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ReportContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn request_ids_are_unique_by_default() {
        assert_ne!(RequestId::default(), RequestId::default());
    }

    #[test]
    fn collects_skips_and_degraded_lookups_separately() {
        let ctx = ReportContext::with_request_id(RequestId::new("req-1"));
        ctx.record_skip(None, "no lot identifier");
        ctx.record_degraded(
            "INW-1",
            Collection::Banks,
            LookupFailure::Timeout(Duration::from_millis(5)),
        );

        assert_eq!(ctx.request_id().as_str(), "req-1");
        assert_eq!(ctx.diagnostics().len(), 2);
        assert_eq!(ctx.skipped().len(), 1);
        assert_eq!(ctx.degraded_lookups(), 1);
    }

    #[test]
    fn diagnostics_serialize_with_a_kind_tag() {
        let value = serde_json::to_value(Diagnostic::SkippedRecord {
            record_id: Some("x".into()),
            reason: "bad".into(),
        })
        .unwrap();
        assert_eq!(value["kind"], "skipped_record");
    }
}

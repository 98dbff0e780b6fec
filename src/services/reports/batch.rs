use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::enrichment::{EnrichmentOptions, LotEnricher};
use super::relation_fetcher::RelationFetcher;
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::config::ReportConfig;
use crate::diagnostics::ReportContext;
use crate::errors::ServiceError;
use crate::fields::table::inward;
use crate::metrics::{self, ROWS_PRODUCED, ROWS_SKIPPED};
use crate::models::{Collection, PrimaryRecord, ReportRow};
use crate::repositories::{DocumentStore, RangeQuery};

/// Time window (inclusive) and optional row cap of one report request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub max_rows: Option<usize>,
}

impl ReportWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            max_rows: None,
        }
    }

    /// Whole calendar days, from the start of `start` to the end of `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        let midnight = NaiveTime::MIN;
        Self::new(
            Utc.from_utc_datetime(&start.and_time(midnight)),
            Utc.from_utc_datetime(&end.and_time(midnight)) + chrono::Duration::days(1)
                - chrono::Duration::milliseconds(1),
        )
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.start > self.end {
            return Err(ServiceError::InvalidWindow(format!(
                "start {} is after end {}",
                self.start, self.end
            )));
        }
        if self.max_rows == Some(0) {
            return Err(ServiceError::InvalidWindow(
                "max_rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs enrichment over every primary record in a window.
pub struct ReportBatchDriver {
    store: Arc<dyn DocumentStore>,
    enricher: Arc<LotEnricher>,
    max_concurrency: usize,
    max_rows_cap: usize,
}

impl ReportBatchDriver {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        enricher: Arc<LotEnricher>,
        max_concurrency: usize,
        max_rows_cap: usize,
    ) -> Self {
        Self {
            store,
            enricher,
            max_concurrency: max_concurrency.max(1),
            max_rows_cap: max_rows_cap.max(1),
        }
    }

    /// Wires fetcher, circuit breaker and enricher from configuration.
    pub fn from_config(store: Arc<dyn DocumentStore>, config: &ReportConfig) -> Self {
        let breaker = Arc::new(CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: config.circuit_breaker_failure_threshold,
            timeout: Duration::from_secs(config.circuit_breaker_timeout_secs),
            ..CircuitBreakerConfig::default()
        }));
        let fetcher = RelationFetcher::new(
            store.clone(),
            breaker,
            Duration::from_millis(config.lookup_timeout_ms),
        );
        let enricher = LotEnricher::with_options(
            fetcher,
            EnrichmentOptions {
                surface_unapproved_descriptors: config.surface_unapproved_descriptors,
            },
        );
        Self::new(
            store,
            Arc::new(enricher),
            config.max_concurrency,
            config.max_rows,
        )
    }

    pub fn max_rows_cap(&self) -> usize {
        self.max_rows_cap
    }

    /// Produces one row per valid primary record in the window.
    ///
    /// Rows come back in primary query order whatever order enrichment
    /// finishes in; sorting is left to the caller. Invalid primary records
    /// are skipped and recorded on `ctx`. Only a failed primary query or
    /// cancellation fails the batch, and a cancelled batch returns no rows.
    #[instrument(
        skip(self, window, ctx, cancel),
        fields(request_id = %ctx.request_id(), start = %window.start, end = %window.end)
    )]
    pub async fn run(
        &self,
        window: &ReportWindow,
        ctx: &ReportContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<ReportRow>, ServiceError> {
        if let Err(e) = window.validate() {
            metrics::record_batch("invalid_window");
            return Err(e);
        }

        let limit = window
            .max_rows
            .unwrap_or(self.max_rows_cap)
            .min(self.max_rows_cap);
        let query = RangeQuery {
            collection: Collection::Inward,
            fields: inward::CREATED_AT.owned_paths(),
            start: window.start,
            end: window.end,
            limit,
        };

        let docs = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(self.cancelled()),
            result = self.store.find_in_range(query) => match result {
                Ok(docs) => docs,
                Err(e) => {
                    warn!(error = %e, "Primary query failed");
                    metrics::record_batch("primary_query_failed");
                    return Err(e.into());
                }
            },
        };

        let mut primaries = Vec::with_capacity(docs.len());
        for doc in &docs {
            match PrimaryRecord::from_document(doc) {
                Ok(primary) => primaries.push(primary),
                Err(e) => {
                    let record_id = inward::ID.text(doc);
                    warn!(record_id = ?record_id, error = %e, "Skipping primary record");
                    ROWS_SKIPPED.inc();
                    ctx.record_skip(record_id, e.to_string());
                }
            }
        }

        let enricher = self.enricher.as_ref();
        let mut slots: Vec<Option<ReportRow>> = vec![None; primaries.len()];
        let mut pending = stream::iter(primaries.iter().enumerate())
            .map(|(slot, primary)| async move { (slot, enricher.enrich(primary, ctx).await) })
            .buffer_unordered(self.max_concurrency);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled()),
                next = pending.next() => match next {
                    Some((slot, row)) => slots[slot] = Some(row),
                    None => break,
                },
            }
        }

        let rows: Vec<ReportRow> = slots.into_iter().flatten().collect();
        ROWS_PRODUCED.inc_by(rows.len() as u64);
        metrics::record_batch("ok");
        info!(
            rows = rows.len(),
            skipped = docs.len() - rows.len(),
            degraded_lookups = ctx.degraded_lookups(),
            "Report batch complete"
        );
        Ok(rows)
    }

    fn cancelled(&self) -> ServiceError {
        info!("Report batch cancelled");
        metrics::record_batch("cancelled");
        ServiceError::Cancelled
    }
}

/*!
 * # Lot Reconciliation Reports
 *
 * Builds denormalized lot report rows from the inward collection and the
 * collections that reference it:
 *
 * - [`key_strategy`]: candidate keys events may be filed under
 * - [`relation_fetcher`]: ordered equality probes with timeouts
 * - [`event_aggregator`]: approved-only totals over release/delivery events
 * - [`balance`]: remaining bags and quantity
 * - [`enrichment`]: one row per lot
 * - [`batch`]: a time window of lots with bounded concurrency
 */

pub mod balance;
pub mod batch;
pub mod enrichment;
pub mod event_aggregator;
pub mod key_strategy;
pub mod relation_fetcher;

pub use balance::{compute_balance, Balance};
pub use batch::{ReportBatchDriver, ReportWindow};
pub use enrichment::{EnrichmentOptions, LotEnricher};
pub use event_aggregator::{aggregate, aggregate_documents, EventDescriptors, EventTotals};
pub use key_strategy::{generate_keys, CandidateKey, KeyStrategy};
pub use relation_fetcher::{LookupPlan, RelationFetcher};

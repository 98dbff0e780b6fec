/*!
 * # Metrics Module
 *
 * Prometheus counters for the reconciliation engine:
 *
 * - related-collection lookups by collection and outcome
 * - report rows produced and primary records skipped
 * - batch runs by outcome
 *
 * Everything lives in a crate-local [`Registry`] so embedding services can
 * merge it into their own exposition endpoint via [`gather_text`].
 */

use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tracing::warn;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref LOOKUPS_TOTAL: IntCounterVec = register(
        IntCounterVec::new(
            Opts::new(
                "recon_lookups_total",
                "Related-collection lookups by collection and outcome"
            ),
            &["collection", "outcome"]
        )
        .expect("metric can be created")
    );
    pub static ref ROWS_PRODUCED: IntCounter = register(
        IntCounter::new("recon_rows_produced_total", "Report rows produced")
            .expect("metric can be created")
    );
    pub static ref ROWS_SKIPPED: IntCounter = register(
        IntCounter::new(
            "recon_rows_skipped_total",
            "Primary records skipped as invalid"
        )
        .expect("metric can be created")
    );
    pub static ref BATCHES_TOTAL: IntCounterVec = register(
        IntCounterVec::new(
            Opts::new("recon_batches_total", "Report batches by outcome"),
            &["outcome"]
        )
        .expect("metric can be created")
    );
    pub static ref LOOKUP_CIRCUIT_STATE: IntGauge = register(
        IntGauge::new(
            "recon_lookup_circuit_state",
            "Lookup circuit breaker state (0=closed, 1=open, 2=half-open)"
        )
        .expect("metric can be created")
    );
}

fn register<T: Collector + Clone + 'static>(metric: T) -> T {
    if let Err(e) = REGISTRY.register(Box::new(metric.clone())) {
        warn!("Failed to register metric: {}", e);
    }
    metric
}

/// Records the outcome label of one lookup.
pub fn record_lookup(collection: &str, outcome: &str) {
    LOOKUPS_TOTAL.with_label_values(&[collection, outcome]).inc();
}

pub fn record_batch(outcome: &str) {
    BATCHES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Renders the registry in Prometheus text format.
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        record_lookup("banks", "hit");
        record_batch("ok");
        ROWS_PRODUCED.inc();

        let text = gather_text();
        assert!(text.contains("recon_lookups_total"));
        assert!(text.contains("collection=\"banks\""));
        assert!(text.contains("recon_batches_total"));
        assert!(text.contains("recon_rows_produced_total"));
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Document, EventKind, RelationEvent};

/// Totals and latest descriptors over the approved events of one lot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTotals {
    pub total_bags: i64,
    pub total_quantity: Decimal,
    /// Number of approved events that contributed.
    pub approved_count: usize,
    pub latest_date: Option<DateTime<Utc>>,
    pub latest_funding_date: Option<DateTime<Utc>>,
    pub latest_validity_date: Option<DateTime<Utc>>,
    pub latest_rate: Option<Decimal>,
    pub latest_insurance_ref: Option<String>,
    /// Receipt identifier carried by the events, if any.
    pub identifier: Option<String>,
    pub bank_name: Option<String>,
    pub bank_branch: Option<String>,
    pub ifsc_code: Option<String>,
    pub commodity: Option<String>,
    pub variety: Option<String>,
}

/// Rate and insurer of the most recent event regardless of status.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDescriptors {
    pub rate: Option<Decimal>,
    pub insurance_ref: Option<String>,
}

/// Reduces events to [`EventTotals`].
///
/// Only approved events count; every other status, absent included, is
/// ignored entirely. Dates keep the maximum seen. Singular descriptors
/// (rate, insurer, identifier, bank fields) keep the first non-empty value
/// in input order. An approved event that names a financing bank but has
/// no funding date contributes its own date as the funding date.
pub fn aggregate(events: &[RelationEvent]) -> EventTotals {
    events
        .iter()
        .filter(|event| event.status.is_approved())
        .fold(EventTotals::default(), |mut totals, event| {
            totals.total_bags = totals.total_bags.saturating_add(event.bags);
            totals.total_quantity = totals
                .total_quantity
                .checked_add(event.quantity)
                .unwrap_or(Decimal::MAX);
            totals.approved_count += 1;

            let funding_date = event.funding_date.or_else(|| {
                event
                    .has_funding_reference()
                    .then(|| event.own_date())
                    .flatten()
            });

            keep_latest(&mut totals.latest_date, event.event_date.or(event.created_at));
            keep_latest(&mut totals.latest_funding_date, funding_date);
            keep_latest(&mut totals.latest_validity_date, event.validity_date);

            keep_first(&mut totals.latest_rate, event.rate);
            keep_first(&mut totals.latest_insurance_ref, event.insurance_ref.clone());
            keep_first(&mut totals.identifier, event.identifier.clone());
            keep_first(&mut totals.bank_name, event.bank_name.clone());
            keep_first(&mut totals.bank_branch, event.bank_branch.clone());
            keep_first(&mut totals.ifsc_code, event.ifsc_code.clone());
            keep_first(&mut totals.commodity, event.commodity.clone());
            keep_first(&mut totals.variety, event.variety.clone());
            totals
        })
}

/// Resolves raw event documents and aggregates them.
pub fn aggregate_documents(kind: EventKind, docs: &[Document]) -> EventTotals {
    let events: Vec<RelationEvent> = docs
        .iter()
        .map(|doc| RelationEvent::from_document(kind, doc))
        .collect();
    aggregate(&events)
}

/// Descriptors of the most recently dated event, any status.
///
/// Undated events lose to dated ones; among equals the first in input
/// order wins.
pub fn latest_descriptors<'a>(
    events: impl IntoIterator<Item = &'a RelationEvent>,
) -> EventDescriptors {
    let mut latest: Option<&RelationEvent> = None;
    for event in events {
        if event.rate.is_none() && event.insurance_ref.is_none() {
            continue;
        }
        let newer = match latest {
            None => true,
            Some(current) => event.own_date() > current.own_date(),
        };
        if newer {
            latest = Some(event);
        }
    }

    latest
        .map(|event| EventDescriptors {
            rate: event.rate,
            insurance_ref: event.insurance_ref.clone(),
        })
        .unwrap_or_default()
}

fn keep_latest(slot: &mut Option<DateTime<Utc>>, candidate: Option<DateTime<Utc>>) {
    if candidate > *slot {
        *slot = candidate;
    }
}

fn keep_first<T>(slot: &mut Option<T>, candidate: Option<T>) {
    if slot.is_none() {
        *slot = candidate;
    }
}

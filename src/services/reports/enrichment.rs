use std::sync::Arc;
use tracing::{debug, instrument};

use super::balance::compute_balance;
use super::event_aggregator::{aggregate, latest_descriptors, EventDescriptors, EventTotals};
use super::relation_fetcher::{LookupPlan, RelationFetcher};
use crate::diagnostics::ReportContext;
use crate::errors::ServiceError;
use crate::fields::first_present;
use crate::fields::table::{bank, client, warehouse};
use crate::models::{Document, EventKind, PrimaryRecord, RelationEvent, ReportRow};

/// Options that change how rows are assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentOptions {
    /// Let the latest non-approved event supply rate and insurer when no
    /// approved event carries them.
    pub surface_unapproved_descriptors: bool,
}

/// Bank fields resolved from master data.
#[derive(Debug, Default)]
struct BankFields {
    name: Option<String>,
    branch: Option<String>,
    ifsc: Option<String>,
}

impl BankFields {
    fn is_complete(&self) -> bool {
        self.name.is_some() && self.branch.is_some() && self.ifsc.is_some()
    }

    /// Fills only the fields still missing.
    fn fill_from(&mut self, name: Option<String>, branch: Option<String>, ifsc: Option<String>) {
        self.name = self.name.take().or(name);
        self.branch = self.branch.take().or(branch);
        self.ifsc = self.ifsc.take().or(ifsc);
    }
}

/// Events of one kind for a lot, plus their approved totals.
struct EventSet {
    events: Vec<RelationEvent>,
    totals: EventTotals,
}

impl EventSet {
    fn new(kind: EventKind, docs: &[Document]) -> Self {
        let events: Vec<RelationEvent> = docs
            .iter()
            .map(|doc| RelationEvent::from_document(kind, doc))
            .collect();
        let totals = aggregate(&events);
        Self { events, totals }
    }

    fn unapproved_descriptors(&self) -> EventDescriptors {
        latest_descriptors(
            self.events
                .iter()
                .filter(|event| !event.status.is_approved()),
        )
    }
}

/// Builds one [`ReportRow`] per primary record.
///
/// Lookups for a record run in a fixed order: warehouse metadata, bank
/// master, client master (only while bank fields are missing), release
/// events, delivery events. A lookup that misses or fails leaves its fields
/// empty; nothing here fails for a valid primary record.
#[derive(Clone)]
pub struct LotEnricher {
    fetcher: RelationFetcher,
    options: EnrichmentOptions,
}

impl LotEnricher {
    pub fn new(fetcher: RelationFetcher) -> Self {
        Self::with_options(fetcher, EnrichmentOptions::default())
    }

    pub fn with_options(fetcher: RelationFetcher, options: EnrichmentOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn options(&self) -> EnrichmentOptions {
        self.options
    }

    /// Resolves a raw inward document and enriches it.
    pub async fn enrich_document(
        &self,
        doc: &Document,
        ctx: &ReportContext,
    ) -> Result<ReportRow, ServiceError> {
        let primary = PrimaryRecord::from_document(doc)?;
        Ok(self.enrich(&primary, ctx).await)
    }

    #[instrument(
        skip(self, primary, ctx),
        fields(request_id = %ctx.request_id(), lot_id = %primary.lot_id)
    )]
    pub async fn enrich(&self, primary: &PrimaryRecord, ctx: &ReportContext) -> ReportRow {
        let record_id = primary.id.as_str();

        let warehouse_docs = self
            .fetcher
            .fetch(&LookupPlan::for_warehouse(primary), record_id, ctx)
            .await;
        let warehouse_meta = warehouse_docs.first();
        if warehouse_meta.is_none() {
            debug!("No warehouse metadata");
        }

        let (bank_fields, firm_name) = self.resolve_bank(primary, ctx).await;

        let release_docs = self
            .fetcher
            .fetch_events(EventKind::Release, primary, ctx)
            .await;
        let release = EventSet::new(EventKind::Release, &release_docs);
        let delivery_docs = self
            .fetcher
            .fetch_events(EventKind::Delivery, primary, ctx)
            .await;
        let delivery = EventSet::new(EventKind::Delivery, &delivery_docs);

        let (rel, del) = (&release.totals, &delivery.totals);
        let balance = compute_balance(
            primary.total_bags,
            primary.total_quantity,
            rel.total_bags,
            rel.total_quantity,
            del.total_bags,
            del.total_quantity,
        );

        let unapproved = if self.options.surface_unapproved_descriptors {
            let release_desc = release.unapproved_descriptors();
            let delivery_desc = delivery.unapproved_descriptors();
            EventDescriptors {
                rate: release_desc.rate.or(delivery_desc.rate),
                insurance_ref: release_desc.insurance_ref.or(delivery_desc.insurance_ref),
            }
        } else {
            EventDescriptors::default()
        };

        debug!(
            released = rel.approved_count,
            delivered = del.approved_count,
            balance_bags = balance.bags,
            "Lot enriched"
        );

        ReportRow {
            id: primary.id.clone(),
            lot_id: primary.lot_id.clone(),
            receipt_type: primary.receipt_type.as_ref().map(ToString::to_string),
            receipt_number: first_present([
                rel.identifier.clone(),
                del.identifier.clone(),
                primary.receipt_number(),
            ]),
            inward_date: primary.inward_date(),
            state: primary.state.clone(),
            branch: primary.branch.clone(),
            location: primary.location.clone(),

            warehouse_name: primary.warehouse_name.clone(),
            warehouse_type: first_present([
                warehouse_meta.and_then(|doc| warehouse::WAREHOUSE_TYPE.text(doc)),
                primary.warehouse_type.clone(),
            ]),
            warehouse_code: first_present([
                warehouse_meta.and_then(|doc| warehouse::WAREHOUSE_CODE.text(doc)),
                primary.warehouse_code.clone(),
            ]),
            warehouse_address: warehouse_meta.and_then(|doc| warehouse::ADDRESS.text(doc)),
            business_type: warehouse_meta.and_then(|doc| warehouse::BUSINESS_TYPE.text(doc)),

            client_name: primary.client_name.clone(),
            client_code: primary.client_code.clone(),
            client_firm_name: first_present([firm_name, primary.client_name.clone()]),
            commodity: first_present([
                primary.commodity.clone(),
                rel.commodity.clone(),
            ]),
            variety: first_present([primary.variety.clone(), rel.variety.clone()]),

            bank_name: first_present([bank_fields.name, rel.bank_name.clone()]),
            bank_branch: first_present([bank_fields.branch, rel.bank_branch.clone()]),
            ifsc_code: first_present([bank_fields.ifsc, rel.ifsc_code.clone()]),
            insurance_managed_by: first_present([
                rel.latest_insurance_ref.clone(),
                del.latest_insurance_ref.clone(),
                unapproved.insurance_ref,
                primary.insurance_managed_by.clone(),
            ]),
            rate: first_present([rel.latest_rate, del.latest_rate, unapproved.rate, primary.rate]),

            total_bags: primary.total_bags,
            total_quantity: primary.total_quantity,
            released_bags: rel.total_bags,
            released_quantity: rel.total_quantity,
            delivered_bags: del.total_bags,
            delivered_quantity: del.total_quantity,
            balance_bags: balance.bags,
            balance_quantity: balance.quantity,

            last_release_date: rel.latest_date.map(|ts| ts.date_naive()),
            last_delivery_date: del.latest_date.map(|ts| ts.date_naive()),
            funding_date: rel
                .latest_funding_date
                .or(del.latest_funding_date)
                .map(|ts| ts.date_naive()),
            validity_date: rel
                .latest_validity_date
                .or(del.latest_validity_date)
                .map(|ts| ts.date_naive()),
        }
    }

    /// Bank fields from the inward record, the bank master, then the
    /// client master. Also returns the client firm name when the client
    /// master was consulted.
    async fn resolve_bank(
        &self,
        primary: &PrimaryRecord,
        ctx: &ReportContext,
    ) -> (BankFields, Option<String>) {
        let mut fields = BankFields {
            name: primary.bank_name.clone(),
            branch: primary.bank_branch.clone(),
            ifsc: primary.ifsc_code.clone(),
        };

        let bank_plan = LookupPlan::for_bank(primary);
        if !bank_plan.is_empty() {
            let banks = self.fetcher.fetch(&bank_plan, &primary.id, ctx).await;
            if let Some(doc) = banks.first() {
                fields.fill_from(
                    bank::BANK_NAME.text(doc),
                    bank::BRANCH_NAME.text(doc),
                    bank::IFSC.text(doc),
                );
            }
        }

        if fields.is_complete() {
            return (fields, None);
        }

        let client_plan = LookupPlan::for_client(primary);
        if client_plan.is_empty() {
            return (fields, None);
        }
        let clients = self.fetcher.fetch(&client_plan, &primary.id, ctx).await;
        let firm_name = clients.first().and_then(|doc| {
            fields.fill_from(
                client::BANK_NAME.text(doc),
                client::BANK_BRANCH.text(doc),
                client::IFSC.text(doc),
            );
            client::FIRM_NAME.text(doc)
        });

        (fields, firm_name)
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One denormalized report line per inward lot.
///
/// Enrichable fields are `None` when no related data was found. Balances
/// are never negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub id: String,
    pub lot_id: String,
    pub receipt_type: Option<String>,
    pub receipt_number: Option<String>,
    pub inward_date: Option<NaiveDate>,
    pub state: Option<String>,
    pub branch: Option<String>,
    pub location: Option<String>,

    pub warehouse_name: Option<String>,
    pub warehouse_type: Option<String>,
    pub warehouse_code: Option<String>,
    pub warehouse_address: Option<String>,
    pub business_type: Option<String>,

    pub client_name: Option<String>,
    pub client_code: Option<String>,
    pub client_firm_name: Option<String>,
    pub commodity: Option<String>,
    pub variety: Option<String>,

    pub bank_name: Option<String>,
    pub bank_branch: Option<String>,
    pub ifsc_code: Option<String>,
    pub insurance_managed_by: Option<String>,
    pub rate: Option<Decimal>,

    pub total_bags: i64,
    pub total_quantity: Decimal,
    pub released_bags: i64,
    pub released_quantity: Decimal,
    pub delivered_bags: i64,
    pub delivered_quantity: Decimal,
    pub balance_bags: i64,
    pub balance_quantity: Decimal,

    pub last_release_date: Option<NaiveDate>,
    pub last_delivery_date: Option<NaiveDate>,
    pub funding_date: Option<NaiveDate>,
    pub validity_date: Option<NaiveDate>,
}

/// Ordering applied by [`sort_rows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOrder {
    #[default]
    InwardDateAsc,
    InwardDateDesc,
}

/// Sorts rows by inward date, undated rows last, ties broken by lot id.
///
/// Sorting is a separate step the caller opts into; the batch driver
/// returns rows in query order.
pub fn sort_rows(rows: &mut [ReportRow], order: RowOrder) {
    rows.sort_by(|a, b| {
        let by_date = match (a.inward_date, b.inward_date) {
            (Some(x), Some(y)) => match order {
                RowOrder::InwardDateAsc => x.cmp(&y),
                RowOrder::InwardDateDesc => y.cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_date.then_with(|| a.lot_id.cmp(&b.lot_id))
    });
}

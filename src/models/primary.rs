use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ServiceError;
use crate::fields::table::inward;
use crate::models::Document;

/// Receipt-type tag that prefixes composite lot keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptType {
    /// Storage receipt.
    Sr,
    /// Warehouse receipt.
    Wr,
    /// Any other tag found in the data, kept verbatim (upper-cased).
    Other(String),
}

impl FromStr for ReceiptType {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let tag = raw.trim().to_ascii_uppercase();
        match tag.as_str() {
            "" => Err(ServiceError::InvalidPrimaryRecord(
                "empty receipt type".to_string(),
            )),
            "SR" => Ok(ReceiptType::Sr),
            "WR" => Ok(ReceiptType::Wr),
            _ => Ok(ReceiptType::Other(tag)),
        }
    }
}

impl fmt::Display for ReceiptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiptType::Sr => f.write_str("SR"),
            ReceiptType::Wr => f.write_str("WR"),
            ReceiptType::Other(tag) => f.write_str(tag),
        }
    }
}

/// Typed view of one inward lot.
///
/// Built once per record from the raw document; all reconciliation steps
/// work from this view rather than the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryRecord {
    pub id: String,
    pub lot_id: String,
    pub receipt_type: Option<ReceiptType>,
    pub created_at: Option<DateTime<Utc>>,
    pub state: Option<String>,
    pub branch: Option<String>,
    pub location: Option<String>,
    pub warehouse_name: Option<String>,
    pub warehouse_location: Option<String>,
    pub warehouse_type: Option<String>,
    pub warehouse_code: Option<String>,
    pub client_name: Option<String>,
    pub client_code: Option<String>,
    pub commodity: Option<String>,
    pub variety: Option<String>,
    pub total_bags: i64,
    pub total_quantity: Decimal,
    pub bank_name: Option<String>,
    pub bank_branch: Option<String>,
    pub ifsc_code: Option<String>,
    pub insurance_managed_by: Option<String>,
    pub rate: Option<Decimal>,
}

impl PrimaryRecord {
    /// Resolves the typed view; fails only when no lot identifier exists.
    pub fn from_document(doc: &Document) -> Result<Self, ServiceError> {
        let lot_id = inward::LOT_ID.text(doc).ok_or_else(|| {
            ServiceError::InvalidPrimaryRecord(format!(
                "no lot identifier under any of {:?}",
                inward::LOT_ID.paths
            ))
        })?;
        let id = inward::ID.text(doc).unwrap_or_else(|| lot_id.clone());
        let receipt_type = inward::RECEIPT_TYPE
            .text(doc)
            .and_then(|raw| raw.parse().ok());

        Ok(Self {
            id,
            lot_id,
            receipt_type,
            created_at: inward::CREATED_AT.timestamp(doc),
            state: inward::STATE.text(doc),
            branch: inward::BRANCH.text(doc),
            location: inward::LOCATION.text(doc),
            warehouse_name: inward::WAREHOUSE_NAME.text(doc),
            warehouse_location: inward::WAREHOUSE_LOCATION.text(doc),
            warehouse_type: inward::WAREHOUSE_TYPE.text(doc),
            warehouse_code: inward::WAREHOUSE_CODE.text(doc),
            client_name: inward::CLIENT_NAME.text(doc),
            client_code: inward::CLIENT_CODE.text(doc),
            commodity: inward::COMMODITY.text(doc),
            variety: inward::VARIETY.text(doc),
            total_bags: inward::TOTAL_BAGS.count(doc).unwrap_or(0),
            total_quantity: inward::TOTAL_QUANTITY.decimal(doc).unwrap_or_default(),
            bank_name: inward::BANK_NAME.text(doc),
            bank_branch: inward::BANK_BRANCH.text(doc),
            ifsc_code: inward::IFSC.text(doc),
            insurance_managed_by: inward::INSURANCE.text(doc),
            rate: inward::RATE.decimal(doc),
        })
    }

    pub fn inward_date(&self) -> Option<NaiveDate> {
        self.created_at.map(|ts| ts.date_naive())
    }

    /// `{tag}-{lotId}`, the receipt number shown when no event carries one.
    pub fn receipt_number(&self) -> Option<String> {
        self.receipt_type
            .as_ref()
            .map(|tag| format!("{}-{}", tag, self.lot_id))
    }
}

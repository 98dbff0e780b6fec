use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::fields::table::events::{self, delivery, release};
use crate::fields::Concept;
use crate::models::{Collection, Document};

/// Lifecycle status of a release or delivery event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EventStatus {
    Pending,
    Approved,
    Rejected,
    Other,
}

impl EventStatus {
    /// Parses a stored status; anything unrecognized or absent is `Other`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .and_then(|s| s.parse().ok())
            .unwrap_or(EventStatus::Other)
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, EventStatus::Approved)
    }
}

/// Which one-to-many relation an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    Release,
    Delivery,
}

impl EventKind {
    pub fn collection(&self) -> Collection {
        match self {
            EventKind::Release => Collection::ReleaseOrders,
            EventKind::Delivery => Collection::DeliveryOrders,
        }
    }

    fn status(&self) -> Concept {
        match self {
            EventKind::Release => release::STATUS,
            EventKind::Delivery => delivery::STATUS,
        }
    }

    fn bags(&self) -> Concept {
        match self {
            EventKind::Release => release::BAGS,
            EventKind::Delivery => delivery::BAGS,
        }
    }

    fn quantity(&self) -> Concept {
        match self {
            EventKind::Release => release::QUANTITY,
            EventKind::Delivery => delivery::QUANTITY,
        }
    }

    fn event_date(&self) -> Concept {
        match self {
            EventKind::Release => release::EVENT_DATE,
            EventKind::Delivery => delivery::EVENT_DATE,
        }
    }
}

/// Typed view of a release or delivery event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationEvent {
    pub kind: EventKind,
    pub status: EventStatus,
    /// Non-numeric or absent counts are 0.
    pub bags: i64,
    pub quantity: Decimal,
    pub event_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub funding_date: Option<DateTime<Utc>>,
    pub validity_date: Option<DateTime<Utc>>,
    pub rate: Option<Decimal>,
    pub insurance_ref: Option<String>,
    pub bank_name: Option<String>,
    pub bank_branch: Option<String>,
    pub ifsc_code: Option<String>,
    pub identifier: Option<String>,
    pub commodity: Option<String>,
    pub variety: Option<String>,
}

impl RelationEvent {
    pub fn from_document(kind: EventKind, doc: &Document) -> Self {
        let status_text = kind.status().text(doc);
        Self {
            kind,
            status: EventStatus::parse_lenient(status_text.as_deref()),
            bags: kind.bags().count(doc).unwrap_or(0),
            quantity: kind.quantity().decimal(doc).unwrap_or_default(),
            event_date: kind.event_date().timestamp(doc),
            created_at: events::CREATED_AT.timestamp(doc),
            funding_date: events::FUNDING_DATE.timestamp(doc),
            validity_date: events::VALIDITY_DATE.timestamp(doc),
            rate: events::RATE.decimal(doc),
            insurance_ref: events::INSURANCE.text(doc),
            bank_name: events::BANK_NAME.text(doc),
            bank_branch: events::BANK_BRANCH.text(doc),
            ifsc_code: events::IFSC.text(doc),
            identifier: events::IDENTIFIER.text(doc),
            commodity: events::COMMODITY.text(doc),
            variety: events::VARIETY.text(doc),
        }
    }

    /// True when the event references a financing bank.
    pub fn has_funding_reference(&self) -> bool {
        self.bank_name.is_some() || self.bank_branch.is_some() || self.ifsc_code.is_some()
    }

    /// The event's own date: its creation time, else its business date.
    pub fn own_date(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.event_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[rstest]
    #[case(Some("approved"), EventStatus::Approved)]
    #[case(Some(" APPROVED "), EventStatus::Approved)]
    #[case(Some("Pending"), EventStatus::Pending)]
    #[case(Some("rejected"), EventStatus::Rejected)]
    #[case(Some("approved-by-manager"), EventStatus::Other)]
    #[case(None, EventStatus::Other)]
    fn status_parsing(#[case] raw: Option<&str>, #[case] expected: EventStatus) {
        assert_eq!(EventStatus::parse_lenient(raw), expected);
    }

    #[test]
    fn release_and_delivery_read_their_own_spellings() {
        let doc = Document::from_value(json!({
            "roStatus": "approved",
            "doStatus": "pending",
            "releaseBags": 120,
            "deliveryBags": 30,
            "releasedQuantity": "12.0",
            "deliveredQuantity": "3.0"
        }))
        .unwrap();

        let release = RelationEvent::from_document(EventKind::Release, &doc);
        assert_eq!(release.status, EventStatus::Approved);
        assert_eq!(release.bags, 120);
        assert_eq!(release.quantity, dec!(12.0));

        let delivery = RelationEvent::from_document(EventKind::Delivery, &doc);
        assert_eq!(delivery.status, EventStatus::Pending);
        assert_eq!(delivery.bags, 30);
        assert_eq!(delivery.quantity, dec!(3));
    }

    #[test]
    fn generic_status_field_is_a_fallback() {
        let doc = Document::from_value(json!({"status": "Approved", "bags": "x"})).unwrap();
        let event = RelationEvent::from_document(EventKind::Delivery, &doc);
        assert!(event.status.is_approved());
        assert_eq!(event.bags, 0);
        assert!(!event.has_funding_reference());
    }
}

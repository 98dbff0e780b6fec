use serde::Serialize;

use crate::models::PrimaryRecord;

/// How a candidate key was built, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum KeyStrategy {
    /// `{tag}-{lotId}-{YYYY-MM-DD}`
    TagLotDate,
    /// `{tag}-{lotId}`
    TagLot,
    /// `{lotId}`
    BareLot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateKey {
    pub strategy: KeyStrategy,
    pub key: String,
}

/// Candidate keys for probing event collections, in probe order.
///
/// Strategies whose inputs are missing are left out; the bare lot id is
/// always present because a [`PrimaryRecord`] cannot exist without one.
pub fn generate_keys(primary: &PrimaryRecord) -> Vec<CandidateKey> {
    let mut keys = Vec::with_capacity(3);

    if let Some(tag) = &primary.receipt_type {
        if let Some(date) = primary.inward_date() {
            keys.push(CandidateKey {
                strategy: KeyStrategy::TagLotDate,
                key: format!("{}-{}-{}", tag, primary.lot_id, date.format("%Y-%m-%d")),
            });
        }
        keys.push(CandidateKey {
            strategy: KeyStrategy::TagLot,
            key: format!("{}-{}", tag, primary.lot_id),
        });
    }
    keys.push(CandidateKey {
        strategy: KeyStrategy::BareLot,
        key: primary.lot_id.clone(),
    });

    keys
}

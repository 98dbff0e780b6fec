use rust_decimal::Decimal;
use serde::Serialize;

/// Remaining stock of a lot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub bags: i64,
    pub quantity: Decimal,
}

/// `max(0, total - released - delivered)` for bags and quantity.
///
/// Callers pass 0 for anything absent or non-numeric. Never negative.
pub fn compute_balance(
    total_bags: i64,
    total_quantity: Decimal,
    released_bags: i64,
    released_quantity: Decimal,
    delivered_bags: i64,
    delivered_quantity: Decimal,
) -> Balance {
    let bags = total_bags
        .saturating_sub(released_bags)
        .saturating_sub(delivered_bags)
        .max(0);

    let quantity = total_quantity
        .saturating_sub(released_quantity)
        .saturating_sub(delivered_quantity)
        .max(Decimal::ZERO);

    Balance { bags, quantity }
}

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;
use warehouse_recon::{
    config::ReportConfig, diagnostics::ReportContext, models::Collection,
    repositories::InMemoryStore, services::reports::ReportBatchDriver,
};

fn sample_dataset() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/sample_dataset.json")
}

#[tokio::test]
async fn sample_dataset_reconciles_end_to_end() {
    let store = InMemoryStore::from_path(sample_dataset()).unwrap();
    assert_eq!(store.len(Collection::Inward), 3);

    let driver = ReportBatchDriver::from_config(Arc::new(store), &ReportConfig::default());
    let ctx = ReportContext::new();
    let rows = driver
        .run(&common::july(), &ctx, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(ctx.skipped().len(), 1);

    let wheat = &rows[0];
    assert_eq!(wheat.lot_id, "INW-047");
    assert_eq!(wheat.commodity.as_deref(), Some("Wheat"));
    assert_eq!(wheat.warehouse_type.as_deref(), Some("Private"));
    assert_eq!(wheat.bank_branch.as_deref(), Some("Vijay Nagar"));
    assert_eq!(wheat.ifsc_code.as_deref(), Some("SBIN0002"));
    assert_eq!(wheat.insurance_managed_by.as_deref(), Some("Client"));
    assert_eq!(wheat.rate, Some(dec!(42.50)));
    assert_eq!(wheat.released_bags, 120);
    assert_eq!(wheat.balance_bags, 380);
    assert_eq!(wheat.balance_quantity, dec!(38.0));
    assert_eq!(
        wheat.funding_date,
        Some(common::date(2025, 8, 1))
    );
    assert_eq!(wheat.validity_date, Some(common::date(2026, 1, 31)));

    let soybean = &rows[1];
    assert_eq!(soybean.lot_id, "INW-051");
    assert_eq!(soybean.receipt_number.as_deref(), Some("WR-INW-051"));
    assert_eq!(soybean.bank_name.as_deref(), Some("Union Bank"));
    assert_eq!(soybean.client_firm_name.as_deref(), Some("Kisan Agro Industries"));
    assert_eq!(soybean.delivered_bags, 40);
    assert_eq!(soybean.balance_bags, 160);
    assert_eq!(soybean.balance_quantity, dec!(16));
}

#[test]
fn malformed_dataset_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"inward\": [ ").unwrap();

    assert!(InMemoryStore::from_path(&path).is_err());
}

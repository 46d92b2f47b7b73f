#![allow(dead_code)]

use std::sync::Arc;

use category_core::{
    config::EngineConfig,
    core::{services::InMemoryBackend, EngineServices},
    domain::{CategoryRecord, RecordSnapshot, TransactionRecord, VendorRecord, VendorRule},
    CategoryEditor,
};
use chrono::NaiveDate;
use uuid::Uuid;

pub const FOOD: Uuid = Uuid::from_u128(1);
pub const DINING: Uuid = Uuid::from_u128(2);
pub const GROCERIES: Uuid = Uuid::from_u128(3);
pub const JUMBO: Uuid = Uuid::from_u128(10);
pub const GROCERY_TXN: Uuid = Uuid::from_u128(20);
pub const JUMBO_RULE: Uuid = Uuid::from_u128(30);

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).expect("valid test date")
}

/// Food > {Dining, Groceries}, vendor Jumbo filed under Groceries, one 42.00
/// outflow booked on Groceries.
pub fn grocery_snapshot() -> RecordSnapshot {
    let mut txn = TransactionRecord::outflow(42.0, date(3)).in_category(GROCERIES);
    txn.id = GROCERY_TXN;
    RecordSnapshot {
        categories: vec![
            CategoryRecord::new("Food").with_id(FOOD),
            CategoryRecord::new("Dining").with_id(DINING).with_parent(Some(FOOD)),
            CategoryRecord::new("Groceries")
                .with_id(GROCERIES)
                .with_parent(Some(FOOD)),
        ],
        vendors: vec![VendorRecord::new("Jumbo", Some(GROCERIES)).with_id(JUMBO)],
        transactions: vec![txn],
        rules: Vec::new(),
    }
}

/// Same records plus a persistent rule filing Jumbo under Groceries.
pub fn grocery_snapshot_with_rule() -> RecordSnapshot {
    let mut snapshot = grocery_snapshot();
    snapshot
        .rules
        .push(VendorRule::persistent("Jumbo", GROCERIES).with_id(JUMBO_RULE));
    snapshot
}

/// Editor over an in-memory backend seeded with `snapshot`, already refreshed.
pub async fn editor_for(snapshot: RecordSnapshot) -> (CategoryEditor, Arc<InMemoryBackend>) {
    let backend = Arc::new(InMemoryBackend::from_snapshot(snapshot));
    let mut editor = CategoryEditor::new(
        EngineServices::shared(backend.clone()),
        &EngineConfig::default(),
    );
    editor.refresh().await.expect("initial refresh");
    (editor, backend)
}

use crate::workflows::allocation::domain::FlatType;
use crate::workflows::allocation::inventory::{InventoryError, InventoryLedger, UnitCount};

fn ledger() -> InventoryLedger {
    let mut ledger = InventoryLedger::new();
    ledger
        .register("Acacia Breeze", FlatType::TwoRoom, 2, 1)
        .expect("consistent counts");
    ledger
}

#[test]
fn register_rejects_more_available_than_total() {
    let mut ledger = InventoryLedger::new();
    let err = ledger
        .register("Acacia Breeze", FlatType::ThreeRoom, 1, 2)
        .expect_err("inconsistent counts rejected");

    assert!(matches!(err, InventoryError::Inconsistent { total: 1, available: 2, .. }));
    assert_eq!(ledger.units("Acacia Breeze", FlatType::ThreeRoom), None);
}

#[test]
fn decrement_and_increment_stay_within_bounds() {
    let mut ledger = ledger();

    let after_booking = ledger
        .decrement("Acacia Breeze", FlatType::TwoRoom)
        .expect("one unit left");
    assert_eq!(after_booking, UnitCount { total: 2, available: 0 });
    assert_eq!(after_booking.booked(), 2);

    let err = ledger
        .decrement("Acacia Breeze", FlatType::TwoRoom)
        .expect_err("sold out");
    assert!(matches!(err, InventoryError::Exhausted { .. }));
    assert_eq!(ledger.available("Acacia Breeze", FlatType::TwoRoom), 0);

    ledger
        .increment("Acacia Breeze", FlatType::TwoRoom)
        .expect("release one");
    ledger
        .increment("Acacia Breeze", FlatType::TwoRoom)
        .expect("release another");
    let err = ledger
        .increment("Acacia Breeze", FlatType::TwoRoom)
        .expect_err("cannot exceed total");
    assert_eq!(
        err,
        InventoryError::Overflow {
            project: "Acacia Breeze".to_string(),
            flat_type: FlatType::TwoRoom,
            total: 2,
        }
    );
    assert_eq!(ledger.available("Acacia Breeze", FlatType::TwoRoom), 2);
}

#[test]
fn unknown_entries_are_reported() {
    let mut ledger = ledger();

    assert!(matches!(
        ledger.decrement("Acacia Breeze", FlatType::ThreeRoom),
        Err(InventoryError::UnknownEntry { .. })
    ));
    assert!(matches!(
        ledger.increment("Begonia Court", FlatType::TwoRoom),
        Err(InventoryError::UnknownEntry { .. })
    ));
    assert_eq!(ledger.available("Begonia Court", FlatType::TwoRoom), 0);
    assert_eq!(
        ledger.project_units("Acacia Breeze"),
        vec![(FlatType::TwoRoom, UnitCount { total: 2, available: 1 })]
    );
}

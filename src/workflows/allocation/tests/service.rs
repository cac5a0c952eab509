use std::sync::Arc;

use super::common::*;
use crate::workflows::allocation::applications::WithdrawalOutcome;
use crate::workflows::allocation::clock::FixedClock;
use crate::workflows::allocation::domain::{ApplicationStatus, FlatType};
use crate::workflows::allocation::eligibility::EligibilityConfig;
use crate::workflows::allocation::error::LifecycleError;
use crate::workflows::allocation::repository::PersistenceError;
use crate::workflows::allocation::service::AllocationService;
use crate::workflows::allocation::store::MemoryGateway;

fn service() -> (Arc<MemoryGateway>, AllocationService<MemoryGateway, FixedClock>) {
    let gateway = Arc::new(MemoryGateway::new(seeded()));
    let service = AllocationService::open(
        gateway.clone(),
        Arc::new(FixedClock::on(today())),
        EligibilityConfig::default(),
    )
    .expect("memory gateway loads");
    (gateway, service)
}

#[test]
fn every_committed_transition_is_saved() {
    let (gateway, mut service) = service();
    assert_eq!(gateway.saves(), 0);

    let application = service
        .apply(&nric(SINGLE), ACACIA, Some(FlatType::TwoRoom))
        .expect("applied");
    service
        .approve_application(&application.id, &nric(MANAGER))
        .expect("approved");
    assert_eq!(gateway.saves(), 2);

    let stored = gateway.stored().expect("stored snapshot");
    assert_eq!(
        stored.applications[&application.id].status,
        ApplicationStatus::Successful
    );
}

#[test]
fn rejected_operations_do_not_save() {
    let (gateway, mut service) = service();

    let err = service
        .apply(&nric(YOUNG_SINGLE), ACACIA, None)
        .expect_err("too young");
    assert!(matches!(err, LifecycleError::Eligibility { .. }));
    assert_eq!(gateway.saves(), 0);
    assert!(service.snapshot().applications.is_empty());
}

#[test]
fn declined_withdrawals_leave_the_store_untouched() {
    let (gateway, mut service) = service();
    let application = service
        .apply(&nric(MARRIED), ACACIA, None)
        .expect("applied");
    let saves = gateway.saves();

    let outcome = service
        .withdraw(&application.id, &nric(MANAGER), false)
        .expect("declined");
    assert_eq!(outcome, WithdrawalOutcome::Declined);
    assert_eq!(gateway.saves(), saves);
}

#[test]
fn failed_saves_surface_without_rolling_back() {
    let (gateway, mut service) = service();
    gateway.fail_saves(true);

    let err = service
        .apply(&nric(MARRIED), ACACIA, None)
        .expect_err("store rejects the write");
    assert!(matches!(
        err,
        LifecycleError::Persistence(PersistenceError::Unavailable(_))
    ));
    assert!(!err.is_user_facing());

    assert_eq!(service.snapshot().applications.len(), 1);
    assert!(gateway.stored().expect("stored").applications.is_empty());

    gateway.fail_saves(false);
    let err = service
        .apply(&nric(MARRIED), ACACIA, None)
        .expect_err("the earlier application still binds the applicant");
    assert!(matches!(err, LifecycleError::Conflict(_)));
}

#[test]
fn queries_read_the_current_snapshot() {
    let (_gateway, mut service) = service();
    let application = service
        .apply(&nric(SINGLE), ACACIA, Some(FlatType::TwoRoom))
        .expect("applied");
    let registration = service
        .register_officer(&nric(OFFICER), ACACIA)
        .expect("registered");
    service
        .approve_registration(&registration.id, &nric(MANAGER))
        .expect("approved");
    service
        .approve_application(&application.id, &nric(MANAGER))
        .expect("approved");
    service
        .book_flat(&application.id, &nric(OFFICER), FlatType::TwoRoom)
        .expect("booked");

    assert_eq!(
        service
            .snapshot()
            .ledger
            .available(ACACIA, FlatType::TwoRoom),
        1
    );
    let receipt = service
        .booking_receipt(&application.id, &nric(SINGLE))
        .expect("receipt");
    assert_eq!(receipt.price, 350_000);

    let listings = service.visible_projects(&nric(SINGLE)).expect("listings");
    assert_eq!(listings.len(), 1);
    assert_eq!(service.applications_by(&nric(SINGLE)).len(), 1);
}

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::common::*;
use crate::workflows::allocation::domain::{ApplicationStatus, FlatType};
use crate::workflows::allocation::eligibility::EligibilityConfig;
use crate::workflows::allocation::error::{Conflict, LifecycleError, ValidationError};
use crate::workflows::allocation::inventory::UnitCount;
use crate::workflows::allocation::snapshot::Snapshot;
use crate::workflows::allocation::projects::{
    listings_for, FlatSupply, ProjectCatalog, ProjectDraft,
};

fn draft(name: &str, opening: NaiveDate, closing: NaiveDate, officer_slots: u32) -> ProjectDraft {
    ProjectDraft {
        name: name.to_string(),
        neighborhood: "Tampines".to_string(),
        flats: BTreeMap::from([
            (
                FlatType::TwoRoom,
                FlatSupply {
                    units: 4,
                    price: 320_000,
                },
            ),
            (
                FlatType::ThreeRoom,
                FlatSupply {
                    units: 6,
                    price: 410_000,
                },
            ),
        ]),
        opening_date: opening,
        closing_date: closing,
        officer_slots,
        visible: false,
    }
}

#[test]
fn create_registers_units_with_the_ledger() {
    let mut state = seeded();
    let config = EligibilityConfig::default();

    let project = ProjectCatalog::new(&mut state, &config)
        .create(
            &nric(OTHER_MANAGER),
            draft(BEGONIA, date(2025, 3, 1), date(2025, 3, 31), 3),
            today(),
        )
        .expect("project created");

    assert_eq!(project.manager, nric(OTHER_MANAGER));
    assert_eq!(project.flat_prices.get(&FlatType::ThreeRoom), Some(&410_000));
    assert!(!project.visible);
    assert_eq!(
        state.ledger.units(BEGONIA, FlatType::TwoRoom),
        Some(UnitCount {
            total: 4,
            available: 4
        })
    );
    assert_eq!(state.ledger.available(BEGONIA, FlatType::ThreeRoom), 6);
}

#[test]
fn names_are_unique_and_manager_windows_do_not_overlap() {
    let mut state = seeded();
    let config = EligibilityConfig::default();

    let err = ProjectCatalog::new(&mut state, &config)
        .create(
            &nric(OTHER_MANAGER),
            draft(ACACIA, date(2025, 3, 1), date(2025, 3, 31), 3),
            today(),
        )
        .expect_err("duplicate name");
    assert!(matches!(
        err,
        LifecycleError::Conflict(Conflict::DuplicateProject(_))
    ));

    let err = ProjectCatalog::new(&mut state, &config)
        .create(
            &nric(MANAGER),
            draft(BEGONIA, date(2025, 2, 28), date(2025, 3, 31), 3),
            today(),
        )
        .expect_err("shares the closing day of Acacia Breeze");
    match err {
        LifecycleError::Conflict(Conflict::ManagerWindowOverlap { existing, .. }) => {
            assert_eq!(existing, ACACIA)
        }
        other => panic!("unexpected error: {other}"),
    }

    ProjectCatalog::new(&mut state, &config)
        .create(
            &nric(MANAGER),
            draft(BEGONIA, date(2025, 3, 1), date(2025, 3, 31), 3),
            today(),
        )
        .expect("back-to-back windows are fine");
}

#[test]
fn drafts_are_validated() {
    let mut state = seeded();
    let config = EligibilityConfig::default();
    let manager = nric(OTHER_MANAGER);

    for slots in [0, config.max_officer_slots + 1] {
        let err = ProjectCatalog::new(&mut state, &config)
            .create(
                &manager,
                draft(BEGONIA, date(2025, 3, 1), date(2025, 3, 31), slots),
                today(),
            )
            .expect_err("slots out of range");
        match err {
            LifecycleError::Validation(ValidationError::OfficerSlots { found, .. }) => {
                assert_eq!(found, slots)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    let err = ProjectCatalog::new(&mut state, &config)
        .create(
            &manager,
            draft(BEGONIA, date(2025, 3, 31), date(2025, 3, 1), 3),
            today(),
        )
        .expect_err("closing before opening");
    assert!(matches!(
        err,
        LifecycleError::Validation(ValidationError::InvalidWindow { .. })
    ));

    let mut empty = draft(BEGONIA, date(2025, 3, 1), date(2025, 3, 31), 3);
    empty.flats.clear();
    let err = ProjectCatalog::new(&mut state, &config)
        .create(&manager, empty, today())
        .expect_err("no flats");
    assert!(matches!(
        err,
        LifecycleError::Validation(ValidationError::NoFlatTypes)
    ));
    assert!(!state.projects.contains_key(BEGONIA));
}

#[test]
fn only_managers_create_and_only_the_owner_toggles_visibility() {
    let mut state = seeded();
    let config = EligibilityConfig::default();

    let err = ProjectCatalog::new(&mut state, &config)
        .create(
            &nric(OFFICER),
            draft(BEGONIA, date(2025, 3, 1), date(2025, 3, 31), 3),
            today(),
        )
        .expect_err("officers cannot create projects");
    assert!(matches!(err, LifecycleError::Authorization { .. }));

    let err = ProjectCatalog::new(&mut state, &config)
        .set_visibility(&nric(OTHER_MANAGER), ACACIA, false)
        .expect_err("not the owning manager");
    assert!(matches!(err, LifecycleError::Authorization { .. }));

    let project = ProjectCatalog::new(&mut state, &config)
        .set_visibility(&nric(MANAGER), ACACIA, false)
        .expect("owner hides the project");
    assert!(!project.visible);
    assert!(!state.projects[ACACIA].visible);
}

#[test]
fn listings_follow_visibility_and_eligibility() {
    let mut state = seeded();
    let mut hidden = project(BEGONIA, OTHER_MANAGER, date(2025, 3, 1), date(2025, 3, 31), 2);
    hidden.visible = false;
    add_project(&mut state, hidden, 1, 1);
    let evaluator = evaluator();
    let names = |viewer: &str, state: &Snapshot| {
        let person = state.persons[&nric(viewer)].clone();
        listings_for(state, &evaluator, &person, today())
            .into_iter()
            .map(|listing| listing.name)
            .collect::<Vec<_>>()
    };

    assert_eq!(names(MANAGER, &state), vec![ACACIA, BEGONIA]);
    assert_eq!(names(SINGLE, &state), vec![ACACIA]);
    assert!(names(YOUNG_SINGLE, &state).is_empty());

    insert_application(
        &mut state,
        "APP0001",
        MARRIED,
        BEGONIA,
        None,
        ApplicationStatus::Pending,
    );
    assert_eq!(names(MARRIED, &state), vec![ACACIA, BEGONIA]);

    assign_officer(&mut state, BEGONIA, OTHER_OFFICER);
    assert!(names(OTHER_OFFICER, &state).contains(&BEGONIA.to_string()));
}

#[test]
fn listing_marks_eligible_flat_types_and_open_windows() {
    let state = seeded();
    let single = state.persons[&nric(SINGLE)].clone();

    let listings = listings_for(&state, &evaluator(), &single, today());
    let acacia = &listings[0];
    assert!(acacia.open_now);
    let eligible: Vec<_> = acacia
        .flats
        .iter()
        .map(|flat| (flat.flat_type, flat.eligible, flat.available_units))
        .collect();
    assert_eq!(
        eligible,
        vec![(FlatType::TwoRoom, true, 2), (FlatType::ThreeRoom, false, 1)]
    );

    let closed = listings_for(&state, &evaluator(), &single, date(2025, 3, 1));
    assert!(!closed[0].open_now);
}

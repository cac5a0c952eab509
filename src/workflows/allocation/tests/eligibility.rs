use super::common::*;
use crate::workflows::allocation::domain::{ApplicationStatus, FlatType, MaritalStatus, Role};
use crate::workflows::allocation::eligibility::{
    EligibilityConfig, EligibilityEvaluator, Ineligibility,
};

#[test]
fn single_applicants_qualify_for_two_room_from_thirty_five() {
    let evaluator = evaluator();
    let state = seeded();
    let single = state.person(&nric(SINGLE)).expect("single");
    let young = state.person(&nric(YOUNG_SINGLE)).expect("young single");

    assert!(evaluator.is_eligible(single, FlatType::TwoRoom));
    assert!(!evaluator.is_eligible(single, FlatType::ThreeRoom));
    assert_eq!(
        evaluator.check_flat_type(young, FlatType::TwoRoom),
        Err(Ineligibility::BelowMinimumAge {
            marital_status: MaritalStatus::Single,
            age: 34,
            minimum: 35,
        })
    );
}

#[test]
fn married_applicants_qualify_for_any_type_from_twenty_one() {
    let evaluator = evaluator();
    let state = seeded();
    let married = state.person(&nric(MARRIED)).expect("married");
    let young = state.person(&nric(YOUNG_MARRIED)).expect("young married");
    let project = state.project(ACACIA).expect("project");

    assert_eq!(
        evaluator.eligible_flat_types(married, project),
        vec![FlatType::TwoRoom, FlatType::ThreeRoom]
    );
    assert!(evaluator.eligible_flat_types(young, project).is_empty());
}

#[test]
fn thresholds_follow_configuration() {
    let evaluator = EligibilityEvaluator::new(EligibilityConfig {
        single_minimum_age: 30,
        ..EligibilityConfig::default()
    });
    let state = seeded();
    let young = state.person(&nric(YOUNG_SINGLE)).expect("young single");

    assert!(evaluator.is_eligible(young, FlatType::TwoRoom));
}

#[test]
fn application_checks_report_the_first_broken_rule() {
    let evaluator = evaluator();
    let mut state = seeded();
    let manager = state.person(&nric(MANAGER)).expect("manager").clone();
    let single = state.person(&nric(SINGLE)).expect("single").clone();
    let project = state.project(ACACIA).expect("project").clone();

    assert_eq!(
        evaluator.check_application(&state, &manager, &project, today()),
        Err(Ineligibility::MissingRole(Role::Applicant))
    );
    assert!(evaluator.can_apply(&state, &single, &project, today()));
    assert!(matches!(
        evaluator.check_application(&state, &single, &project, date(2025, 3, 1)),
        Err(Ineligibility::OutsideWindow { .. })
    ));

    state.projects.get_mut(ACACIA).expect("project").visible = false;
    let hidden = state.project(ACACIA).expect("project").clone();
    assert_eq!(
        evaluator.check_application(&state, &single, &hidden, today()),
        Err(Ineligibility::ProjectHidden)
    );
}

#[test]
fn bound_applicants_cannot_apply_again() {
    let evaluator = evaluator();
    let mut state = seeded();
    let id = insert_application(
        &mut state,
        "APP0001",
        SINGLE,
        ACACIA,
        Some(FlatType::TwoRoom),
        ApplicationStatus::Booked,
    );
    let single = state.person(&nric(SINGLE)).expect("single");
    let project = state.project(ACACIA).expect("project");

    assert_eq!(
        evaluator.check_application(&state, single, project, today()),
        Err(Ineligibility::ActiveApplication(id))
    );
}

#[test]
fn unsuccessful_applications_release_the_applicant() {
    let evaluator = evaluator();
    let mut state = seeded();
    insert_application(
        &mut state,
        "APP0001",
        SINGLE,
        ACACIA,
        None,
        ApplicationStatus::Unsuccessful,
    );
    let single = state.person(&nric(SINGLE)).expect("single");
    let project = state.project(ACACIA).expect("project");

    assert!(evaluator.can_apply(&state, single, project, today()));
}

#[test]
fn handling_officers_cannot_apply_to_their_project() {
    let evaluator = evaluator();
    let mut state = seeded();
    assign_officer(&mut state, ACACIA, OFFICER);
    let officer = state.person(&nric(OFFICER)).expect("officer");
    let project = state.project(ACACIA).expect("project");

    assert_eq!(
        evaluator.check_application(&state, officer, project, today()),
        Err(Ineligibility::HandlesProject)
    );
}

#[test]
fn officers_who_applied_cannot_register_for_the_same_project() {
    let evaluator = evaluator();
    let mut state = seeded();
    let id = insert_application(
        &mut state,
        "APP0001",
        OFFICER,
        ACACIA,
        None,
        ApplicationStatus::Pending,
    );
    let officer = state.person(&nric(OFFICER)).expect("officer");
    let project = state.project(ACACIA).expect("project");

    assert_eq!(
        evaluator.check_registration(&state, officer, project),
        Err(Ineligibility::AppliedToProject(id))
    );
}

#[test]
fn registration_rejects_overlapping_assignments_and_full_projects() {
    let evaluator = evaluator();
    let mut state = seeded();
    add_project(
        &mut state,
        project(BEGONIA, OTHER_MANAGER, date(2025, 2, 20), date(2025, 3, 20), 1),
        1,
        1,
    );
    assign_officer(&mut state, ACACIA, OFFICER);

    let officer = state.person(&nric(OFFICER)).expect("officer");
    let begonia = state.project(BEGONIA).expect("project");
    assert_eq!(
        evaluator.check_registration(&state, officer, begonia),
        Err(Ineligibility::OverlappingAssignment {
            project: ACACIA.to_string()
        })
    );

    state.projects.get_mut(BEGONIA).expect("project").officer_slots = 0;
    let other = state.person(&nric(OTHER_OFFICER)).expect("officer");
    let begonia = state.project(BEGONIA).expect("project");
    assert!(!evaluator.can_register_as_officer(&state, other, begonia));
    assert_eq!(
        evaluator.check_registration(&state, other, begonia),
        Err(Ineligibility::NoOfficerSlots)
    );
}

#[test]
fn applicants_need_the_officer_role_to_register() {
    let evaluator = evaluator();
    let state = seeded();
    let single = state.person(&nric(SINGLE)).expect("single");
    let project = state.project(ACACIA).expect("project");

    assert_eq!(
        evaluator.check_registration(&state, single, project),
        Err(Ineligibility::MissingRole(Role::Officer))
    );
}

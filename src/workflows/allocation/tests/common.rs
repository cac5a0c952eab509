use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::workflows::allocation::domain::{
    Application, ApplicationId, ApplicationStatus, FlatType, MaritalStatus, Nric, Person,
    Project, Role,
};
use crate::workflows::allocation::eligibility::{EligibilityConfig, EligibilityEvaluator};
use crate::workflows::allocation::snapshot::Snapshot;

pub(super) const MANAGER: &str = "S5678901G";
pub(super) const OTHER_MANAGER: &str = "T8765432F";
pub(super) const OFFICER: &str = "T2109876H";
pub(super) const OTHER_OFFICER: &str = "S6543210I";
pub(super) const SINGLE: &str = "S1234567A";
pub(super) const YOUNG_SINGLE: &str = "T7654321B";
pub(super) const MARRIED: &str = "T2345678C";
pub(super) const YOUNG_MARRIED: &str = "S9876543D";

pub(super) const ACACIA: &str = "Acacia Breeze";
pub(super) const BEGONIA: &str = "Begonia Court";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Date inside the Acacia Breeze application window.
pub(super) fn today() -> NaiveDate {
    date(2025, 2, 15)
}

pub(super) fn nric(raw: &str) -> Nric {
    Nric::parse(raw).expect("fixture NRIC is well formed")
}

pub(super) fn evaluator() -> EligibilityEvaluator {
    EligibilityEvaluator::new(EligibilityConfig::default())
}

pub(super) fn person(
    name: &str,
    raw_nric: &str,
    age: u8,
    marital_status: MaritalStatus,
    roles: &[Role],
) -> Person {
    Person {
        name: name.to_string(),
        nric: nric(raw_nric),
        age,
        marital_status,
        password: "password".to_string(),
        roles: roles.iter().copied().collect::<BTreeSet<_>>(),
    }
}

pub(super) fn people() -> Vec<Person> {
    vec![
        person("Michael", MANAGER, 45, MaritalStatus::Married, &[Role::Manager]),
        person("Jessica", OTHER_MANAGER, 39, MaritalStatus::Single, &[Role::Manager]),
        person(
            "Daniel",
            OFFICER,
            36,
            MaritalStatus::Single,
            &[Role::Applicant, Role::Officer],
        ),
        person(
            "Emily",
            OTHER_OFFICER,
            28,
            MaritalStatus::Married,
            &[Role::Applicant, Role::Officer],
        ),
        person("John", SINGLE, 35, MaritalStatus::Single, &[Role::Applicant]),
        person("Sarah", YOUNG_SINGLE, 34, MaritalStatus::Single, &[Role::Applicant]),
        person("Grace", MARRIED, 37, MaritalStatus::Married, &[Role::Applicant]),
        person("Ivan", YOUNG_MARRIED, 20, MaritalStatus::Married, &[Role::Applicant]),
    ]
}

pub(super) fn project(
    name: &str,
    manager: &str,
    opening: NaiveDate,
    closing: NaiveDate,
    officer_slots: u32,
) -> Project {
    Project {
        name: name.to_string(),
        neighborhood: "Yishun".to_string(),
        flat_prices: BTreeMap::from([(FlatType::TwoRoom, 350_000), (FlatType::ThreeRoom, 450_000)]),
        opening_date: opening,
        closing_date: closing,
        manager: nric(manager),
        officer_slots,
        officers: BTreeSet::new(),
        visible: true,
    }
}

/// Adds `project` and its unit counts to `state`.
pub(super) fn add_project(state: &mut Snapshot, project: Project, two_room: u32, three_room: u32) {
    state
        .ledger
        .register(&project.name, FlatType::TwoRoom, two_room, two_room)
        .expect("register 2-Room units");
    state
        .ledger
        .register(&project.name, FlatType::ThreeRoom, three_room, three_room)
        .expect("register 3-Room units");
    state.projects.insert(project.name.clone(), project);
}

/// Everyone from [`people`] plus Acacia Breeze (Feb 2025, two 2-Room and one
/// 3-Room unit, two officer slots) managed by `MANAGER`.
pub(super) fn seeded() -> Snapshot {
    let mut state = Snapshot::default();
    for person in people() {
        state.persons.insert(person.nric.clone(), person);
    }
    add_project(
        &mut state,
        project(ACACIA, MANAGER, date(2025, 2, 1), date(2025, 2, 28), 2),
        2,
        1,
    );
    state
}

/// Marks `officer` as handling `project`, as an approved registration would.
pub(super) fn assign_officer(state: &mut Snapshot, project: &str, officer: &str) {
    let target = state.projects.get_mut(project).expect("project exists");
    target.officers.insert(nric(officer));
    target.officer_slots -= 1;
}

pub(super) fn insert_application(
    state: &mut Snapshot,
    id: &str,
    applicant: &str,
    project: &str,
    flat_type: Option<FlatType>,
    status: ApplicationStatus,
) -> ApplicationId {
    let id = ApplicationId(id.to_string());
    state.applications.insert(
        id.clone(),
        Application {
            id: id.clone(),
            applicant: nric(applicant),
            project: project.to_string(),
            flat_type,
            status,
        },
    );
    id
}

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::sync::Arc;

use bto_allocation::workflows::allocation::store::csv::{
    APPLICANT_FILE, ENQUIRY_FILE, MANAGER_FILE, OFFICER_FILE, PROJECT_FILE,
};
use bto_allocation::workflows::allocation::{
    AllocationService, CsvGateway, EligibilityConfig, FixedClock, FlatSupply, FlatType,
    MaritalStatus, Nric, PersistenceGateway, Person, ProjectDraft, Role, Snapshot,
};
use chrono::NaiveDate;

fn nric(raw: &str) -> Nric {
    Nric::parse(raw).expect("fixture NRIC is well formed")
}

fn person(name: &str, raw: &str, age: u8, status: MaritalStatus, roles: &[Role]) -> Person {
    Person {
        name: name.to_string(),
        nric: nric(raw),
        age,
        marital_status: status,
        password: "password".to_string(),
        roles: roles.iter().copied().collect::<BTreeSet<_>>(),
    }
}

fn seed_directory(gateway: &CsvGateway) {
    let mut snapshot = Snapshot::default();
    for person in [
        person("Michael", "S5678901G", 45, MaritalStatus::Married, &[Role::Manager]),
        person(
            "Daniel",
            "T2109876H",
            36,
            MaritalStatus::Single,
            &[Role::Applicant, Role::Officer],
        ),
        person("John", "S1234567A", 35, MaritalStatus::Single, &[Role::Applicant]),
        person("Grace", "T2345678C", 37, MaritalStatus::Married, &[Role::Applicant]),
    ] {
        snapshot.persons.insert(person.nric.clone(), person);
    }
    gateway.save(&snapshot).expect("seed tables written");
}

#[test]
fn saved_tables_reload_into_the_same_snapshot() {
    let dir = tempfile::tempdir().expect("temp dir");
    let gateway = Arc::new(CsvGateway::new(dir.path()));
    seed_directory(&gateway);

    let today = NaiveDate::from_ymd_opt(2025, 2, 15).expect("valid date");
    let mut service = AllocationService::open(
        gateway.clone(),
        Arc::new(FixedClock::on(today)),
        EligibilityConfig::default(),
    )
    .expect("seeded tables load");

    let manager = nric("S5678901G");
    let officer = nric("T2109876H");
    let single = nric("S1234567A");
    let couple = nric("T2345678C");

    service
        .create_project(
            &manager,
            ProjectDraft {
                name: "Acacia Breeze".to_string(),
                neighborhood: "Yishun".to_string(),
                flats: BTreeMap::from([
                    (
                        FlatType::TwoRoom,
                        FlatSupply {
                            units: 2,
                            price: 350_000,
                        },
                    ),
                    (
                        FlatType::ThreeRoom,
                        FlatSupply {
                            units: 3,
                            price: 450_000,
                        },
                    ),
                ]),
                opening_date: today,
                closing_date: today + chrono::Duration::days(14),
                officer_slots: 3,
                visible: true,
            },
        )
        .expect("project created");
    let registration = service
        .register_officer(&officer, "Acacia Breeze")
        .expect("registered");
    service
        .approve_registration(&registration.id, &manager)
        .expect("approved");

    let application = service
        .apply(&single, "Acacia Breeze", Some(FlatType::TwoRoom))
        .expect("applied");
    service
        .approve_application(&application.id, &manager)
        .expect("approved");
    service
        .book_flat(&application.id, &officer, FlatType::TwoRoom)
        .expect("booked");
    let pending = service
        .apply(&couple, "Acacia Breeze", None)
        .expect("applied");
    service
        .request_withdrawal(&pending.id, &couple)
        .expect("withdrawal requested");

    let enquiry = service
        .submit_enquiry(
            &couple,
            "Acacia Breeze",
            "Is the site near an MRT station, or a bus interchange?",
        )
        .expect("submitted");
    service
        .reply_enquiry(&enquiry.id, &officer, "Yes, \"Khatib\" is a short walk away.")
        .expect("replied");

    let reloaded = gateway.load().expect("tables reload");
    assert_eq!(&reloaded, service.snapshot());
    assert_eq!(
        reloaded
            .ledger
            .units("Acacia Breeze", FlatType::TwoRoom)
            .map(|units| (units.total, units.available)),
        Some((2, 1))
    );

    for file in [APPLICANT_FILE, OFFICER_FILE, MANAGER_FILE, PROJECT_FILE, ENQUIRY_FILE] {
        assert!(dir.path().join(file).exists(), "{file} written");
        assert!(!dir.path().join(format!("{file}.tmp")).exists());
    }
    let officers = fs::read_to_string(dir.path().join(OFFICER_FILE)).expect("officer table");
    assert!(officers.contains("Daniel,T2109876H,36,Single"));
    let applicants = fs::read_to_string(dir.path().join(APPLICANT_FILE)).expect("applicants");
    assert!(!applicants.contains("T2109876H"));
}

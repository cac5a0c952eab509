use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bto_allocation::error::AppError;
use bto_allocation::workflows::allocation::{
    AllocationService, BookingReportFilter, EligibilityConfig, FixedClock, FlatSupply, FlatType,
    LifecycleError, MaritalStatus, MemoryGateway, Nric, Person, ProjectDraft, Role, Snapshot,
    WithdrawalOutcome,
};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;

use crate::cli::emit;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the withdrawal portion of the walkthrough.
    #[arg(long)]
    pub(crate) skip_withdrawal: bool,
}

type DemoService = AllocationService<MemoryGateway, FixedClock>;

pub(crate) fn run_demo(
    args: DemoArgs,
    eligibility: EligibilityConfig,
    today: Option<NaiveDate>,
    json: bool,
) -> Result<(), AppError> {
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let cast = DemoCast::new()?;
    let gateway = Arc::new(MemoryGateway::new(cast.snapshot()));
    let mut service = AllocationService::open(
        gateway.clone(),
        Arc::new(FixedClock::on(today)),
        eligibility,
    )?;

    println!("BTO allocation demo ({today})");
    let project = setup_project(&mut service, &cast, today)?;

    println!("\nApplications");
    let single = service.apply(&cast.single, &project, Some(FlatType::TwoRoom))?;
    println!("- {} applied for a 2-Room flat ({})", cast.single, single.id);
    match service.apply(&cast.young_single, &project, None) {
        Ok(application) => println!("- unexpected application {}", application.id),
        Err(err) => println!("- {} turned away: {err}", cast.young_single),
    }
    let married = service.apply(&cast.married, &project, None)?;
    println!("- {} applied without a flat type ({})", cast.married, married.id);

    service.approve_application(&single.id, &cast.manager)?;
    service.approve_application(&married.id, &cast.manager)?;
    println!("- manager approved {} and {}", single.id, married.id);

    let booked = service.book_flat(&single.id, &cast.officer, FlatType::TwoRoom)?;
    println!("- officer booked a 2-Room flat for {}", booked.id);
    match service.book_flat(&married.id, &cast.officer, FlatType::TwoRoom) {
        Ok(application) => println!("- unexpected booking {}", application.id),
        Err(err) => println!("- second 2-Room booking refused: {err}"),
    }
    service.book_flat(&married.id, &cast.officer, FlatType::ThreeRoom)?;
    println!("- officer booked a 3-Room flat for {}", married.id);

    let receipt = service.booking_receipt(&single.id, &cast.officer)?;
    println!(
        "  receipt: {} ({}) {} {} at ${}",
        receipt.applicant_name, receipt.nric, receipt.project, receipt.flat_type, receipt.price
    );

    println!("\nEnquiries");
    let enquiry = service.submit_enquiry(
        &cast.married,
        &project,
        "Is there a carpark attached to the block?",
    )?;
    service.reply_enquiry(&enquiry.id, &cast.officer, "Yes, a multi-storey carpark.")?;
    match service.edit_enquiry(&enquiry.id, &cast.married, "Never mind.") {
        Ok(_) => println!("- unexpected edit of an answered enquiry"),
        Err(err) => println!("- {} answered; further edits refused: {err}", enquiry.id),
    }

    if !args.skip_withdrawal {
        println!("\nWithdrawal");
        let request = service.request_withdrawal(&married.id, &cast.married)?;
        let outcome = service.process_withdrawal(&request.id, &cast.manager, true)?;
        if let WithdrawalOutcome::Withdrawn(application) = outcome {
            println!(
                "- {} withdrawn; 3-Room units available again: {}",
                application.id,
                service
                    .snapshot()
                    .ledger
                    .available(&project, FlatType::ThreeRoom)
            );
        }
    }

    println!("\nBooking report");
    let rows = service.booking_report(&cast.manager, &BookingReportFilter::default())?;
    emit(json, &rows, |rows| {
        for row in rows {
            println!(
                "- {} {} ({}, {}) {}",
                row.application_id,
                row.applicant_name,
                row.age,
                row.marital_status,
                row.flat_type
            );
        }
    })?;

    println!("\nSnapshot saves recorded: {}", gateway.saves());
    Ok(())
}

fn setup_project(
    service: &mut DemoService,
    cast: &DemoCast,
    today: NaiveDate,
) -> Result<String, AppError> {
    let draft = ProjectDraft {
        name: "Acacia Breeze".to_string(),
        neighborhood: "Yishun".to_string(),
        flats: BTreeMap::from([
            (
                FlatType::TwoRoom,
                FlatSupply {
                    units: 1,
                    price: 350_000,
                },
            ),
            (
                FlatType::ThreeRoom,
                FlatSupply {
                    units: 2,
                    price: 450_000,
                },
            ),
        ]),
        opening_date: today,
        closing_date: today + Duration::days(30),
        officer_slots: 3,
        visible: false,
    };
    let project = service.create_project(&cast.manager, draft)?;
    println!("Project {} created (hidden)", project.name);

    service.set_project_visibility(&cast.manager, &project.name, true)?;
    let registration = service.register_officer(&cast.officer, &project.name)?;
    service.approve_registration(&registration.id, &cast.manager)?;
    let remaining = service.snapshot().project(&project.name)?.officer_slots;
    println!(
        "Officer {} now handles {} ({remaining} slots left)",
        cast.officer, project.name
    );

    Ok(project.name)
}

struct DemoCast {
    manager: Nric,
    officer: Nric,
    single: Nric,
    young_single: Nric,
    married: Nric,
    persons: Vec<Person>,
}

impl DemoCast {
    fn new() -> Result<Self, AppError> {
        let manager = nric("S5678901G")?;
        let officer = nric("T2109876H")?;
        let single = nric("S1234567A")?;
        let young_single = nric("T7654321B")?;
        let married = nric("T2345678C")?;

        let persons = vec![
            person("Michael", &manager, 36, MaritalStatus::Single, &[Role::Manager]),
            person(
                "Daniel",
                &officer,
                36,
                MaritalStatus::Single,
                &[Role::Applicant, Role::Officer],
            ),
            person("John", &single, 35, MaritalStatus::Single, &[Role::Applicant]),
            person(
                "Sarah",
                &young_single,
                24,
                MaritalStatus::Single,
                &[Role::Applicant],
            ),
            person("Grace", &married, 37, MaritalStatus::Married, &[Role::Applicant]),
        ];

        Ok(Self {
            manager,
            officer,
            single,
            young_single,
            married,
            persons,
        })
    }

    fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for person in &self.persons {
            snapshot.persons.insert(person.nric.clone(), person.clone());
        }
        snapshot
    }
}

fn nric(raw: &str) -> Result<Nric, AppError> {
    Nric::parse(raw).map_err(|err| AppError::Lifecycle(LifecycleError::from(err)))
}

fn person(
    name: &str,
    nric: &Nric,
    age: u8,
    marital_status: MaritalStatus,
    roles: &[Role],
) -> Person {
    Person {
        name: name.to_string(),
        nric: nric.clone(),
        age,
        marital_status,
        password: "password".to_string(),
        roles: roles.iter().copied().collect::<BTreeSet<_>>(),
    }
}

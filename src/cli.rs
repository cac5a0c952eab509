use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use bto_allocation::config::AppConfig;
use bto_allocation::error::AppError;
use bto_allocation::telemetry;
use bto_allocation::workflows::allocation::{
    AllocationService, ApplicationId, ApplicationView, BookingReportFilter, Clock, CsvGateway,
    EnquiryId, FixedClock, FlatSupply, FlatType, MaritalStatus, Nric, ProjectDraft,
    RegistrationId, SystemClock, WithdrawalId, WithdrawalOutcome,
};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::demo::{run_demo, DemoArgs};

#[derive(Parser, Debug)]
#[command(
    name = "bto",
    about = "Manage BTO project applications, officer registrations and enquiries",
    version
)]
struct Cli {
    /// Directory holding the CSV tables (overrides BTO_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Treat this date (YYYY-MM-DD) as today instead of the system clock
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the projects a user may view
    Projects(ActorArgs),
    /// Manager project administration
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Submit an application for a project
    Apply(ApplyArgs),
    /// Manager and officer actions on an application
    Application {
        #[command(subcommand)]
        command: ApplicationCommand,
    },
    /// Decide on an applicant's withdrawal request
    Withdrawal {
        #[command(subcommand)]
        command: WithdrawalCommand,
    },
    /// Officer registrations for handling a project
    Registration {
        #[command(subcommand)]
        command: RegistrationCommand,
    },
    /// Project enquiries
    Enquiry {
        #[command(subcommand)]
        command: EnquiryCommand,
    },
    /// Print the receipt for a booked flat
    Receipt(ApplicationArgs),
    /// Manager reports
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
    /// Run an in-memory walkthrough of the full allocation lifecycle
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
struct ActorArgs {
    /// NRIC of the acting user
    #[arg(long = "as")]
    actor: Nric,
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    /// Create a new project
    Create(CreateProjectArgs),
    /// Show or hide a project
    Visibility(VisibilityArgs),
    /// List applications submitted for a project
    Applications(ProjectArgs),
}

#[derive(Args, Debug)]
struct CreateProjectArgs {
    #[arg(long = "as")]
    actor: Nric,
    #[arg(long)]
    name: String,
    #[arg(long)]
    neighborhood: String,
    #[arg(long, requires = "two_room_price")]
    two_room_units: Option<u32>,
    #[arg(long)]
    two_room_price: Option<u32>,
    #[arg(long, requires = "three_room_price")]
    three_room_units: Option<u32>,
    #[arg(long)]
    three_room_price: Option<u32>,
    /// Application opening date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    opening: NaiveDate,
    /// Application closing date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    closing: NaiveDate,
    #[arg(long)]
    officer_slots: u32,
    /// Make the project visible to applicants immediately
    #[arg(long)]
    visible: bool,
}

#[derive(Args, Debug)]
struct VisibilityArgs {
    #[arg(long = "as")]
    actor: Nric,
    #[arg(long)]
    project: String,
    /// `on` or `off`
    #[arg(long, value_parser = parse_toggle)]
    state: bool,
}

#[derive(Args, Debug)]
struct ProjectArgs {
    #[arg(long = "as")]
    actor: Nric,
    #[arg(long)]
    project: String,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    #[arg(long = "as")]
    actor: Nric,
    #[arg(long)]
    project: String,
    /// Preferred flat type (2-Room or 3-Room)
    #[arg(long)]
    flat_type: Option<FlatType>,
}

#[derive(Args, Debug)]
struct ApplicationArgs {
    #[arg(long = "as")]
    actor: Nric,
    #[arg(long)]
    application: String,
}

#[derive(Args, Debug)]
struct BookArgs {
    #[arg(long = "as")]
    actor: Nric,
    #[arg(long)]
    application: String,
    #[arg(long)]
    flat_type: FlatType,
}

#[derive(Args, Debug)]
struct DecisionArgs {
    #[arg(long = "as")]
    actor: Nric,
    #[arg(long)]
    id: String,
    /// Decline instead of approving
    #[arg(long)]
    decline: bool,
}

#[derive(Subcommand, Debug)]
enum ApplicationCommand {
    /// List your own applications
    List(ActorArgs),
    Approve(ApplicationArgs),
    Reject(ApplicationArgs),
    /// Book a flat for a successful application (handling officer)
    Book(BookArgs),
    /// Ask the project manager to withdraw your application
    RequestWithdrawal(ApplicationArgs),
    /// Withdraw an application directly (project manager)
    Withdraw(DecisionArgs),
}

#[derive(Subcommand, Debug)]
enum WithdrawalCommand {
    Process(DecisionArgs),
}

#[derive(Subcommand, Debug)]
enum RegistrationCommand {
    Create(ProjectArgs),
    Approve(IdArgs),
    Reject(IdArgs),
}

#[derive(Args, Debug)]
struct IdArgs {
    #[arg(long = "as")]
    actor: Nric,
    #[arg(long)]
    id: String,
}

#[derive(Subcommand, Debug)]
enum EnquiryCommand {
    /// List enquiries you created or can answer
    List(ActorArgs),
    Submit(SubmitEnquiryArgs),
    Edit(EnquiryContentArgs),
    Delete(IdArgs),
    Reply(EnquiryContentArgs),
}

#[derive(Args, Debug)]
struct SubmitEnquiryArgs {
    #[arg(long = "as")]
    actor: Nric,
    #[arg(long)]
    project: String,
    #[arg(long)]
    message: String,
}

#[derive(Args, Debug)]
struct EnquiryContentArgs {
    #[arg(long = "as")]
    actor: Nric,
    #[arg(long)]
    id: String,
    #[arg(long)]
    message: String,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Booked flats across your projects
    Bookings(BookingReportArgs),
}

#[derive(Args, Debug)]
struct BookingReportArgs {
    #[arg(long = "as")]
    actor: Nric,
    #[arg(long)]
    marital_status: Option<MaritalStatus>,
    #[arg(long)]
    flat_type: Option<FlatType>,
    #[arg(long)]
    project: Option<String>,
}

/// Either the wall clock or a date pinned with `--today`.
enum CommandClock {
    System(SystemClock),
    Fixed(FixedClock),
}

impl Clock for CommandClock {
    fn now(&self) -> NaiveDateTime {
        match self {
            CommandClock::System(clock) => clock.now(),
            CommandClock::Fixed(clock) => clock.now(),
        }
    }
}

type Service = AllocationService<CsvGateway, CommandClock>;

pub(crate) fn run() -> Result<(), AppError> {
    let Cli {
        data_dir,
        today,
        json,
        command,
    } = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let command = match command {
        Command::Demo(args) => return run_demo(args, config.eligibility, today, json),
        other => other,
    };

    let data_dir = data_dir.unwrap_or(config.storage.data_dir);
    let clock = match today {
        Some(date) => CommandClock::Fixed(FixedClock::on(date)),
        None => CommandClock::System(SystemClock),
    };
    let mut service = AllocationService::open(
        Arc::new(CsvGateway::new(data_dir)),
        Arc::new(clock),
        config.eligibility,
    )?;

    execute(&mut service, command, json)
}

fn execute(service: &mut Service, command: Command, json: bool) -> Result<(), AppError> {
    match command {
        Command::Projects(args) => {
            let listings = service.visible_projects(&args.actor)?;
            emit(json, &listings, |listings| {
                for listing in listings {
                    println!(
                        "{} ({}) {} to {}{}",
                        listing.name,
                        listing.neighborhood,
                        listing.opening_date,
                        listing.closing_date,
                        if listing.visible { "" } else { " [hidden]" }
                    );
                    for flat in &listing.flats {
                        println!(
                            "  - {}: {}/{} available at ${}{}",
                            flat.flat_type,
                            flat.available_units,
                            flat.total_units,
                            flat.price,
                            if flat.eligible { "" } else { " (not eligible)" }
                        );
                    }
                }
            })
        }
        Command::Project { command } => execute_project(service, command, json),
        Command::Apply(args) => {
            let application = service.apply(&args.actor, &args.project, args.flat_type)?;
            emit(json, &application, |application| {
                println!(
                    "Application {} submitted for {} ({})",
                    application.id, application.project, application.status
                );
            })
        }
        Command::Application { command } => execute_application(service, command, json),
        Command::Withdrawal {
            command: WithdrawalCommand::Process(args),
        } => {
            let outcome = service.process_withdrawal(
                &WithdrawalId(args.id),
                &args.actor,
                !args.decline,
            )?;
            emit_withdrawal(json, &outcome)
        }
        Command::Registration { command } => execute_registration(service, command, json),
        Command::Enquiry { command } => execute_enquiry(service, command, json),
        Command::Receipt(args) => {
            let receipt = service.booking_receipt(&ApplicationId(args.application), &args.actor)?;
            emit(json, &receipt, |receipt| {
                println!("Booking receipt for application {}", receipt.application_id);
                println!("  Applicant: {} ({})", receipt.applicant_name, receipt.nric);
                println!("  Age: {} | Marital status: {}", receipt.age, receipt.marital_status);
                println!("  Project: {} ({})", receipt.project, receipt.neighborhood);
                println!("  Flat: {} at ${}", receipt.flat_type, receipt.price);
            })
        }
        Command::Report {
            command: ReportCommand::Bookings(args),
        } => {
            let filter = BookingReportFilter {
                marital_status: args.marital_status,
                flat_type: args.flat_type,
                project: args.project,
            };
            let rows = service.booking_report(&args.actor, &filter)?;
            emit(json, &rows, |rows| {
                println!("{} booking(s)", rows.len());
                for row in rows {
                    println!(
                        "  {} {} ({}, {}, {}) {} {}",
                        row.application_id,
                        row.applicant_name,
                        row.nric,
                        row.age,
                        row.marital_status,
                        row.project,
                        row.flat_type
                    );
                }
            })
        }
        Command::Demo(_) => Ok(()),
    }
}

fn execute_project(
    service: &mut Service,
    command: ProjectCommand,
    json: bool,
) -> Result<(), AppError> {
    match command {
        ProjectCommand::Create(args) => {
            let mut flats = BTreeMap::new();
            if let (Some(units), Some(price)) = (args.two_room_units, args.two_room_price) {
                flats.insert(FlatType::TwoRoom, FlatSupply { units, price });
            }
            if let (Some(units), Some(price)) = (args.three_room_units, args.three_room_price) {
                flats.insert(FlatType::ThreeRoom, FlatSupply { units, price });
            }
            let draft = ProjectDraft {
                name: args.name,
                neighborhood: args.neighborhood,
                flats,
                opening_date: args.opening,
                closing_date: args.closing,
                officer_slots: args.officer_slots,
                visible: args.visible,
            };
            let project = service.create_project(&args.actor, draft)?;
            emit(json, &project, |project| {
                println!(
                    "Project {} created ({} to {})",
                    project.name, project.opening_date, project.closing_date
                );
            })
        }
        ProjectCommand::Visibility(args) => {
            let project = service.set_project_visibility(&args.actor, &args.project, args.state)?;
            emit(json, &project, |project| {
                let state = if project.visible { "visible" } else { "hidden" };
                println!("Project {} is now {state}", project.name);
            })
        }
        ProjectCommand::Applications(args) => {
            let views = service.project_applications(&args.actor, &args.project)?;
            emit(json, &views, |views| print_application_views(views))
        }
    }
}

fn execute_application(
    service: &mut Service,
    command: ApplicationCommand,
    json: bool,
) -> Result<(), AppError> {
    let application = match command {
        ApplicationCommand::List(args) => {
            let views = service.applications_by(&args.actor);
            return emit(json, &views, |views| print_application_views(views));
        }
        ApplicationCommand::Approve(args) => {
            service.approve_application(&ApplicationId(args.application), &args.actor)?
        }
        ApplicationCommand::Reject(args) => {
            service.reject_application(&ApplicationId(args.application), &args.actor)?
        }
        ApplicationCommand::Book(args) => service.book_flat(
            &ApplicationId(args.application),
            &args.actor,
            args.flat_type,
        )?,
        ApplicationCommand::RequestWithdrawal(args) => {
            let request =
                service.request_withdrawal(&ApplicationId(args.application), &args.actor)?;
            return emit(json, &request, |request| {
                println!(
                    "Withdrawal request {} lodged for application {}",
                    request.id, request.application
                );
            });
        }
        ApplicationCommand::Withdraw(args) => {
            let outcome =
                service.withdraw(&ApplicationId(args.id), &args.actor, !args.decline)?;
            return emit_withdrawal(json, &outcome);
        }
    };

    emit(json, &application, |application| {
        println!("Application {} is now {}", application.id, application.status);
    })
}

fn execute_registration(
    service: &mut Service,
    command: RegistrationCommand,
    json: bool,
) -> Result<(), AppError> {
    let registration = match command {
        RegistrationCommand::Create(args) => service.register_officer(&args.actor, &args.project)?,
        RegistrationCommand::Approve(args) => {
            service.approve_registration(&RegistrationId(args.id), &args.actor)?
        }
        RegistrationCommand::Reject(args) => {
            service.reject_registration(&RegistrationId(args.id), &args.actor)?
        }
    };

    emit(json, &registration, |registration| {
        println!(
            "Registration {} for {} is {}",
            registration.id, registration.project, registration.status
        );
    })
}

fn execute_enquiry(
    service: &mut Service,
    command: EnquiryCommand,
    json: bool,
) -> Result<(), AppError> {
    let (verb, enquiry) = match command {
        EnquiryCommand::List(args) => {
            let enquiries = service.enquiries_for(&args.actor);
            return emit(json, &enquiries, |enquiries| {
                for enquiry in enquiries {
                    println!(
                        "{} [{}] {}: {}",
                        enquiry.id,
                        enquiry.state().label(),
                        enquiry.project,
                        enquiry.message
                    );
                    if let Some(reply) = &enquiry.reply {
                        println!("    reply: {}", reply.content);
                    }
                }
            });
        }
        EnquiryCommand::Submit(args) => (
            "submitted",
            service.submit_enquiry(&args.actor, &args.project, &args.message)?,
        ),
        EnquiryCommand::Edit(args) => (
            "updated",
            service.edit_enquiry(&EnquiryId(args.id), &args.actor, &args.message)?,
        ),
        EnquiryCommand::Delete(args) => (
            "deleted",
            service.delete_enquiry(&EnquiryId(args.id), &args.actor)?,
        ),
        EnquiryCommand::Reply(args) => (
            "answered",
            service.reply_enquiry(&EnquiryId(args.id), &args.actor, &args.message)?,
        ),
    };

    emit(json, &enquiry, |enquiry| {
        println!("Enquiry {} {verb}", enquiry.id);
    })
}

fn print_application_views(views: &[ApplicationView]) {
    for view in views {
        let flat = view
            .flat_type
            .map(|flat_type| flat_type.label())
            .unwrap_or("-");
        println!(
            "{} {} ({}) {} {} {}",
            view.application_id,
            view.applicant_name,
            view.applicant,
            view.project,
            flat,
            view.status
        );
    }
}

fn emit_withdrawal(json: bool, outcome: &WithdrawalOutcome) -> Result<(), AppError> {
    emit(json, outcome, |outcome| match outcome {
        WithdrawalOutcome::Withdrawn(application) => {
            println!("Application {} withdrawn", application.id)
        }
        WithdrawalOutcome::Declined => println!("Withdrawal declined; application unchanged"),
    })
}

/// Print `value` as JSON when requested, otherwise through `human`.
pub(crate) fn emit<T: Serialize>(
    json: bool,
    value: &T,
    human: impl FnOnce(&T),
) -> Result<(), AppError> {
    if json {
        let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        human(value);
    }
    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn parse_toggle(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "visible" => Ok(true),
        "off" | "false" | "hidden" => Ok(false),
        other => Err(format!("expected 'on' or 'off', found '{other}'")),
    }
}

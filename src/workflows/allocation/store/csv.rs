use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::workflows::allocation::domain::{
    Application, ApplicationId, ApplicationStatus, Enquiry, EnquiryId, EnquiryReply, FlatType,
    MaritalStatus, Nric, Person, Project, Registration, RegistrationId, RegistrationStatus, Role,
    WithdrawalId, WithdrawalRequest,
};
use crate::workflows::allocation::repository::{PersistenceError, PersistenceGateway};
use crate::workflows::allocation::snapshot::Snapshot;

pub const APPLICANT_FILE: &str = "ApplicantList.csv";
pub const OFFICER_FILE: &str = "OfficerList.csv";
pub const MANAGER_FILE: &str = "ManagerList.csv";
pub const PROJECT_FILE: &str = "ProjectList.csv";
pub const APPLICATION_FILE: &str = "ApplicationList.csv";
pub const REGISTRATION_FILE: &str = "OfficerRegistrationList.csv";
pub const ENQUIRY_FILE: &str = "EnquiryList.csv";
pub const WITHDRAWAL_FILE: &str = "WithdrawalRequestList.csv";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const PERSON_HEADER: [&str; 5] = ["Name", "NRIC", "Age", "MaritalStatus", "Password"];
const PROJECT_HEADER: [&str; 14] = [
    "ProjectName",
    "Neighborhood",
    "Type1",
    "NumberOfUnitsType1",
    "SellingPriceType1",
    "Type2",
    "NumberOfUnitsType2",
    "SellingPriceType2",
    "ApplicationOpeningDate",
    "ApplicationClosingDate",
    "Manager",
    "OfficerSlot",
    "Visibility",
    "Officers",
];
const APPLICATION_HEADER: [&str; 5] = [
    "ApplicationId",
    "ApplicantNRIC",
    "ProjectName",
    "FlatType",
    "Status",
];
const REGISTRATION_HEADER: [&str; 5] = [
    "RegistrationID",
    "OfficerNRIC",
    "ProjectName",
    "RegistrationDate",
    "Status",
];
const ENQUIRY_HEADER: [&str; 8] = [
    "EnquiryID",
    "ApplicantNRIC",
    "ProjectName",
    "Message",
    "Reply",
    "CreatedAt",
    "RepliedAt",
    "RepliedBy",
];
const WITHDRAWAL_HEADER: [&str; 6] = [
    "RequestId",
    "ApplicationId",
    "RequestedAt",
    "IsApproved",
    "ProcessedAt",
    "ProcessedBy",
];

/// Position of the first officer cell when the optional `Visibility` column is absent.
const LEGACY_OFFICER_COLUMN: usize = 12;

/// Snapshot gateway over a directory of CSV tables.
///
/// Project rows store the *available* unit count per flat type; totals are
/// rebuilt on load by adding the booked applications back. Saves write every
/// table to a temporary sibling first and only rename once all writes
/// succeeded.
#[derive(Debug, Clone)]
pub struct CsvGateway {
    dir: PathBuf,
}

impl CsvGateway {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn open(&self, file: &'static str) -> Result<Option<File>, PersistenceError> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(None);
        }
        File::open(&path)
            .map(Some)
            .map_err(|source| PersistenceError::Io { path, source })
    }

    fn stage(
        &self,
        file: &'static str,
        write: impl FnOnce(&mut File) -> Result<(), PersistenceError>,
    ) -> Result<(PathBuf, PathBuf), PersistenceError> {
        let target = self.dir.join(file);
        let staged = self.dir.join(format!("{file}.tmp"));
        let mut handle = File::create(&staged).map_err(|source| PersistenceError::Io {
            path: staged.clone(),
            source,
        })?;
        write(&mut handle)?;
        handle.sync_all().map_err(|source| PersistenceError::Io {
            path: staged.clone(),
            source,
        })?;
        Ok((staged, target))
    }
}

impl PersistenceGateway for CsvGateway {
    fn load(&self) -> Result<Snapshot, PersistenceError> {
        let mut snapshot = Snapshot::default();

        for (file, role) in [
            (APPLICANT_FILE, Role::Applicant),
            (OFFICER_FILE, Role::Officer),
            (MANAGER_FILE, Role::Manager),
        ] {
            if let Some(handle) = self.open(file)? {
                for person in read_persons(handle, file, role)? {
                    merge_person(&mut snapshot.persons, person);
                }
            }
        }
        check_roles(&snapshot)?;
        let application_rows = match self.open(APPLICATION_FILE)? {
            Some(handle) => read_applications(handle, &mut snapshot)?,
            None => BTreeMap::new(),
        };
        if let Some(handle) = self.open(PROJECT_FILE)? {
            read_projects(handle, &mut snapshot)?;
        }
        check_applications(&snapshot, &application_rows)?;
        if let Some(handle) = self.open(REGISTRATION_FILE)? {
            read_registrations(handle, &mut snapshot)?;
        }
        if let Some(handle) = self.open(ENQUIRY_FILE)? {
            read_enquiries(handle, &mut snapshot)?;
        }
        if let Some(handle) = self.open(WITHDRAWAL_FILE)? {
            read_withdrawals(handle, &mut snapshot)?;
        }

        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        check_roles(snapshot)?;
        fs::create_dir_all(&self.dir).map_err(|source| PersistenceError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let staged = [
            self.stage(APPLICANT_FILE, |out| {
                write_persons(out, APPLICANT_FILE, snapshot, Role::Applicant)
            })?,
            self.stage(OFFICER_FILE, |out| {
                write_persons(out, OFFICER_FILE, snapshot, Role::Officer)
            })?,
            self.stage(MANAGER_FILE, |out| {
                write_persons(out, MANAGER_FILE, snapshot, Role::Manager)
            })?,
            self.stage(PROJECT_FILE, |out| write_projects(out, snapshot))?,
            self.stage(APPLICATION_FILE, |out| write_applications(out, snapshot))?,
            self.stage(REGISTRATION_FILE, |out| write_registrations(out, snapshot))?,
            self.stage(ENQUIRY_FILE, |out| write_enquiries(out, snapshot))?,
            self.stage(WITHDRAWAL_FILE, |out| write_withdrawals(out, snapshot))?,
        ];

        for (from, to) in staged {
            fs::rename(&from, &to).map_err(|source| PersistenceError::Io { path: to, source })?;
        }
        Ok(())
    }
}

/// Row position used to name the offending record in load errors.
struct RowContext {
    file: &'static str,
    row: usize,
}

impl RowContext {
    fn malformed(&self, field: &'static str, detail: impl Display) -> PersistenceError {
        PersistenceError::Malformed {
            file: self.file,
            row: self.row,
            field,
            detail: detail.to_string(),
        }
    }

    fn parse<T>(&self, field: &'static str, value: &str) -> Result<T, PersistenceError>
    where
        T: FromStr,
        T::Err: Display,
    {
        value
            .trim()
            .parse::<T>()
            .map_err(|err| self.malformed(field, format!("'{value}': {err}")))
    }

    fn required(&self, field: &'static str, value: &str) -> Result<String, PersistenceError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(self.malformed(field, "missing value"));
        }
        Ok(trimmed.to_string())
    }

    fn timestamp(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<NaiveDateTime, PersistenceError> {
        parse_timestamp(value)
            .ok_or_else(|| self.malformed(field, format!("'{value}' is not a timestamp")))
    }

    /// NRIC cell that must belong to someone in the person tables.
    fn known_person(
        &self,
        field: &'static str,
        value: &str,
        persons: &BTreeMap<Nric, Person>,
    ) -> Result<Nric, PersistenceError> {
        let nric: Nric = self.parse(field, value)?;
        if !persons.contains_key(&nric) {
            return Err(self.malformed(field, format!("{nric} matches no known person")));
        }
        Ok(nric)
    }

    fn known_project(
        &self,
        field: &'static str,
        value: &str,
        snapshot: &Snapshot,
    ) -> Result<String, PersistenceError> {
        let name = self.required(field, value)?;
        if !snapshot.projects.contains_key(&name) {
            return Err(self.malformed(field, format!("'{name}' matches no project")));
        }
        Ok(name)
    }

    fn known_application(
        &self,
        field: &'static str,
        value: &str,
        snapshot: &Snapshot,
    ) -> Result<ApplicationId, PersistenceError> {
        let id = ApplicationId(self.required(field, value)?);
        if !snapshot.applications.contains_key(&id) {
            return Err(self.malformed(field, format!("{id} matches no application")));
        }
        Ok(id)
    }

    /// NRIC cell, or a person's name resolved against the loaded person tables.
    fn person_ref(
        &self,
        field: &'static str,
        value: &str,
        persons: &BTreeMap<Nric, Person>,
    ) -> Result<Nric, PersistenceError> {
        let trimmed = value.trim();
        if let Ok(nric) = Nric::parse(trimmed) {
            return Ok(nric);
        }
        persons
            .values()
            .find(|person| person.name.eq_ignore_ascii_case(trimmed))
            .map(|person| person.nric.clone())
            .ok_or_else(|| self.malformed(field, format!("'{trimmed}' matches no known person")))
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if let Ok(at) = NaiveDateTime::parse_from_str(trimmed, TIMESTAMP_FORMAT) {
        return Some(at);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn optional(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(trimmed)
    }
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(input)
}

fn writer<W: Write>(output: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(output)
}

fn row_number(record: &csv::StringRecord, index: usize) -> usize {
    record
        .position()
        .map(|position| position.line() as usize)
        .unwrap_or(index + 2)
}

fn csv_error(file: &'static str) -> impl Fn(csv::Error) -> PersistenceError {
    move |source| PersistenceError::Csv { file, source }
}

fn merge_person(persons: &mut BTreeMap<Nric, Person>, person: Person) {
    match persons.get_mut(&person.nric) {
        Some(existing) => existing.roles.extend(person.roles),
        None => {
            persons.insert(person.nric.clone(), person);
        }
    }
}

fn roles_for(role: Role) -> BTreeSet<Role> {
    match role {
        Role::Applicant => BTreeSet::from([Role::Applicant]),
        Role::Officer => BTreeSet::from([Role::Applicant, Role::Officer]),
        Role::Manager => BTreeSet::from([Role::Manager]),
    }
}

/// Each person is written to the table of their primary role only, so the
/// role set must be exactly what that table reads back.
fn check_roles(snapshot: &Snapshot) -> Result<(), PersistenceError> {
    for person in snapshot.persons.values() {
        if person.roles != roles_for(person.primary_role()) {
            let roles: Vec<&str> = person.roles.iter().map(|role| role.label()).collect();
            return Err(PersistenceError::UnrepresentableRoles {
                nric: person.nric.to_string(),
                roles: roles.join(", "),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Serialize)]
struct PersonRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "NRIC")]
    nric: String,
    #[serde(rename = "Age")]
    age: String,
    #[serde(rename = "MaritalStatus")]
    marital_status: String,
    #[serde(rename = "Password")]
    password: String,
}

pub(crate) fn read_persons<R: Read>(
    input: R,
    file: &'static str,
    role: Role,
) -> Result<Vec<Person>, PersistenceError> {
    let mut csv_reader = reader(input);
    let headers = csv_reader.headers().map_err(csv_error(file))?.clone();
    let mut persons = Vec::new();

    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(csv_error(file))?;
        let ctx = RowContext {
            file,
            row: row_number(&record, index),
        };
        let row: PersonRow = record
            .deserialize(Some(&headers))
            .map_err(csv_error(file))?;

        persons.push(Person {
            name: ctx.required("Name", &row.name)?,
            nric: ctx.parse("NRIC", &row.nric)?,
            age: ctx.parse("Age", &row.age)?,
            marital_status: ctx.parse::<MaritalStatus>("MaritalStatus", &row.marital_status)?,
            password: row.password,
            roles: roles_for(role),
        });
    }

    Ok(persons)
}

pub(crate) fn write_persons<W: Write>(
    output: W,
    file: &'static str,
    snapshot: &Snapshot,
    role: Role,
) -> Result<(), PersistenceError> {
    let mut csv_writer = writer(output);
    csv_writer
        .write_record(PERSON_HEADER)
        .map_err(csv_error(file))?;

    for person in snapshot
        .persons
        .values()
        .filter(|person| person.primary_role() == role)
    {
        csv_writer
            .serialize(PersonRow {
                name: person.name.clone(),
                nric: person.nric.to_string(),
                age: person.age.to_string(),
                marital_status: person.marital_status.label().to_string(),
                password: person.password.clone(),
            })
            .map_err(csv_error(file))?;
    }

    csv_writer
        .flush()
        .map_err(|err| PersistenceError::Csv {
            file,
            source: err.into(),
        })
}

pub(crate) fn read_projects<R: Read>(
    input: R,
    snapshot: &mut Snapshot,
) -> Result<(), PersistenceError> {
    let file = PROJECT_FILE;
    let mut csv_reader = reader(input);
    let headers = csv_reader.headers().map_err(csv_error(file))?.clone();
    let officer_column = match headers.get(LEGACY_OFFICER_COLUMN) {
        Some(label) if label.eq_ignore_ascii_case("Visibility") => LEGACY_OFFICER_COLUMN + 1,
        _ => LEGACY_OFFICER_COLUMN,
    };
    let has_visibility = officer_column > LEGACY_OFFICER_COLUMN;

    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(csv_error(file))?;
        let ctx = RowContext {
            file,
            row: row_number(&record, index),
        };
        let cell = |position: usize| record.get(position).unwrap_or("");

        let name = ctx.required("ProjectName", cell(0))?;
        let mut flats = BTreeMap::new();
        for (offset, type_field, units_field, price_field) in [
            (2, "Type1", "NumberOfUnitsType1", "SellingPriceType1"),
            (5, "Type2", "NumberOfUnitsType2", "SellingPriceType2"),
        ] {
            let Some(flat_type) = optional(cell(offset)) else {
                continue;
            };
            let flat_type: FlatType = ctx.parse(type_field, flat_type)?;
            let available: u32 = ctx.parse(units_field, cell(offset + 1))?;
            let price: u32 = ctx.parse(price_field, cell(offset + 2))?;
            flats.insert(flat_type, (available, price));
        }
        if flats.is_empty() {
            return Err(ctx.malformed("Type1", "project offers no flat types"));
        }

        let opening_date: NaiveDate = ctx.parse("ApplicationOpeningDate", cell(8))?;
        let closing_date: NaiveDate = ctx.parse("ApplicationClosingDate", cell(9))?;
        if closing_date < opening_date {
            return Err(ctx.malformed(
                "ApplicationClosingDate",
                format!("{closing_date} is before opening date {opening_date}"),
            ));
        }
        let manager = ctx.person_ref("Manager", cell(10), &snapshot.persons)?;
        let officer_slots: u32 = ctx.parse("OfficerSlot", cell(11))?;
        let visible = if has_visibility {
            match optional(cell(LEGACY_OFFICER_COLUMN)) {
                Some(value) => ctx.parse("Visibility", &value.to_ascii_lowercase())?,
                None => true,
            }
        } else {
            true
        };

        let mut officers = BTreeSet::new();
        for value in record.iter().skip(officer_column) {
            for entry in value.split(',').filter_map(optional) {
                officers.insert(ctx.person_ref("Officers", entry, &snapshot.persons)?);
            }
        }

        for (flat_type, (available, _)) in &flats {
            let total = available + snapshot.booked_units(&name, *flat_type);
            snapshot
                .ledger
                .register(&name, *flat_type, total, *available)
                .map_err(|err| ctx.malformed("NumberOfUnits", err))?;
        }

        snapshot.projects.insert(
            name.clone(),
            Project {
                name,
                neighborhood: ctx.required("Neighborhood", cell(1))?,
                flat_prices: flats
                    .into_iter()
                    .map(|(flat_type, (_, price))| (flat_type, price))
                    .collect(),
                opening_date,
                closing_date,
                manager,
                officer_slots,
                officers,
                visible,
            },
        );
    }

    Ok(())
}

pub(crate) fn write_projects<W: Write>(
    output: W,
    snapshot: &Snapshot,
) -> Result<(), PersistenceError> {
    let file = PROJECT_FILE;
    let mut csv_writer = writer(output);
    csv_writer
        .write_record(PROJECT_HEADER)
        .map_err(csv_error(file))?;

    for project in snapshot.projects.values() {
        let mut row = vec![project.name.clone(), project.neighborhood.clone()];
        let mut offered = project.flat_prices.iter();
        for _ in 0..2 {
            match offered.next() {
                Some((flat_type, price)) => {
                    row.push(flat_type.label().to_string());
                    row.push(snapshot.ledger.available(&project.name, *flat_type).to_string());
                    row.push(price.to_string());
                }
                None => row.extend([String::new(), String::new(), String::new()]),
            }
        }
        row.push(project.opening_date.to_string());
        row.push(project.closing_date.to_string());
        row.push(project.manager.to_string());
        row.push(project.officer_slots.to_string());
        row.push(project.visible.to_string());
        row.extend(project.officers.iter().map(Nric::to_string));

        csv_writer.write_record(&row).map_err(csv_error(file))?;
    }

    csv_writer.flush().map_err(|err| PersistenceError::Csv {
        file,
        source: err.into(),
    })
}

#[derive(Debug, Deserialize, Serialize)]
struct ApplicationRow {
    #[serde(rename = "ApplicationId")]
    id: String,
    #[serde(rename = "ApplicantNRIC")]
    applicant: String,
    #[serde(rename = "ProjectName")]
    project: String,
    #[serde(rename = "FlatType")]
    flat_type: String,
    #[serde(rename = "Status")]
    status: String,
}

/// Reads the application table, returning the row each application came from
/// so that [`check_applications`] can point at it once projects are loaded.
pub(crate) fn read_applications<R: Read>(
    input: R,
    snapshot: &mut Snapshot,
) -> Result<BTreeMap<ApplicationId, usize>, PersistenceError> {
    let file = APPLICATION_FILE;
    let mut csv_reader = reader(input);
    let headers = csv_reader.headers().map_err(csv_error(file))?.clone();
    let mut rows = BTreeMap::new();

    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(csv_error(file))?;
        let ctx = RowContext {
            file,
            row: row_number(&record, index),
        };
        let row: ApplicationRow = record
            .deserialize(Some(&headers))
            .map_err(csv_error(file))?;

        let flat_type = optional(&row.flat_type)
            .map(|value| ctx.parse::<FlatType>("FlatType", value))
            .transpose()?;
        let status: ApplicationStatus = ctx.parse("Status", &row.status)?;
        if status == ApplicationStatus::Booked && flat_type.is_none() {
            return Err(ctx.malformed("FlatType", "booked application without a flat type"));
        }

        let applicant = ctx.known_person("ApplicantNRIC", &row.applicant, &snapshot.persons)?;
        let application = Application {
            id: ApplicationId(ctx.required("ApplicationId", &row.id)?),
            applicant,
            project: ctx.required("ProjectName", &row.project)?,
            flat_type,
            status,
        };
        rows.insert(application.id.clone(), ctx.row);
        snapshot
            .applications
            .insert(application.id.clone(), application);
    }

    Ok(rows)
}

/// Cross-table checks on loaded applications: the project exists, a booked
/// flat type has a ledger entry, and each applicant holds at most one
/// application that still binds them.
fn check_applications(
    snapshot: &Snapshot,
    rows: &BTreeMap<ApplicationId, usize>,
) -> Result<(), PersistenceError> {
    let mut ordered: Vec<(usize, &ApplicationId)> =
        rows.iter().map(|(id, row)| (*row, id)).collect();
    ordered.sort();

    let mut binding: BTreeMap<&Nric, &ApplicationId> = BTreeMap::new();
    for (row, id) in ordered {
        let Some(application) = snapshot.applications.get(id) else {
            continue;
        };
        let ctx = RowContext {
            file: APPLICATION_FILE,
            row,
        };

        if !snapshot.projects.contains_key(&application.project) {
            return Err(ctx.malformed(
                "ProjectName",
                format!("'{}' matches no project", application.project),
            ));
        }
        if let (ApplicationStatus::Booked, Some(flat_type)) =
            (application.status, application.flat_type)
        {
            if snapshot.ledger.units(&application.project, flat_type).is_none() {
                return Err(ctx.malformed(
                    "FlatType",
                    format!("project {} does not offer {flat_type}", application.project),
                ));
            }
        }
        if application.status.binds_applicant() {
            if let Some(existing) = binding.insert(&application.applicant, &application.id) {
                return Err(ctx.malformed(
                    "ApplicantNRIC",
                    format!(
                        "{} already holds active application {existing}",
                        application.applicant
                    ),
                ));
            }
        }
    }

    Ok(())
}

pub(crate) fn write_applications<W: Write>(
    output: W,
    snapshot: &Snapshot,
) -> Result<(), PersistenceError> {
    let file = APPLICATION_FILE;
    let mut csv_writer = writer(output);
    csv_writer
        .write_record(APPLICATION_HEADER)
        .map_err(csv_error(file))?;

    for application in snapshot.applications.values() {
        csv_writer
            .serialize(ApplicationRow {
                id: application.id.to_string(),
                applicant: application.applicant.to_string(),
                project: application.project.clone(),
                flat_type: application
                    .flat_type
                    .map(|flat_type| flat_type.label().to_string())
                    .unwrap_or_else(|| "null".to_string()),
                status: application.status.label().to_string(),
            })
            .map_err(csv_error(file))?;
    }

    csv_writer.flush().map_err(|err| PersistenceError::Csv {
        file,
        source: err.into(),
    })
}

#[derive(Debug, Deserialize, Serialize)]
struct RegistrationRow {
    #[serde(rename = "RegistrationID")]
    id: String,
    #[serde(rename = "OfficerNRIC")]
    officer: String,
    #[serde(rename = "ProjectName")]
    project: String,
    #[serde(rename = "RegistrationDate")]
    requested_on: String,
    #[serde(rename = "Status")]
    status: String,
}

pub(crate) fn read_registrations<R: Read>(
    input: R,
    snapshot: &mut Snapshot,
) -> Result<(), PersistenceError> {
    let file = REGISTRATION_FILE;
    let mut csv_reader = reader(input);
    let headers = csv_reader.headers().map_err(csv_error(file))?.clone();

    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(csv_error(file))?;
        let ctx = RowContext {
            file,
            row: row_number(&record, index),
        };
        let row: RegistrationRow = record
            .deserialize(Some(&headers))
            .map_err(csv_error(file))?;

        let registration = Registration {
            id: RegistrationId(ctx.required("RegistrationID", &row.id)?),
            officer: ctx.known_person("OfficerNRIC", &row.officer, &snapshot.persons)?,
            project: ctx.known_project("ProjectName", &row.project, snapshot)?,
            requested_on: ctx.parse("RegistrationDate", &row.requested_on)?,
            status: ctx.parse::<RegistrationStatus>("Status", &row.status)?,
        };
        snapshot
            .registrations
            .insert(registration.id.clone(), registration);
    }

    Ok(())
}

pub(crate) fn write_registrations<W: Write>(
    output: W,
    snapshot: &Snapshot,
) -> Result<(), PersistenceError> {
    let file = REGISTRATION_FILE;
    let mut csv_writer = writer(output);
    csv_writer
        .write_record(REGISTRATION_HEADER)
        .map_err(csv_error(file))?;

    for registration in snapshot.registrations.values() {
        csv_writer
            .serialize(RegistrationRow {
                id: registration.id.to_string(),
                officer: registration.officer.to_string(),
                project: registration.project.clone(),
                requested_on: registration.requested_on.to_string(),
                status: registration.status.label().to_string(),
            })
            .map_err(csv_error(file))?;
    }

    csv_writer.flush().map_err(|err| PersistenceError::Csv {
        file,
        source: err.into(),
    })
}

#[derive(Debug, Deserialize, Serialize)]
struct EnquiryRow {
    #[serde(rename = "EnquiryID")]
    id: String,
    #[serde(rename = "ApplicantNRIC")]
    creator: String,
    #[serde(rename = "ProjectName")]
    project: String,
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "Reply", default)]
    reply: String,
    #[serde(rename = "CreatedAt")]
    created_at: String,
    #[serde(rename = "RepliedAt", default)]
    replied_at: String,
    #[serde(rename = "RepliedBy", default)]
    replied_by: String,
}

pub(crate) fn read_enquiries<R: Read>(
    input: R,
    snapshot: &mut Snapshot,
) -> Result<(), PersistenceError> {
    let file = ENQUIRY_FILE;
    let mut csv_reader = reader(input);
    let headers = csv_reader.headers().map_err(csv_error(file))?.clone();

    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(csv_error(file))?;
        let ctx = RowContext {
            file,
            row: row_number(&record, index),
        };
        let row: EnquiryRow = record
            .deserialize(Some(&headers))
            .map_err(csv_error(file))?;

        let reply = match optional(&row.reply) {
            Some(content) => Some(EnquiryReply {
                content: content.to_string(),
                replied_by: optional(&row.replied_by)
                    .map(|value| ctx.parse::<Nric>("RepliedBy", value))
                    .transpose()?,
                replied_at: ctx.timestamp("RepliedAt", &row.replied_at)?,
            }),
            None => None,
        };

        let enquiry = Enquiry {
            id: EnquiryId(ctx.required("EnquiryID", &row.id)?),
            creator: ctx.known_person("ApplicantNRIC", &row.creator, &snapshot.persons)?,
            project: ctx.known_project("ProjectName", &row.project, snapshot)?,
            message: ctx.required("Message", &row.message)?,
            created_at: ctx.timestamp("CreatedAt", &row.created_at)?,
            reply,
        };
        snapshot.enquiries.insert(enquiry.id.clone(), enquiry);
    }

    Ok(())
}

pub(crate) fn write_enquiries<W: Write>(
    output: W,
    snapshot: &Snapshot,
) -> Result<(), PersistenceError> {
    let file = ENQUIRY_FILE;
    let mut csv_writer = writer(output);
    csv_writer
        .write_record(ENQUIRY_HEADER)
        .map_err(csv_error(file))?;

    for enquiry in snapshot.enquiries.values() {
        let reply = enquiry.reply.as_ref();
        csv_writer
            .serialize(EnquiryRow {
                id: enquiry.id.to_string(),
                creator: enquiry.creator.to_string(),
                project: enquiry.project.clone(),
                message: enquiry.message.clone(),
                reply: reply.map(|reply| reply.content.clone()).unwrap_or_default(),
                created_at: format_timestamp(enquiry.created_at),
                replied_at: reply
                    .map(|reply| format_timestamp(reply.replied_at))
                    .unwrap_or_default(),
                replied_by: reply
                    .and_then(|reply| reply.replied_by.as_ref())
                    .map(Nric::to_string)
                    .unwrap_or_default(),
            })
            .map_err(csv_error(file))?;
    }

    csv_writer.flush().map_err(|err| PersistenceError::Csv {
        file,
        source: err.into(),
    })
}

#[derive(Debug, Deserialize, Serialize)]
struct WithdrawalRow {
    #[serde(rename = "RequestId")]
    id: String,
    #[serde(rename = "ApplicationId")]
    application: String,
    #[serde(rename = "RequestedAt")]
    requested_at: String,
    #[serde(rename = "IsApproved", default)]
    approved: String,
    #[serde(rename = "ProcessedAt", default)]
    processed_at: String,
    #[serde(rename = "ProcessedBy", default)]
    processed_by: String,
}

pub(crate) fn read_withdrawals<R: Read>(
    input: R,
    snapshot: &mut Snapshot,
) -> Result<(), PersistenceError> {
    let file = WITHDRAWAL_FILE;
    let mut csv_reader = reader(input);
    let headers = csv_reader.headers().map_err(csv_error(file))?.clone();

    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(csv_error(file))?;
        let ctx = RowContext {
            file,
            row: row_number(&record, index),
        };
        let row: WithdrawalRow = record
            .deserialize(Some(&headers))
            .map_err(csv_error(file))?;

        let request = WithdrawalRequest {
            id: WithdrawalId(ctx.required("RequestId", &row.id)?),
            application: ctx.known_application("ApplicationId", &row.application, snapshot)?,
            requested_at: ctx.timestamp("RequestedAt", &row.requested_at)?,
            approved: optional(&row.approved)
                .map(|value| ctx.parse::<bool>("IsApproved", &value.to_ascii_lowercase()))
                .transpose()?,
            processed_at: optional(&row.processed_at)
                .map(|value| ctx.timestamp("ProcessedAt", value))
                .transpose()?,
            processed_by: optional(&row.processed_by)
                .map(|value| ctx.parse::<Nric>("ProcessedBy", value))
                .transpose()?,
        };
        snapshot.withdrawals.insert(request.id.clone(), request);
    }

    Ok(())
}

pub(crate) fn write_withdrawals<W: Write>(
    output: W,
    snapshot: &Snapshot,
) -> Result<(), PersistenceError> {
    let file = WITHDRAWAL_FILE;
    let mut csv_writer = writer(output);
    csv_writer
        .write_record(WITHDRAWAL_HEADER)
        .map_err(csv_error(file))?;

    for request in snapshot.withdrawals.values() {
        csv_writer
            .serialize(WithdrawalRow {
                id: request.id.to_string(),
                application: request.application.to_string(),
                requested_at: format_timestamp(request.requested_at),
                approved: request
                    .approved
                    .map(|approved| approved.to_string())
                    .unwrap_or_default(),
                processed_at: request
                    .processed_at
                    .map(format_timestamp)
                    .unwrap_or_default(),
                processed_by: request
                    .processed_by
                    .as_ref()
                    .map(Nric::to_string)
                    .unwrap_or_default(),
            })
            .map_err(csv_error(file))?;
    }

    csv_writer.flush().map_err(|err| PersistenceError::Csv {
        file,
        source: err.into(),
    })
}

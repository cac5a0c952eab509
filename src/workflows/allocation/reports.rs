use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, FlatType, MaritalStatus, Nric, Role,
};
use super::error::LifecycleError;
use super::snapshot::Snapshot;

/// Receipt issued for a booked flat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingReceipt {
    pub application_id: ApplicationId,
    pub applicant_name: String,
    pub nric: Nric,
    pub age: u8,
    pub marital_status: MaritalStatus,
    pub project: String,
    pub neighborhood: String,
    pub flat_type: FlatType,
    pub price: u32,
}

/// Optional narrowing for the manager booking report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReportFilter {
    pub marital_status: Option<MaritalStatus>,
    pub flat_type: Option<FlatType>,
    pub project: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingReportRow {
    pub application_id: ApplicationId,
    pub applicant_name: String,
    pub nric: Nric,
    pub age: u8,
    pub marital_status: MaritalStatus,
    pub project: String,
    pub flat_type: FlatType,
}

/// Sanitized representation of an application for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationView {
    pub application_id: ApplicationId,
    pub applicant: Nric,
    pub applicant_name: String,
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flat_type: Option<FlatType>,
    pub status: &'static str,
}

impl ApplicationView {
    fn from_application(state: &Snapshot, application: &Application) -> Self {
        let applicant_name = state
            .persons
            .get(&application.applicant)
            .map(|person| person.name.clone())
            .unwrap_or_default();

        Self {
            application_id: application.id.clone(),
            applicant: application.applicant.clone(),
            applicant_name,
            project: application.project.clone(),
            flat_type: application.flat_type,
            status: application.status.label(),
        }
    }
}

/// Receipt for a booked application. The applicant, the project's manager and
/// its handling officers may request one.
pub fn booking_receipt(
    state: &Snapshot,
    id: &ApplicationId,
    requester: &Nric,
) -> Result<BookingReceipt, LifecycleError> {
    let application = state.application(id)?;
    let project = state.project(&application.project)?;
    let allowed = &application.applicant == requester
        || project.is_managed_by(requester)
        || project.is_handled_by(requester);
    if !allowed {
        return Err(LifecycleError::unauthorized(
            requester,
            "issue a receipt for",
            id,
        ));
    }

    let flat_type = match (application.status, application.flat_type) {
        (ApplicationStatus::Booked, Some(flat_type)) => flat_type,
        _ => {
            return Err(LifecycleError::state(
                id,
                application.status.label(),
                "issue a receipt for",
            ))
        }
    };
    let applicant = state.person(&application.applicant)?;

    Ok(BookingReceipt {
        application_id: application.id.clone(),
        applicant_name: applicant.name.clone(),
        nric: applicant.nric.clone(),
        age: applicant.age,
        marital_status: applicant.marital_status,
        project: project.name.clone(),
        neighborhood: project.neighborhood.clone(),
        flat_type,
        price: project.flat_prices.get(&flat_type).copied().unwrap_or(0),
    })
}

/// Booked applications across the projects `manager` owns.
pub fn booking_report(
    state: &Snapshot,
    manager: &Nric,
    filter: &BookingReportFilter,
) -> Result<Vec<BookingReportRow>, LifecycleError> {
    let person = state.person(manager)?;
    if !person.has_role(Role::Manager) {
        return Err(LifecycleError::unauthorized(
            manager,
            "generate",
            "the booking report",
        ));
    }

    let rows = state
        .applications
        .values()
        .filter(|application| application.status == ApplicationStatus::Booked)
        .filter(|application| {
            state
                .projects
                .get(&application.project)
                .map(|project| project.is_managed_by(manager))
                .unwrap_or(false)
        })
        .filter(|application| {
            filter
                .project
                .as_ref()
                .map(|project| &application.project == project)
                .unwrap_or(true)
        })
        .filter_map(|application| {
            let applicant = state.persons.get(&application.applicant)?;
            let flat_type = application.flat_type?;
            Some(BookingReportRow {
                application_id: application.id.clone(),
                applicant_name: applicant.name.clone(),
                nric: applicant.nric.clone(),
                age: applicant.age,
                marital_status: applicant.marital_status,
                project: application.project.clone(),
                flat_type,
            })
        })
        .filter(|row| {
            filter
                .marital_status
                .map(|status| row.marital_status == status)
                .unwrap_or(true)
        })
        .filter(|row| {
            filter
                .flat_type
                .map(|flat_type| row.flat_type == flat_type)
                .unwrap_or(true)
        })
        .collect();

    Ok(rows)
}

/// Applications for one project, visible to its manager and handling officers.
pub fn project_applications(
    state: &Snapshot,
    actor: &Nric,
    project: &str,
) -> Result<Vec<ApplicationView>, LifecycleError> {
    let target = state.project(project)?;
    if !target.is_managed_by(actor) && !target.is_handled_by(actor) {
        return Err(LifecycleError::unauthorized(
            actor,
            "list applications for",
            project,
        ));
    }

    Ok(state
        .applications_for(&target.name)
        .map(|application| ApplicationView::from_application(state, application))
        .collect())
}

/// Every application `applicant` has ever submitted, including terminal ones.
pub fn applications_by(state: &Snapshot, applicant: &Nric) -> Vec<ApplicationView> {
    state
        .applications
        .values()
        .filter(|application| &application.applicant == applicant)
        .map(|application| ApplicationView::from_application(state, application))
        .collect()
}

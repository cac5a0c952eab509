use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Enquiry, EnquiryId, FlatType, Nric, Person,
    Project, Registration, RegistrationId, WithdrawalId, WithdrawalRequest,
};
use super::error::LifecycleError;
use super::inventory::InventoryLedger;

/// Complete in-memory state of the engine. This is the unit the persistence
/// gateway loads and saves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub persons: BTreeMap<Nric, Person>,
    pub projects: BTreeMap<String, Project>,
    pub ledger: InventoryLedger,
    pub applications: BTreeMap<ApplicationId, Application>,
    pub registrations: BTreeMap<RegistrationId, Registration>,
    pub enquiries: BTreeMap<EnquiryId, Enquiry>,
    pub withdrawals: BTreeMap<WithdrawalId, WithdrawalRequest>,
}

impl Snapshot {
    pub fn person(&self, nric: &Nric) -> Result<&Person, LifecycleError> {
        self.persons
            .get(nric)
            .ok_or_else(|| LifecycleError::not_found("person", nric))
    }

    pub fn project(&self, name: &str) -> Result<&Project, LifecycleError> {
        self.projects
            .get(name)
            .ok_or_else(|| LifecycleError::not_found("project", name))
    }

    pub fn project_mut(&mut self, name: &str) -> Result<&mut Project, LifecycleError> {
        self.projects
            .get_mut(name)
            .ok_or_else(|| LifecycleError::not_found("project", name))
    }

    pub fn application(&self, id: &ApplicationId) -> Result<&Application, LifecycleError> {
        self.applications
            .get(id)
            .ok_or_else(|| LifecycleError::not_found("application", id))
    }

    pub fn application_mut(
        &mut self,
        id: &ApplicationId,
    ) -> Result<&mut Application, LifecycleError> {
        self.applications
            .get_mut(id)
            .ok_or_else(|| LifecycleError::not_found("application", id))
    }

    pub fn registration(&self, id: &RegistrationId) -> Result<&Registration, LifecycleError> {
        self.registrations
            .get(id)
            .ok_or_else(|| LifecycleError::not_found("registration", id))
    }

    pub fn enquiry(&self, id: &EnquiryId) -> Result<&Enquiry, LifecycleError> {
        self.enquiries
            .get(id)
            .ok_or_else(|| LifecycleError::not_found("enquiry", id))
    }

    pub fn withdrawal(&self, id: &WithdrawalId) -> Result<&WithdrawalRequest, LifecycleError> {
        self.withdrawals
            .get(id)
            .ok_or_else(|| LifecycleError::not_found("withdrawal request", id))
    }

    /// The application currently binding `applicant`, if any.
    pub fn active_application(&self, applicant: &Nric) -> Option<&Application> {
        self.applications
            .values()
            .find(|application| {
                &application.applicant == applicant && application.status.binds_applicant()
            })
    }

    /// The booked application for `applicant`, carrying the booked project and flat type.
    pub fn booking(&self, applicant: &Nric) -> Option<&Application> {
        self.applications.values().find(|application| {
            &application.applicant == applicant && application.status == ApplicationStatus::Booked
        })
    }

    pub fn handling_projects<'a>(
        &'a self,
        officer: &'a Nric,
    ) -> impl Iterator<Item = &'a Project> {
        self.projects
            .values()
            .filter(move |project| project.is_handled_by(officer))
    }

    pub fn managed_projects<'a>(
        &'a self,
        manager: &'a Nric,
    ) -> impl Iterator<Item = &'a Project> {
        self.projects
            .values()
            .filter(move |project| project.is_managed_by(manager))
    }

    pub fn applications_for<'a>(
        &'a self,
        project: &'a str,
    ) -> impl Iterator<Item = &'a Application> {
        self.applications
            .values()
            .filter(move |application| application.project == project)
    }

    pub fn booked_units(&self, project: &str, flat_type: FlatType) -> u32 {
        self.applications_for(project)
            .filter(|application| {
                application.status == ApplicationStatus::Booked
                    && application.flat_type == Some(flat_type)
            })
            .count() as u32
    }

    pub fn next_application_id(&self) -> ApplicationId {
        ApplicationId(next_id("APP", self.applications.keys().map(|id| id.as_str())))
    }

    pub fn next_registration_id(&self) -> RegistrationId {
        RegistrationId(next_id("REG", self.registrations.keys().map(|id| id.as_str())))
    }

    pub fn next_enquiry_id(&self) -> EnquiryId {
        EnquiryId(next_id("ENQ", self.enquiries.keys().map(|id| id.as_str())))
    }

    pub fn next_withdrawal_id(&self) -> WithdrawalId {
        WithdrawalId(next_id("WDR", self.withdrawals.keys().map(|id| id.as_str())))
    }
}

/// Next `<prefix><n>` identifier after the highest numeric suffix among
/// `existing`. Identifiers from other schemes are ignored.
fn next_id<'a>(prefix: &str, existing: impl Iterator<Item = &'a str>) -> String {
    let highest = existing
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{prefix}{:04}", highest + 1)
}

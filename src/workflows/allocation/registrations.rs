use chrono::NaiveDate;

use super::domain::{Nric, Registration, RegistrationId, RegistrationStatus};
use super::eligibility::EligibilityEvaluator;
use super::error::{Conflict, LifecycleError};
use super::snapshot::Snapshot;

/// Officer registration state machine: PENDING to APPROVED or REJECTED.
pub struct RegistrationLifecycle<'a> {
    state: &'a mut Snapshot,
    evaluator: &'a EligibilityEvaluator,
}

impl<'a> RegistrationLifecycle<'a> {
    pub fn new(state: &'a mut Snapshot, evaluator: &'a EligibilityEvaluator) -> Self {
        Self { state, evaluator }
    }

    pub fn create(
        &mut self,
        officer: &Nric,
        project: &str,
        today: NaiveDate,
    ) -> Result<Registration, LifecycleError> {
        let person = self.state.person(officer)?;
        let target = self.state.project(project)?;

        if let Some(existing) = self.state.registrations.values().find(|registration| {
            &registration.officer == officer
                && registration.project == target.name
                && registration.status != RegistrationStatus::Rejected
        }) {
            return Err(Conflict::DuplicateRegistration {
                officer: officer.clone(),
                project: target.name.clone(),
                existing: existing.id.clone(),
            }
            .into());
        }

        self.evaluator
            .check_registration(self.state, person, target)
            .map_err(|reason| LifecycleError::ineligible(officer, project, reason))?;

        let registration = Registration {
            id: self.state.next_registration_id(),
            officer: officer.clone(),
            project: target.name.clone(),
            requested_on: today,
            status: RegistrationStatus::Pending,
        };
        self.state
            .registrations
            .insert(registration.id.clone(), registration.clone());
        Ok(registration)
    }

    /// Approval re-checks overlap and slot availability against the current
    /// state, since both may have changed since the officer registered.
    pub fn approve(
        &mut self,
        id: &RegistrationId,
        manager: &Nric,
    ) -> Result<Registration, LifecycleError> {
        let registration = self.state.registration(id)?;
        let project = self.state.project(&registration.project)?;
        if !project.is_managed_by(manager) {
            return Err(LifecycleError::unauthorized(manager, "approve", id));
        }
        if registration.status != RegistrationStatus::Pending {
            return Err(LifecycleError::state(
                id,
                registration.status.label(),
                "approve",
            ));
        }

        let officer = self.state.person(&registration.officer)?;
        self.evaluator
            .check_registration(self.state, officer, project)
            .map_err(|reason| LifecycleError::ineligible(&officer.nric, &project.name, reason))?;

        let officer = officer.nric.clone();
        let project_name = project.name.clone();

        let project = self.state.project_mut(&project_name)?;
        project.officer_slots -= 1;
        project.officers.insert(officer);

        let registration = self
            .state
            .registrations
            .get_mut(id)
            .ok_or_else(|| LifecycleError::not_found("registration", id))?;
        registration.status = RegistrationStatus::Approved;
        Ok(registration.clone())
    }

    pub fn reject(
        &mut self,
        id: &RegistrationId,
        manager: &Nric,
    ) -> Result<Registration, LifecycleError> {
        let registration = self.state.registration(id)?;
        let project = self.state.project(&registration.project)?;
        if !project.is_managed_by(manager) {
            return Err(LifecycleError::unauthorized(manager, "reject", id));
        }
        if registration.status != RegistrationStatus::Pending {
            return Err(LifecycleError::state(
                id,
                registration.status.label(),
                "reject",
            ));
        }

        let registration = self
            .state
            .registrations
            .get_mut(id)
            .ok_or_else(|| LifecycleError::not_found("registration", id))?;
        registration.status = RegistrationStatus::Rejected;
        Ok(registration.clone())
    }
}

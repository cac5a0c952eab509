use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, FlatType, Nric, WithdrawalId,
    WithdrawalRequest,
};
use super::eligibility::EligibilityEvaluator;
use super::error::{Conflict, LifecycleError, ValidationError};
use super::inventory::InventoryError;
use super::snapshot::Snapshot;

/// Result of a manager's withdrawal decision. A declined withdrawal is an
/// ordinary outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "application", rename_all = "snake_case")]
pub enum WithdrawalOutcome {
    Withdrawn(Application),
    Declined,
}

/// Application state machine:
///
/// ```text
/// PENDING --approve--> SUCCESSFUL --book--> BOOKED
///    |                     |                  |
///    +--reject--> UNSUCCESSFUL                |
///    +---------------withdraw-----------------+--> WITHDRAWN
/// ```
///
/// Every transition validates all preconditions before touching state, and
/// the ledger mutation is the only fallible write, so a failed call leaves the
/// snapshot untouched.
pub struct ApplicationLifecycle<'a> {
    state: &'a mut Snapshot,
    evaluator: &'a EligibilityEvaluator,
}

impl<'a> ApplicationLifecycle<'a> {
    pub fn new(state: &'a mut Snapshot, evaluator: &'a EligibilityEvaluator) -> Self {
        Self { state, evaluator }
    }

    pub fn create(
        &mut self,
        applicant: &Nric,
        project: &str,
        flat_type: Option<FlatType>,
        today: NaiveDate,
    ) -> Result<Application, LifecycleError> {
        let person = self.state.person(applicant)?;
        if let Some(existing) = self.state.active_application(applicant) {
            return Err(Conflict::ActiveApplication {
                applicant: applicant.clone(),
                existing: existing.id.clone(),
            }
            .into());
        }

        let target = self.state.project(project)?;
        self.evaluator
            .check_application(self.state, person, target, today)
            .map_err(|reason| LifecycleError::ineligible(applicant, project, reason))?;

        if let Some(flat_type) = flat_type {
            if !target.offers(flat_type) {
                return Err(ValidationError::FlatTypeNotOffered {
                    project: target.name.clone(),
                    flat_type,
                }
                .into());
            }
            self.evaluator
                .check_flat_type(person, flat_type)
                .map_err(|reason| LifecycleError::ineligible(applicant, project, reason))?;
        }

        let application = Application {
            id: self.state.next_application_id(),
            applicant: applicant.clone(),
            project: target.name.clone(),
            flat_type,
            status: ApplicationStatus::Pending,
        };
        self.state
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    pub fn approve(
        &mut self,
        id: &ApplicationId,
        manager: &Nric,
    ) -> Result<Application, LifecycleError> {
        self.decide(id, manager, "approve", ApplicationStatus::Successful)
    }

    /// Rejection also closes any withdrawal request still open for the
    /// application, recording it as not granted.
    pub fn reject(
        &mut self,
        id: &ApplicationId,
        manager: &Nric,
        now: NaiveDateTime,
    ) -> Result<Application, LifecycleError> {
        let application = self.decide(id, manager, "reject", ApplicationStatus::Unsuccessful)?;
        self.close_open_requests(id, manager, false, now);
        Ok(application)
    }

    fn decide(
        &mut self,
        id: &ApplicationId,
        manager: &Nric,
        action: &'static str,
        outcome: ApplicationStatus,
    ) -> Result<Application, LifecycleError> {
        let application = self.state.application(id)?;
        let project = self.state.project(&application.project)?;
        if !project.is_managed_by(manager) {
            return Err(LifecycleError::unauthorized(manager, action, id));
        }
        if application.status != ApplicationStatus::Pending {
            return Err(LifecycleError::state(id, application.status.label(), action));
        }

        let application = self.state.application_mut(id)?;
        application.status = outcome;
        Ok(application.clone())
    }

    pub fn book_flat(
        &mut self,
        id: &ApplicationId,
        officer: &Nric,
        flat_type: FlatType,
    ) -> Result<Application, LifecycleError> {
        let application = self.state.application(id)?;
        let project = self.state.project(&application.project)?;
        if application.status != ApplicationStatus::Successful {
            return Err(LifecycleError::state(
                id,
                application.status.label(),
                "book a flat for",
            ));
        }
        if !project.is_handled_by(officer) {
            return Err(LifecycleError::unauthorized(officer, "book a flat for", id));
        }
        if !project.offers(flat_type) {
            return Err(ValidationError::FlatTypeNotOffered {
                project: project.name.clone(),
                flat_type,
            }
            .into());
        }

        let applicant = self.state.person(&application.applicant)?;
        self.evaluator
            .check_flat_type(applicant, flat_type)
            .map_err(|reason| {
                LifecycleError::ineligible(&applicant.nric, &project.name, reason)
            })?;

        if self.state.ledger.available(&project.name, flat_type) == 0 {
            return Err(Conflict::NoUnitsAvailable {
                project: project.name.clone(),
                flat_type,
            }
            .into());
        }

        let project_name = project.name.clone();
        self.state.ledger.decrement(&project_name, flat_type)?;

        let application = self.state.application_mut(id)?;
        application.flat_type = Some(flat_type);
        application.status = ApplicationStatus::Booked;
        Ok(application.clone())
    }

    /// Manager decision on withdrawing an application. Approval releases a
    /// booked unit back to the ledger and closes any open withdrawal request
    /// as granted; a decline changes nothing.
    pub fn withdraw(
        &mut self,
        id: &ApplicationId,
        manager: &Nric,
        approve: bool,
        now: NaiveDateTime,
    ) -> Result<WithdrawalOutcome, LifecycleError> {
        let application = self.state.application(id)?;
        let project = self.state.project(&application.project)?;
        if !project.is_managed_by(manager) {
            return Err(LifecycleError::unauthorized(manager, "withdraw", id));
        }
        if !approve {
            return Ok(WithdrawalOutcome::Declined);
        }
        if !application.status.binds_applicant() {
            return Err(LifecycleError::state(
                id,
                application.status.label(),
                "withdraw",
            ));
        }

        if application.status == ApplicationStatus::Booked {
            let flat_type = application
                .flat_type
                .ok_or_else(|| InventoryError::UnassignedBooking(id.to_string()))?;
            let project_name = project.name.clone();
            self.state.ledger.increment(&project_name, flat_type)?;
        }

        let application = self.state.application_mut(id)?;
        application.status = ApplicationStatus::Withdrawn;
        let application = application.clone();
        self.close_open_requests(id, manager, true, now);
        Ok(WithdrawalOutcome::Withdrawn(application))
    }

    /// Applicant-initiated request awaiting a manager decision.
    pub fn request_withdrawal(
        &mut self,
        id: &ApplicationId,
        applicant: &Nric,
        now: NaiveDateTime,
    ) -> Result<WithdrawalRequest, LifecycleError> {
        let application = self.state.application(id)?;
        if &application.applicant != applicant {
            return Err(LifecycleError::unauthorized(
                applicant,
                "request withdrawal of",
                id,
            ));
        }
        if !application.status.binds_applicant() {
            return Err(LifecycleError::state(
                id,
                application.status.label(),
                "request withdrawal of",
            ));
        }
        if let Some(pending) = self
            .state
            .withdrawals
            .values()
            .find(|request| &request.application == id && !request.is_processed())
        {
            return Err(Conflict::PendingWithdrawal {
                application: id.clone(),
                request: pending.id.clone(),
            }
            .into());
        }

        let request = WithdrawalRequest {
            id: self.state.next_withdrawal_id(),
            application: id.clone(),
            requested_at: now,
            approved: None,
            processed_at: None,
            processed_by: None,
        };
        self.state
            .withdrawals
            .insert(request.id.clone(), request.clone());
        Ok(request)
    }

    pub fn process_withdrawal(
        &mut self,
        request_id: &WithdrawalId,
        manager: &Nric,
        approve: bool,
        now: NaiveDateTime,
    ) -> Result<WithdrawalOutcome, LifecycleError> {
        let request = self.state.withdrawal(request_id)?;
        if request.is_processed() {
            return Err(LifecycleError::state(request_id, "PROCESSED", "process"));
        }

        let application_id = request.application.clone();
        let application = self.state.application(&application_id)?;
        let outcome = if application.status.is_terminal() {
            // Already settled by a direct decision; only the request is closed.
            let project = self.state.project(&application.project)?;
            if !project.is_managed_by(manager) {
                return Err(LifecycleError::unauthorized(manager, "process", request_id));
            }
            let withdrawn = application.status == ApplicationStatus::Withdrawn;
            let outcome = if withdrawn {
                WithdrawalOutcome::Withdrawn(application.clone())
            } else {
                WithdrawalOutcome::Declined
            };
            self.record_decision(request_id, manager, approve && withdrawn, now);
            outcome
        } else {
            let outcome = self.withdraw(&application_id, manager, approve, now)?;
            self.record_decision(request_id, manager, approve, now);
            outcome
        };
        Ok(outcome)
    }

    fn record_decision(
        &mut self,
        request_id: &WithdrawalId,
        manager: &Nric,
        approved: bool,
        now: NaiveDateTime,
    ) {
        if let Some(request) = self.state.withdrawals.get_mut(request_id) {
            request.approved = Some(approved);
            request.processed_at = Some(now);
            request.processed_by = Some(manager.clone());
        }
    }

    /// Marks every unprocessed request for `application` as decided.
    fn close_open_requests(
        &mut self,
        application: &ApplicationId,
        manager: &Nric,
        approved: bool,
        now: NaiveDateTime,
    ) {
        for request in self
            .state
            .withdrawals
            .values_mut()
            .filter(|request| &request.application == application && !request.is_processed())
        {
            request.approved = Some(approved);
            request.processed_at = Some(now);
            request.processed_by = Some(manager.clone());
        }
    }
}

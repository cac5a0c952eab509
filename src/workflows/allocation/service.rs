use std::sync::Arc;

use tracing::{debug, info, warn};

use super::applications::{ApplicationLifecycle, WithdrawalOutcome};
use super::clock::Clock;
use super::domain::{
    Application, ApplicationId, Enquiry, EnquiryId, FlatType, Nric, Project, Registration,
    RegistrationId, WithdrawalId, WithdrawalRequest,
};
use super::eligibility::{EligibilityConfig, EligibilityEvaluator};
use super::enquiries::{self, EnquiryThread};
use super::error::LifecycleError;
use super::projects::{self, ProjectCatalog, ProjectDraft, ProjectListing};
use super::registrations::RegistrationLifecycle;
use super::reports::{self, ApplicationView, BookingReceipt, BookingReportFilter, BookingReportRow};
use super::repository::PersistenceGateway;
use super::snapshot::Snapshot;

/// Service composing the lifecycles, the eligibility evaluator and the
/// persistence gateway. Every committed mutation is followed by a full save.
///
/// Mutations take `&mut self`; callers sharing a service across threads wrap
/// it in a `Mutex` so that transitions on one store serialize.
pub struct AllocationService<G, C> {
    gateway: Arc<G>,
    clock: Arc<C>,
    evaluator: EligibilityEvaluator,
    state: Snapshot,
}

impl<G, C> AllocationService<G, C>
where
    G: PersistenceGateway + 'static,
    C: Clock + 'static,
{
    /// Load the current snapshot from `gateway`.
    pub fn open(
        gateway: Arc<G>,
        clock: Arc<C>,
        config: EligibilityConfig,
    ) -> Result<Self, LifecycleError> {
        let state = gateway.load()?;
        debug!(
            persons = state.persons.len(),
            projects = state.projects.len(),
            applications = state.applications.len(),
            "allocation snapshot loaded"
        );
        Ok(Self::with_snapshot(gateway, clock, config, state))
    }

    pub fn with_snapshot(
        gateway: Arc<G>,
        clock: Arc<C>,
        config: EligibilityConfig,
        state: Snapshot,
    ) -> Self {
        Self {
            gateway,
            clock,
            evaluator: EligibilityEvaluator::new(config),
            state,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    pub fn evaluator(&self) -> &EligibilityEvaluator {
        &self.evaluator
    }

    pub fn create_project(
        &mut self,
        manager: &Nric,
        draft: ProjectDraft,
    ) -> Result<Project, LifecycleError> {
        let today = self.clock.today();
        let project = ProjectCatalog::new(&mut self.state, self.evaluator.config())
            .create(manager, draft, today)?;
        info!(project = %project.name, %manager, visible = project.visible, "project created");
        self.commit(project)
    }

    pub fn set_project_visibility(
        &mut self,
        manager: &Nric,
        project: &str,
        visible: bool,
    ) -> Result<Project, LifecycleError> {
        let project = ProjectCatalog::new(&mut self.state, self.evaluator.config())
            .set_visibility(manager, project, visible)?;
        info!(project = %project.name, visible, "project visibility changed");
        self.commit(project)
    }

    /// Projects `viewer` may browse today.
    pub fn visible_projects(
        &self,
        viewer: &Nric,
    ) -> Result<Vec<ProjectListing>, LifecycleError> {
        let person = self.state.person(viewer)?;
        Ok(projects::listings_for(
            &self.state,
            &self.evaluator,
            person,
            self.clock.today(),
        ))
    }

    pub fn apply(
        &mut self,
        applicant: &Nric,
        project: &str,
        flat_type: Option<FlatType>,
    ) -> Result<Application, LifecycleError> {
        let today = self.clock.today();
        let application = ApplicationLifecycle::new(&mut self.state, &self.evaluator)
            .create(applicant, project, flat_type, today)?;
        info!(
            application = %application.id,
            %applicant,
            project = %application.project,
            "application submitted"
        );
        self.commit(application)
    }

    pub fn approve_application(
        &mut self,
        id: &ApplicationId,
        manager: &Nric,
    ) -> Result<Application, LifecycleError> {
        let application =
            ApplicationLifecycle::new(&mut self.state, &self.evaluator).approve(id, manager)?;
        info!(application = %id, %manager, "application approved");
        self.commit(application)
    }

    pub fn reject_application(
        &mut self,
        id: &ApplicationId,
        manager: &Nric,
    ) -> Result<Application, LifecycleError> {
        let now = self.clock.now();
        let application =
            ApplicationLifecycle::new(&mut self.state, &self.evaluator).reject(id, manager, now)?;
        info!(application = %id, %manager, "application rejected");
        self.commit(application)
    }

    pub fn book_flat(
        &mut self,
        id: &ApplicationId,
        officer: &Nric,
        flat_type: FlatType,
    ) -> Result<Application, LifecycleError> {
        let application = ApplicationLifecycle::new(&mut self.state, &self.evaluator)
            .book_flat(id, officer, flat_type)?;
        info!(
            application = %id,
            %officer,
            project = %application.project,
            flat_type = %flat_type,
            remaining = self.state.ledger.available(&application.project, flat_type),
            "flat booked"
        );
        self.commit(application)
    }

    pub fn withdraw(
        &mut self,
        id: &ApplicationId,
        manager: &Nric,
        approve: bool,
    ) -> Result<WithdrawalOutcome, LifecycleError> {
        let now = self.clock.now();
        let outcome = ApplicationLifecycle::new(&mut self.state, &self.evaluator)
            .withdraw(id, manager, approve, now)?;
        if outcome == WithdrawalOutcome::Declined {
            info!(application = %id, %manager, "withdrawal declined");
            return Ok(outcome);
        }
        info!(application = %id, %manager, "application withdrawn");
        self.commit(outcome)
    }

    pub fn request_withdrawal(
        &mut self,
        id: &ApplicationId,
        applicant: &Nric,
    ) -> Result<WithdrawalRequest, LifecycleError> {
        let now = self.clock.now();
        let request = ApplicationLifecycle::new(&mut self.state, &self.evaluator)
            .request_withdrawal(id, applicant, now)?;
        info!(request = %request.id, application = %id, %applicant, "withdrawal requested");
        self.commit(request)
    }

    pub fn process_withdrawal(
        &mut self,
        request: &WithdrawalId,
        manager: &Nric,
        approve: bool,
    ) -> Result<WithdrawalOutcome, LifecycleError> {
        let now = self.clock.now();
        let outcome = ApplicationLifecycle::new(&mut self.state, &self.evaluator)
            .process_withdrawal(request, manager, approve, now)?;
        info!(%request, %manager, approve, "withdrawal request processed");
        self.commit(outcome)
    }

    pub fn register_officer(
        &mut self,
        officer: &Nric,
        project: &str,
    ) -> Result<Registration, LifecycleError> {
        let today = self.clock.today();
        let registration = RegistrationLifecycle::new(&mut self.state, &self.evaluator)
            .create(officer, project, today)?;
        info!(registration = %registration.id, %officer, project, "officer registered");
        self.commit(registration)
    }

    pub fn approve_registration(
        &mut self,
        id: &RegistrationId,
        manager: &Nric,
    ) -> Result<Registration, LifecycleError> {
        let registration = RegistrationLifecycle::new(&mut self.state, &self.evaluator)
            .approve(id, manager)?;
        info!(
            registration = %id,
            %manager,
            project = %registration.project,
            "officer registration approved"
        );
        self.commit(registration)
    }

    pub fn reject_registration(
        &mut self,
        id: &RegistrationId,
        manager: &Nric,
    ) -> Result<Registration, LifecycleError> {
        let registration = RegistrationLifecycle::new(&mut self.state, &self.evaluator)
            .reject(id, manager)?;
        info!(registration = %id, %manager, "officer registration rejected");
        self.commit(registration)
    }

    pub fn submit_enquiry(
        &mut self,
        creator: &Nric,
        project: &str,
        content: &str,
    ) -> Result<Enquiry, LifecycleError> {
        let now = self.clock.now();
        let enquiry = EnquiryThread::new(&mut self.state).submit(creator, project, content, now)?;
        info!(enquiry = %enquiry.id, %creator, project, "enquiry submitted");
        self.commit(enquiry)
    }

    pub fn edit_enquiry(
        &mut self,
        id: &EnquiryId,
        user: &Nric,
        content: &str,
    ) -> Result<Enquiry, LifecycleError> {
        let enquiry = EnquiryThread::new(&mut self.state).edit(id, user, content)?;
        info!(enquiry = %id, "enquiry edited");
        self.commit(enquiry)
    }

    pub fn delete_enquiry(
        &mut self,
        id: &EnquiryId,
        user: &Nric,
    ) -> Result<Enquiry, LifecycleError> {
        let enquiry = EnquiryThread::new(&mut self.state).delete(id, user)?;
        info!(enquiry = %id, "enquiry deleted");
        self.commit(enquiry)
    }

    pub fn reply_enquiry(
        &mut self,
        id: &EnquiryId,
        user: &Nric,
        content: &str,
    ) -> Result<Enquiry, LifecycleError> {
        let now = self.clock.now();
        let enquiry = EnquiryThread::new(&mut self.state).reply(id, user, content, now)?;
        info!(enquiry = %id, replied_by = %user, "enquiry answered");
        self.commit(enquiry)
    }

    pub fn enquiries_for(&self, user: &Nric) -> Vec<Enquiry> {
        enquiries::enquiries_for(&self.state, user)
    }

    pub fn booking_receipt(
        &self,
        id: &ApplicationId,
        requester: &Nric,
    ) -> Result<BookingReceipt, LifecycleError> {
        reports::booking_receipt(&self.state, id, requester)
    }

    pub fn booking_report(
        &self,
        manager: &Nric,
        filter: &BookingReportFilter,
    ) -> Result<Vec<BookingReportRow>, LifecycleError> {
        reports::booking_report(&self.state, manager, filter)
    }

    pub fn project_applications(
        &self,
        actor: &Nric,
        project: &str,
    ) -> Result<Vec<ApplicationView>, LifecycleError> {
        reports::project_applications(&self.state, actor, project)
    }

    pub fn applications_by(&self, applicant: &Nric) -> Vec<ApplicationView> {
        reports::applications_by(&self.state, applicant)
    }

    /// Persist the snapshot after a committed transition. A failed save is
    /// reported to the caller while the in-memory transition stands.
    fn commit<T>(&self, value: T) -> Result<T, LifecycleError> {
        if let Err(err) = self.gateway.save(&self.state) {
            warn!(error = %err, "snapshot save failed after committed transition");
            return Err(err.into());
        }
        Ok(value)
    }
}

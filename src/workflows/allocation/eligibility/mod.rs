mod config;
mod policy;
mod rules;

pub use config::EligibilityConfig;
pub use policy::Ineligibility;

use chrono::NaiveDate;

use super::domain::{FlatType, Person, Project, Role};
use super::snapshot::Snapshot;

/// Side-effect-free evaluator for applicant and officer eligibility.
#[derive(Debug, Clone, Default)]
pub struct EligibilityEvaluator {
    config: EligibilityConfig,
}

impl EligibilityEvaluator {
    pub fn new(config: EligibilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    /// SINGLE persons qualify only for the configured single flat types once
    /// they reach the single minimum age; MARRIED persons qualify for any
    /// type once they reach the married minimum age.
    pub fn is_eligible(&self, person: &Person, flat_type: FlatType) -> bool {
        self.check_flat_type(person, flat_type).is_ok()
    }

    pub fn check_flat_type(
        &self,
        person: &Person,
        flat_type: FlatType,
    ) -> Result<(), Ineligibility> {
        rules::flat_type_rule(person, flat_type, &self.config)
    }

    pub fn eligible_flat_types(&self, person: &Person, project: &Project) -> Vec<FlatType> {
        project
            .offered_flat_types()
            .filter(|flat_type| self.is_eligible(person, *flat_type))
            .collect()
    }

    pub fn can_apply(
        &self,
        state: &Snapshot,
        person: &Person,
        project: &Project,
        today: NaiveDate,
    ) -> bool {
        self.check_application(state, person, project, today).is_ok()
    }

    /// First rule an application would break, if any.
    pub fn check_application(
        &self,
        state: &Snapshot,
        person: &Person,
        project: &Project,
        today: NaiveDate,
    ) -> Result<(), Ineligibility> {
        rules::role_rule(person, Role::Applicant)?;
        rules::separation_rule(person, project)?;
        rules::active_application_rule(state, person)?;
        if !project.visible {
            return Err(Ineligibility::ProjectHidden);
        }
        rules::window_rule(project, today)?;
        if self.eligible_flat_types(person, project).is_empty() {
            return Err(Ineligibility::NoEligibleFlatType);
        }
        Ok(())
    }

    pub fn can_register_as_officer(
        &self,
        state: &Snapshot,
        officer: &Person,
        project: &Project,
    ) -> bool {
        self.check_registration(state, officer, project).is_ok()
    }

    /// Rules re-checked both when an officer registers and when a manager
    /// approves the registration.
    pub fn check_registration(
        &self,
        state: &Snapshot,
        officer: &Person,
        project: &Project,
    ) -> Result<(), Ineligibility> {
        rules::role_rule(officer, Role::Officer)?;
        rules::separation_rule(officer, project)?;
        rules::applied_to_project_rule(state, officer, project)?;
        rules::overlap_rule(state, officer, project)?;
        rules::officer_slot_rule(project)
    }
}

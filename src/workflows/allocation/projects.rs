use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{DateWindow, FlatType, Nric, Person, Project, Role};
use super::eligibility::{EligibilityConfig, EligibilityEvaluator};
use super::error::{non_blank, Conflict, LifecycleError, ValidationError};
use super::snapshot::Snapshot;

/// Units and price for one flat type in a new project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatSupply {
    pub units: u32,
    pub price: u32,
}

/// Manager input for a new project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    pub neighborhood: String,
    pub flats: BTreeMap<FlatType, FlatSupply>,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    pub officer_slots: u32,
    #[serde(default)]
    pub visible: bool,
}

/// Manager-owned project lifecycle: creation and visibility.
pub struct ProjectCatalog<'a> {
    state: &'a mut Snapshot,
    config: &'a EligibilityConfig,
}

impl<'a> ProjectCatalog<'a> {
    pub fn new(state: &'a mut Snapshot, config: &'a EligibilityConfig) -> Self {
        Self { state, config }
    }

    pub fn create(
        &mut self,
        manager: &Nric,
        draft: ProjectDraft,
        today: NaiveDate,
    ) -> Result<Project, LifecycleError> {
        let person = self.state.person(manager)?;
        if !person.has_role(Role::Manager) {
            return Err(LifecycleError::unauthorized(
                manager,
                "create project",
                &draft.name,
            ));
        }

        let name = non_blank(&draft.name, "project name")?;
        let neighborhood = non_blank(&draft.neighborhood, "neighborhood")?;
        let window = DateWindow::new(draft.opening_date, draft.closing_date)?;
        if window.closing < today {
            return Err(ValidationError::PastDate {
                field: "closing date",
                date: window.closing,
            }
            .into());
        }
        if draft.flats.is_empty() {
            return Err(ValidationError::NoFlatTypes.into());
        }
        let max = self.config.max_officer_slots;
        if draft.officer_slots == 0 || draft.officer_slots > max {
            return Err(ValidationError::OfficerSlots {
                max,
                found: draft.officer_slots,
            }
            .into());
        }

        if self.state.projects.contains_key(&name) {
            return Err(Conflict::DuplicateProject(name).into());
        }
        if let Some(existing) = self
            .state
            .managed_projects(manager)
            .find(|project| project.window().overlaps(&window))
        {
            return Err(Conflict::ManagerWindowOverlap {
                manager: manager.clone(),
                existing: existing.name.clone(),
            }
            .into());
        }

        for (flat_type, supply) in &draft.flats {
            self.state
                .ledger
                .register(&name, *flat_type, supply.units, supply.units)?;
        }

        let project = Project {
            name: name.clone(),
            neighborhood,
            flat_prices: draft
                .flats
                .iter()
                .map(|(flat_type, supply)| (*flat_type, supply.price))
                .collect(),
            opening_date: window.opening,
            closing_date: window.closing,
            manager: manager.clone(),
            officer_slots: draft.officer_slots,
            officers: BTreeSet::new(),
            visible: draft.visible,
        };
        self.state.projects.insert(name, project.clone());
        Ok(project)
    }

    pub fn set_visibility(
        &mut self,
        manager: &Nric,
        project: &str,
        visible: bool,
    ) -> Result<Project, LifecycleError> {
        let target = self.state.project_mut(project)?;
        if !target.is_managed_by(manager) {
            return Err(LifecycleError::unauthorized(
                manager,
                "change visibility of",
                project,
            ));
        }
        target.visible = visible;
        Ok(target.clone())
    }
}

/// Public view of one flat type within a project listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatListing {
    pub flat_type: FlatType,
    pub available_units: u32,
    pub total_units: u32,
    pub price: u32,
    pub eligible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectListing {
    pub name: String,
    pub neighborhood: String,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    pub open_now: bool,
    pub visible: bool,
    pub flats: Vec<FlatListing>,
}

/// Projects `viewer` may see: managers see everything; everyone else sees
/// visible projects with at least one flat type they qualify for, plus any
/// project they applied to or handle.
pub fn listings_for(
    state: &Snapshot,
    evaluator: &EligibilityEvaluator,
    viewer: &Person,
    today: NaiveDate,
) -> Vec<ProjectListing> {
    state
        .projects
        .values()
        .filter(|project| {
            if viewer.has_role(Role::Manager) || project.is_handled_by(&viewer.nric) {
                return true;
            }
            let applied = state
                .applications_for(&project.name)
                .any(|application| application.applicant == viewer.nric);
            applied
                || (project.visible && !evaluator.eligible_flat_types(viewer, project).is_empty())
        })
        .map(|project| listing(state, evaluator, viewer, project, today))
        .collect()
}

fn listing(
    state: &Snapshot,
    evaluator: &EligibilityEvaluator,
    viewer: &Person,
    project: &Project,
    today: NaiveDate,
) -> ProjectListing {
    let flats = project
        .flat_prices
        .iter()
        .map(|(flat_type, price)| {
            let units = state.ledger.units(&project.name, *flat_type);
            FlatListing {
                flat_type: *flat_type,
                available_units: units.map(|units| units.available).unwrap_or(0),
                total_units: units.map(|units| units.total).unwrap_or(0),
                price: *price,
                eligible: evaluator.is_eligible(viewer, *flat_type),
            }
        })
        .collect();

    ProjectListing {
        name: project.name.clone(),
        neighborhood: project.neighborhood.clone(),
        opening_date: project.opening_date,
        closing_date: project.closing_date,
        open_now: project.is_open_on(today),
        visible: project.visible,
        flats,
    }
}

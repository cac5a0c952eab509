use chrono::NaiveDate;

use super::super::domain::{FlatType, MaritalStatus, Person, Project, Role};
use super::super::snapshot::Snapshot;
use super::config::EligibilityConfig;
use super::policy::Ineligibility;

pub(crate) fn flat_type_rule(
    person: &Person,
    flat_type: FlatType,
    config: &EligibilityConfig,
) -> Result<(), Ineligibility> {
    match person.marital_status {
        MaritalStatus::Single => {
            if !config.single_flat_types.contains(&flat_type) {
                return Err(Ineligibility::FlatTypeRestricted {
                    marital_status: MaritalStatus::Single,
                    flat_type,
                });
            }
            minimum_age_rule(person, config.single_minimum_age)
        }
        MaritalStatus::Married => minimum_age_rule(person, config.married_minimum_age),
    }
}

fn minimum_age_rule(person: &Person, minimum: u8) -> Result<(), Ineligibility> {
    if person.age < minimum {
        return Err(Ineligibility::BelowMinimumAge {
            marital_status: person.marital_status,
            age: person.age,
            minimum,
        });
    }
    Ok(())
}

pub(crate) fn role_rule(person: &Person, role: Role) -> Result<(), Ineligibility> {
    if person.has_role(role) {
        Ok(())
    } else {
        Err(Ineligibility::MissingRole(role))
    }
}

pub(crate) fn window_rule(project: &Project, today: NaiveDate) -> Result<(), Ineligibility> {
    if project.is_open_on(today) {
        return Ok(());
    }
    Err(Ineligibility::OutsideWindow {
        today,
        opening: project.opening_date,
        closing: project.closing_date,
    })
}

/// A manager may not apply to or administer their own project, and an
/// officer may not apply to a project they handle.
pub(crate) fn separation_rule(person: &Person, project: &Project) -> Result<(), Ineligibility> {
    if project.is_managed_by(&person.nric) {
        return Err(Ineligibility::ManagesProject);
    }
    if project.is_handled_by(&person.nric) {
        return Err(Ineligibility::HandlesProject);
    }
    Ok(())
}

pub(crate) fn active_application_rule(
    state: &Snapshot,
    person: &Person,
) -> Result<(), Ineligibility> {
    match state.active_application(&person.nric) {
        Some(existing) => Err(Ineligibility::ActiveApplication(existing.id.clone())),
        None => Ok(()),
    }
}

pub(crate) fn applied_to_project_rule(
    state: &Snapshot,
    officer: &Person,
    project: &Project,
) -> Result<(), Ineligibility> {
    let existing = state.applications_for(&project.name).find(|application| {
        application.applicant == officer.nric && application.status.binds_applicant()
    });
    match existing {
        Some(application) => Err(Ineligibility::AppliedToProject(application.id.clone())),
        None => Ok(()),
    }
}

pub(crate) fn overlap_rule(
    state: &Snapshot,
    officer: &Person,
    project: &Project,
) -> Result<(), Ineligibility> {
    let window = project.window();
    let clash = state
        .handling_projects(&officer.nric)
        .filter(|handled| handled.name != project.name)
        .find(|handled| handled.window().overlaps(&window));
    match clash {
        Some(handled) => Err(Ineligibility::OverlappingAssignment {
            project: handled.name.clone(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn officer_slot_rule(project: &Project) -> Result<(), Ineligibility> {
    if project.officer_slots == 0 {
        return Err(Ineligibility::NoOfficerSlots);
    }
    Ok(())
}

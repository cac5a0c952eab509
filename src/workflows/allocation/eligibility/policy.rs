use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::super::domain::{ApplicationId, FlatType, MaritalStatus, Role};

/// Reasons a person may not apply to, or administer, a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ineligibility {
    MissingRole(Role),
    BelowMinimumAge {
        marital_status: MaritalStatus,
        age: u8,
        minimum: u8,
    },
    FlatTypeRestricted {
        marital_status: MaritalStatus,
        flat_type: FlatType,
    },
    NoEligibleFlatType,
    ProjectHidden,
    OutsideWindow {
        today: NaiveDate,
        opening: NaiveDate,
        closing: NaiveDate,
    },
    ActiveApplication(ApplicationId),
    ManagesProject,
    HandlesProject,
    AppliedToProject(ApplicationId),
    OverlappingAssignment { project: String },
    NoOfficerSlots,
}

impl Ineligibility {
    pub fn summary(&self) -> String {
        match self {
            Ineligibility::MissingRole(role) => format!("requires the {} role", role.label()),
            Ineligibility::BelowMinimumAge {
                marital_status,
                age,
                minimum,
            } => format!(
                "{} applicants must be at least {minimum} (age {age})",
                marital_status.label().to_ascii_lowercase()
            ),
            Ineligibility::FlatTypeRestricted {
                marital_status,
                flat_type,
            } => format!(
                "{} applicants may not apply for {flat_type} flats",
                marital_status.label().to_ascii_lowercase()
            ),
            Ineligibility::NoEligibleFlatType => {
                "project offers no flat type the applicant qualifies for".to_string()
            }
            Ineligibility::ProjectHidden => "project is not visible".to_string(),
            Ineligibility::OutsideWindow {
                today,
                opening,
                closing,
            } => format!("{today} is outside the application window {opening} to {closing}"),
            Ineligibility::ActiveApplication(id) => {
                format!("already holds active application {id}")
            }
            Ineligibility::ManagesProject => "manages this project".to_string(),
            Ineligibility::HandlesProject => "is an officer handling this project".to_string(),
            Ineligibility::AppliedToProject(id) => {
                format!("holds application {id} for this project")
            }
            Ineligibility::OverlappingAssignment { project } => {
                format!("already handles project {project} during an overlapping window")
            }
            Ineligibility::NoOfficerSlots => "no officer slots remain".to_string(),
        }
    }
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

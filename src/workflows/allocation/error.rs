use chrono::NaiveDate;

use super::domain::{ApplicationId, FlatType, Nric, RegistrationId, WithdrawalId};
use super::eligibility::Ineligibility;
use super::inventory::InventoryError;
use super::repository::PersistenceError;

/// Malformed input: identifiers, blank content, date windows and enum labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid NRIC (expected S or T, seven digits, uppercase letter)")]
    InvalidNric(String),
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
    #[error("application window closes on {closing} before it opens on {opening}")]
    InvalidWindow {
        opening: NaiveDate,
        closing: NaiveDate,
    },
    #[error("{field} {date} is already in the past")]
    PastDate {
        field: &'static str,
        date: NaiveDate,
    },
    #[error("unknown flat type '{0}'")]
    UnknownFlatType(String),
    #[error("unknown marital status '{0}'")]
    UnknownMaritalStatus(String),
    #[error("unknown {kind} status '{value}'")]
    UnknownStatus { kind: &'static str, value: String },
    #[error("officer slots must be between 1 and {max} (found {found})")]
    OfficerSlots { max: u32, found: u32 },
    #[error("a project must offer at least one flat type")]
    NoFlatTypes,
    #[error("project {project} does not offer {flat_type} flats")]
    FlatTypeNotOffered { project: String, flat_type: FlatType },
}

/// Operations that collide with an existing record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
    #[error("{applicant} already holds application {existing}")]
    ActiveApplication {
        applicant: Nric,
        existing: ApplicationId,
    },
    #[error("{officer} already registered for project {project} ({existing})")]
    DuplicateRegistration {
        officer: Nric,
        project: String,
        existing: RegistrationId,
    },
    #[error("project {0} already exists")]
    DuplicateProject(String),
    #[error("{manager} already manages project {existing} during an overlapping window")]
    ManagerWindowOverlap { manager: Nric, existing: String },
    #[error("application {application} already has pending withdrawal request {request}")]
    PendingWithdrawal {
        application: ApplicationId,
        request: WithdrawalId,
    },
    #[error("no {flat_type} units remain in project {project}")]
    NoUnitsAvailable { project: String, flat_type: FlatType },
}

/// Error returned by every lifecycle operation.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("{nric} is not eligible for project {project}: {reason}")]
    Eligibility {
        nric: Nric,
        project: String,
        reason: Ineligibility,
    },
    #[error("conflict: {0}")]
    Conflict(#[from] Conflict),
    #[error("{entity} is {status}; cannot {action}")]
    State {
        entity: String,
        status: &'static str,
        action: &'static str,
    },
    #[error("{actor} is not authorised to {action} {entity}")]
    Authorization {
        actor: Nric,
        action: &'static str,
        entity: String,
    },
    #[error("inventory invariant violated: {0}")]
    Inventory(#[from] InventoryError),
    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
}

impl LifecycleError {
    /// Expected outcomes that should be shown to the caller. Inventory and
    /// persistence failures are internal faults.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Inventory(_) | Self::Persistence(_))
    }

    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn state(entity: impl ToString, status: &'static str, action: &'static str) -> Self {
        Self::State {
            entity: entity.to_string(),
            status,
            action,
        }
    }

    pub(crate) fn unauthorized(actor: &Nric, action: &'static str, entity: impl ToString) -> Self {
        Self::Authorization {
            actor: actor.clone(),
            action,
            entity: entity.to_string(),
        }
    }

    pub(crate) fn ineligible(nric: &Nric, project: &str, reason: Ineligibility) -> Self {
        Self::Eligibility {
            nric: nric.clone(),
            project: project.to_string(),
            reason,
        }
    }
}

/// Trimmed `value`, or a validation error naming `field` when it is blank.
pub(crate) fn non_blank(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(trimmed.to_string())
}

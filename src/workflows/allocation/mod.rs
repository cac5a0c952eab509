//! BTO flat allocation: eligibility, application and officer-registration
//! lifecycles, enquiries, the per-project unit ledger, and snapshot
//! persistence.
//!
//! Lifecycle types borrow a [`Snapshot`] mutably for the duration of one
//! transition; [`AllocationService`] owns the snapshot and saves it through a
//! [`PersistenceGateway`] after every committed change.

pub mod applications;
pub mod clock;
pub mod domain;
pub mod eligibility;
pub mod enquiries;
pub mod error;
pub mod inventory;
pub mod projects;
pub mod registrations;
pub mod reports;
pub mod repository;
pub mod service;
pub mod snapshot;
pub mod store;

#[cfg(test)]
mod tests;

pub use applications::{ApplicationLifecycle, WithdrawalOutcome};
pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, DateWindow, Enquiry, EnquiryId, EnquiryReply,
    EnquiryState, FlatType, MaritalStatus, Nric, Person, Project, Registration, RegistrationId,
    RegistrationStatus, Role, WithdrawalId, WithdrawalRequest,
};
pub use eligibility::{EligibilityConfig, EligibilityEvaluator, Ineligibility};
pub use enquiries::EnquiryThread;
pub use error::{Conflict, LifecycleError, ValidationError};
pub use inventory::{InventoryError, InventoryLedger, UnitCount};
pub use projects::{FlatListing, FlatSupply, ProjectCatalog, ProjectDraft, ProjectListing};
pub use registrations::RegistrationLifecycle;
pub use reports::{ApplicationView, BookingReceipt, BookingReportFilter, BookingReportRow};
pub use repository::{PersistenceError, PersistenceGateway};
pub use service::AllocationService;
pub use snapshot::Snapshot;
pub use store::{CsvGateway, MemoryGateway};

//! Lifecycle and eligibility engine for Build-To-Order flat allocation.
//!
//! The engine governs applications, officer registrations, flat inventory and
//! enquiry threads for BTO projects. Callers drive it through
//! [`workflows::allocation::AllocationService`], which validates every
//! cross-entity invariant, mutates the in-memory [`workflows::allocation::Snapshot`]
//! and persists the result through a [`workflows::allocation::PersistenceGateway`].

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

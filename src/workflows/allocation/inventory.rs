use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::FlatType;

/// Unit counts for one flat type within one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCount {
    pub total: u32,
    pub available: u32,
}

impl UnitCount {
    pub fn booked(&self) -> u32 {
        self.total - self.available
    }
}

/// Ledger failures. None of these are expected from correct callers; they
/// signal a broken invariant rather than a user mistake.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("project {project} has no {flat_type} ledger entry")]
    UnknownEntry { project: String, flat_type: FlatType },
    #[error("{flat_type} units in project {project} are exhausted")]
    Exhausted { project: String, flat_type: FlatType },
    #[error("{flat_type} units in project {project} are already at their total of {total}")]
    Overflow {
        project: String,
        flat_type: FlatType,
        total: u32,
    },
    #[error("booked application {0} carries no flat type")]
    UnassignedBooking(String),
    #[error("{flat_type} in project {project} lists {available} available of {total} total")]
    Inconsistent {
        project: String,
        flat_type: FlatType,
        total: u32,
        available: u32,
    },
}

/// Per-project, per-flat-type unit counts. Every mutation either fully
/// applies or leaves the entry untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLedger {
    entries: BTreeMap<String, BTreeMap<FlatType, UnitCount>>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the unit counts for a project's flat type, replacing any earlier entry.
    pub fn register(
        &mut self,
        project: &str,
        flat_type: FlatType,
        total: u32,
        available: u32,
    ) -> Result<(), InventoryError> {
        if available > total {
            return Err(InventoryError::Inconsistent {
                project: project.to_string(),
                flat_type,
                total,
                available,
            });
        }

        self.entries
            .entry(project.to_string())
            .or_default()
            .insert(flat_type, UnitCount { total, available });
        Ok(())
    }

    pub fn units(&self, project: &str, flat_type: FlatType) -> Option<UnitCount> {
        self.entries
            .get(project)
            .and_then(|types| types.get(&flat_type))
            .copied()
    }

    pub fn available(&self, project: &str, flat_type: FlatType) -> u32 {
        self.units(project, flat_type)
            .map(|units| units.available)
            .unwrap_or(0)
    }

    pub fn project_units(&self, project: &str) -> Vec<(FlatType, UnitCount)> {
        self.entries
            .get(project)
            .map(|types| types.iter().map(|(kind, units)| (*kind, *units)).collect())
            .unwrap_or_default()
    }

    /// Consume one unit for a booking.
    pub fn decrement(
        &mut self,
        project: &str,
        flat_type: FlatType,
    ) -> Result<UnitCount, InventoryError> {
        let units = self.entry_mut(project, flat_type)?;
        if units.available == 0 {
            return Err(InventoryError::Exhausted {
                project: project.to_string(),
                flat_type,
            });
        }
        units.available -= 1;
        Ok(*units)
    }

    /// Return one unit released by a withdrawn booking.
    pub fn increment(
        &mut self,
        project: &str,
        flat_type: FlatType,
    ) -> Result<UnitCount, InventoryError> {
        let units = self.entry_mut(project, flat_type)?;
        if units.available == units.total {
            return Err(InventoryError::Overflow {
                project: project.to_string(),
                flat_type,
                total: units.total,
            });
        }
        units.available += 1;
        Ok(*units)
    }

    fn entry_mut(
        &mut self,
        project: &str,
        flat_type: FlatType,
    ) -> Result<&mut UnitCount, InventoryError> {
        self.entries
            .get_mut(project)
            .and_then(|types| types.get_mut(&flat_type))
            .ok_or_else(|| InventoryError::UnknownEntry {
                project: project.to_string(),
                flat_type,
            })
    }
}

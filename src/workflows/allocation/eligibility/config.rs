use serde::{Deserialize, Serialize};

use super::super::domain::FlatType;

/// Age thresholds and capacity limits backing the eligibility rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityConfig {
    pub single_minimum_age: u8,
    pub married_minimum_age: u8,
    /// Flat types open to single applicants who meet the age threshold.
    pub single_flat_types: Vec<FlatType>,
    pub max_officer_slots: u32,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            single_minimum_age: 35,
            married_minimum_age: 21,
            single_flat_types: vec![FlatType::TwoRoom],
            max_officer_slots: 10,
        }
    }
}

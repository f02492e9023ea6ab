//! Organization metadata
//!
//! Descriptive information produced by initialization: identity, headcount,
//! structure, the dataset the organization came from (if any) and every
//! warning accumulated while bootstrapping.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata describing the simulated organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgMetadata {
    pub simulation_id: Uuid,
    pub name: String,
    pub total_employees: u64,
    pub num_teams: usize,
    pub hierarchy_levels: u32,
    /// RFC 3339 timestamp of initialization
    pub simulation_start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Values back-derived from a dataset, when initialized from real data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived: Option<DerivedParameters>,
}

/// Parameters and score means back-derived from a team dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedParameters {
    pub team_size: Option<f64>,
    pub hierarchy_levels: Option<u32>,
    pub communication_density: Option<f64>,
    pub turnover_rate: Option<f64>,
    pub performance_mean: Option<f64>,
    pub innovation_mean: Option<f64>,
    pub satisfaction_mean: Option<f64>,
}

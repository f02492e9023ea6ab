//! Domain models for the organization simulator

pub mod graph;
pub mod intervention;
pub mod organization;
pub mod results;
pub mod roster;
pub mod team;

// Re-exports
pub use graph::{GraphSnapshot, OrganizationGraph};
pub use intervention::{Intervention, InterventionError, InterventionKind, InterventionLedger};
pub use organization::{DerivedParameters, OrgMetadata};
pub use results::{MonthlyResult, ResultsSeries};
pub use roster::{RosterError, TeamRoster};
pub use team::{Team, TeamAttributes, TeamId};

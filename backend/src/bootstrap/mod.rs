//! Organization bootstrap
//!
//! Two initialization strategies populate the roster and graph:
//!
//! - **Synthetic**: teams sampled from the parameter set ([`synthetic`])
//! - **Real data**: teams aggregated from a processed dataset
//!   ([`real_data`]), with parameters back-derived and merged under caller
//!   precedence
//!
//! A dataset that yields no teams falls back to synthetic generation and the
//! reason is recorded as a warning. Both paths end with the month-0 results
//! record and the organization metadata.

pub mod dataset;
pub mod real_data;
pub mod synthetic;

pub use dataset::{Dataset, DatasetError};

use crate::config::ParameterSet;
use crate::models::graph::OrganizationGraph;
use crate::models::organization::{DerivedParameters, OrgMetadata};
use crate::models::results::MonthlyResult;
use crate::models::roster::TeamRoster;
use crate::orchestrator::metrics;
use crate::rng::RngManager;
use uuid::Uuid;

const SYNTHETIC_ORGANIZATION_NAME: &str = "Simulated Organization";

/// Initial simulation state produced by a bootstrap strategy
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub roster: TeamRoster,
    pub graph: OrganizationGraph,
    /// Parameters in effect (merged with derived values in real-data mode)
    pub parameters: ParameterSet,
    pub metadata: OrgMetadata,
    pub initial_record: MonthlyResult,
}

/// Generate a synthetic organization
pub fn synthetic(params: &ParameterSet, rng: &mut RngManager) -> Bootstrap {
    let (roster, graph) = synthetic::generate(params, rng);
    tracing::info!(
        teams = roster.len(),
        employees = roster.total_employees(),
        edges = graph.edge_count(),
        "Generated synthetic organization"
    );
    finish(
        roster,
        graph,
        params.clone(),
        SYNTHETIC_ORGANIZATION_NAME.to_string(),
        Vec::new(),
        None,
    )
}

/// Derive the organization from a dataset, falling back to synthetic
pub fn from_dataset(dataset: &Dataset, params: &ParameterSet, rng: &mut RngManager) -> Bootstrap {
    match real_data::derive(dataset, params, rng) {
        Ok(org) => {
            let merged = params.merge_derived(&org.derived);
            tracing::info!(
                dataset = dataset.name(),
                rows = dataset.num_rows(),
                teams = org.roster.len(),
                edges = org.graph.edge_count(),
                "Derived organization from dataset"
            );
            finish(
                org.roster,
                org.graph,
                merged,
                dataset.name().to_string(),
                org.warnings,
                Some(org.derived),
            )
        }
        Err(reason) => fallback(params, rng, reason),
    }
}

/// Synthetic generation recording why real data could not be used
pub fn fallback(params: &ParameterSet, rng: &mut RngManager, reason: String) -> Bootstrap {
    let warning = format!("{}; falling back to synthetic generation", reason);
    tracing::warn!("{}", warning);
    let mut boot = synthetic(params, rng);
    boot.metadata.warnings.push(warning);
    boot
}

fn finish(
    roster: TeamRoster,
    graph: OrganizationGraph,
    parameters: ParameterSet,
    name: String,
    bootstrap_warnings: Vec<String>,
    derived: Option<DerivedParameters>,
) -> Bootstrap {
    let mut warnings = parameters.warnings().to_vec();
    warnings.extend(bootstrap_warnings);

    let metadata = OrgMetadata {
        simulation_id: Uuid::new_v4(),
        name,
        total_employees: roster.total_employees(),
        num_teams: roster.len(),
        hierarchy_levels: parameters.hierarchy_levels(),
        simulation_start: chrono::Utc::now().to_rfc3339(),
        dataset_id: parameters.data_source_reference().map(str::to_string),
        warnings,
        derived,
    };
    let initial_record = metrics::initial_record(&roster);

    Bootstrap {
        roster,
        graph,
        parameters,
        metadata,
        initial_record,
    }
}

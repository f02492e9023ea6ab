//! Synthetic organization generation
//!
//! Teams are sampled from normal distributions centered on the parameter
//! values (or fixed defaults) and clamped into their valid ranges. The draw
//! order per team is fixed, so a seed fully determines the organization.

use crate::config::ParameterSet;
use crate::models::graph::OrganizationGraph;
use crate::models::roster::TeamRoster;
use crate::models::team::{Team, TeamAttributes, TeamId};
use crate::rng::RngManager;

/// Minimum number of generated teams
pub const MIN_SYNTHETIC_TEAMS: usize = 5;

/// Teams generated for a given hierarchy depth: `max(5, levels * 3)`
pub fn team_count(hierarchy_levels: u32) -> usize {
    MIN_SYNTHETIC_TEAMS.max(hierarchy_levels as usize * 3)
}

/// Sample one team
fn sample_team(index: usize, params: &ParameterSet, rng: &mut RngManager) -> Team {
    let id = index as i64 + 1;

    let size = rng.normal(params.team_size() as f64, 2.0).trunc().max(3.0) as u32;
    let avg_tenure_years = rng.normal(3.0, 1.5).max(0.5);
    let hierarchy_levels = rng.range(1, params.hierarchy_levels() as i64 + 1) as u32;
    let communication_density = rng
        .normal(params.communication_density(), 0.1)
        .clamp(0.2, 1.0);
    let diversity_index = rng.normal(0.6, 0.15).clamp(0.0, 1.0);
    let avg_skill_level = rng.normal(7.0, 1.5).clamp(1.0, 10.0);
    let training_hours = rng.range(10, 40) as f64;
    let manager_span = rng.range(3, 10) as u32;
    let performance = rng.normal(75.0, 8.0).clamp(50.0, 100.0);
    let innovation = rng.normal(65.0, 12.0).clamp(40.0, 100.0);
    let satisfaction = rng.normal(70.0, 10.0).clamp(40.0, 100.0);

    Team::new(
        TeamId::Number(id),
        format!("Team_{}", id),
        TeamAttributes {
            size,
            avg_tenure_years,
            hierarchy_levels,
            communication_density,
            diversity_index,
            avg_skill_level,
            training_hours,
            manager_span,
            performance,
            innovation,
            satisfaction,
        },
    )
}

/// Generate the roster and its probabilistic communication graph
pub fn generate(params: &ParameterSet, rng: &mut RngManager) -> (TeamRoster, OrganizationGraph) {
    let mut roster = TeamRoster::new();
    for index in 0..team_count(params.hierarchy_levels()) {
        // Sequential numeric ids cannot collide
        let _ = roster.insert(sample_team(index, params, rng));
    }
    let graph = OrganizationGraph::probabilistic(&roster, rng);
    (roster, graph)
}

//! Organization derived from a processed dataset
//!
//! Rows are grouped by the team column (`team_id`, else `team`). Each group
//! becomes one team whose attributes are column means where the dataset has
//! them and fixed fallbacks where it does not:
//!
//! | Attribute | Source | Fallback |
//! |---|---|---|
//! | size | row count | |
//! | avg_tenure_years | mean(`tenure_months`) / 12 | 1 |
//! | hierarchy_levels | distinct `level` values | 1 |
//! | avg_skill_level | mean(`skill_score`) | 1 |
//! | performance, innovation, satisfaction | mean(`*_score`) | 70 |
//! | diversity_index | Simpson index over `role` | 0.6 |
//! | communication_density | normalized network proxy | parameter density |
//! | manager_span | rows / distinct `manager_id` | 5 |
//! | training_hours | | 20 |
//!
//! Network proxy columns are numeric columns whose name contains
//! `centrality`, `degree` or `betweenness`.

use crate::bootstrap::dataset::Dataset;
use crate::config::ParameterSet;
use crate::models::graph::OrganizationGraph;
use crate::models::organization::DerivedParameters;
use crate::models::roster::TeamRoster;
use crate::models::team::{Team, TeamAttributes, TeamId};
use crate::rng::RngManager;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const DEFAULT_SCORE: f64 = 70.0;
const DEFAULT_TENURE_YEARS: f64 = 1.0;
const DEFAULT_SKILL: f64 = 1.0;
const DEFAULT_DIVERSITY: f64 = 0.6;
const DEFAULT_TRAINING_HOURS: f64 = 20.0;
const DEFAULT_MANAGER_SPAN: u32 = 5;

const NETWORK_MARKERS: [&str; 3] = ["centrality", "degree", "betweenness"];

/// Columns mapped onto team fields (never carried as extra features)
const MAPPED_COLUMNS: [&str; 11] = [
    "team_id",
    "team",
    "employee_id",
    "manager_id",
    "tenure_months",
    "level",
    "skill_score",
    "performance_score",
    "innovation_score",
    "satisfaction_score",
    "role",
];

/// Teams, graph and back-derived parameters of a dataset
#[derive(Debug, Clone)]
pub struct DerivedOrganization {
    pub roster: TeamRoster,
    pub graph: OrganizationGraph,
    pub derived: DerivedParameters,
    pub warnings: Vec<String>,
}

/// Name of the team-identifying column, if any
pub fn team_column(dataset: &Dataset) -> Option<&'static str> {
    ["team_id", "team"]
        .into_iter()
        .find(|c| dataset.has_column(c))
}

/// Derive the organization
///
/// Fails with the reason when the dataset yields no teams (no team column,
/// or a team column without values); callers fall back to synthetic
/// generation.
pub fn derive(
    dataset: &Dataset,
    params: &ParameterSet,
    rng: &mut RngManager,
) -> Result<DerivedOrganization, String> {
    let team_col = team_column(dataset)
        .ok_or_else(|| format!("dataset {} has no team_id or team column", dataset.name()))?;
    let mut warnings = Vec::new();

    // Group rows by team, ordered by team id
    let mut groups: BTreeMap<TeamId, Vec<usize>> = BTreeMap::new();
    let mut unassigned = 0usize;
    for row in 0..dataset.num_rows() {
        match dataset.text(row, team_col) {
            Some(raw) => groups.entry(TeamId::parse(raw)).or_default().push(row),
            None => unassigned += 1,
        }
    }
    if unassigned > 0 {
        warnings.push(format!(
            "{} rows without a {} value were ignored",
            unassigned, team_col
        ));
    }
    if groups.is_empty() {
        return Err(format!("dataset {} has no values in column {}", dataset.name(), team_col));
    }

    let proxy_columns: Vec<&str> = dataset
        .numeric_columns()
        .into_iter()
        .filter(|c| {
            let lower = c.to_ascii_lowercase();
            NETWORK_MARKERS.iter().any(|m| lower.contains(m))
        })
        .collect();
    let extra_columns: Vec<&str> = dataset
        .numeric_columns()
        .into_iter()
        .filter(|c| !MAPPED_COLUMNS.contains(c))
        .collect();

    // Raw network proxy per team, normalized by the largest
    let proxies: Vec<Option<f64>> = groups
        .values()
        .map(|rows| network_proxy(dataset, rows, &proxy_columns))
        .collect();
    let max_proxy = proxies
        .iter()
        .flatten()
        .copied()
        .fold(0.0_f64, f64::max);

    let mut roster = TeamRoster::new();
    for ((team_id, rows), proxy) in groups.iter().zip(&proxies) {
        let communication_density = match proxy {
            Some(p) if max_proxy > 0.0 => p / max_proxy,
            _ => params.communication_density(),
        };

        let attrs = TeamAttributes {
            size: rows.len() as u32,
            avg_tenure_years: column_mean(dataset, rows, "tenure_months")
                .map(|m| m / 12.0)
                .unwrap_or(DEFAULT_TENURE_YEARS),
            hierarchy_levels: distinct(dataset, rows, "level").max(1) as u32,
            communication_density,
            diversity_index: simpson_index(dataset, rows, "role").unwrap_or(DEFAULT_DIVERSITY),
            avg_skill_level: column_mean(dataset, rows, "skill_score").unwrap_or(DEFAULT_SKILL),
            training_hours: DEFAULT_TRAINING_HOURS,
            manager_span: manager_span(dataset, rows).unwrap_or(DEFAULT_MANAGER_SPAN),
            performance: column_mean(dataset, rows, "performance_score").unwrap_or(DEFAULT_SCORE),
            innovation: column_mean(dataset, rows, "innovation_score").unwrap_or(DEFAULT_SCORE),
            satisfaction: column_mean(dataset, rows, "satisfaction_score").unwrap_or(DEFAULT_SCORE),
        };

        let extras: BTreeMap<String, f64> = extra_columns
            .iter()
            .filter_map(|c| column_mean(dataset, rows, c).map(|m| (c.to_string(), m)))
            .collect();

        let team = Team::new(team_id.clone(), format!("Team_{}", team_id), attrs)
            .with_extra_features(extras);
        // Group keys are unique
        let _ = roster.insert(team);
    }

    let mut graph = OrganizationGraph::with_nodes(&roster);
    add_reporting_edges(dataset, team_col, &mut graph);
    if graph.edge_count() == 0 {
        graph.add_probabilistic_edges(&roster, rng);
    }

    let derived = derive_parameters(dataset, &roster, !proxy_columns.is_empty());

    Ok(DerivedOrganization {
        roster,
        graph,
        derived,
        warnings,
    })
}

fn column_mean(dataset: &Dataset, rows: &[usize], column: &str) -> Option<f64> {
    let values: Vec<f64> = rows.iter().filter_map(|&r| dataset.number(r, column)).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn distinct(dataset: &Dataset, rows: &[usize], column: &str) -> usize {
    rows.iter()
        .filter_map(|&r| dataset.text(r, column))
        .collect::<BTreeSet<_>>()
        .len()
}

/// Simpson diversity `1 - Σ p²` over the values of a categorical column
fn simpson_index(dataset: &Dataset, rows: &[usize], column: &str) -> Option<f64> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for &r in rows {
        if let Some(value) = dataset.text(r, column) {
            *counts.entry(value).or_default() += 1;
        }
    }
    let total: usize = counts.values().sum();
    if total == 0 {
        return None;
    }
    let concentration: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / total as f64;
            p * p
        })
        .sum();
    Some(1.0 - concentration)
}

/// Mean over rows of the mean of the proxy columns
fn network_proxy(dataset: &Dataset, rows: &[usize], columns: &[&str]) -> Option<f64> {
    if columns.is_empty() {
        return None;
    }
    let per_row: Vec<f64> = rows
        .iter()
        .filter_map(|&r| {
            let values: Vec<f64> = columns.iter().filter_map(|c| dataset.number(r, c)).collect();
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        })
        .collect();
    if per_row.is_empty() {
        None
    } else {
        Some(per_row.iter().sum::<f64>() / per_row.len() as f64)
    }
}

fn manager_span(dataset: &Dataset, rows: &[usize]) -> Option<u32> {
    let managers = distinct(dataset, rows, "manager_id");
    if managers == 0 {
        return None;
    }
    Some(((rows.len() as f64 / managers as f64).round() as u32).max(1))
}

/// One unit of weight per manager→employee link crossing team boundaries
fn add_reporting_edges(dataset: &Dataset, team_col: &str, graph: &mut OrganizationGraph) {
    if !dataset.has_column("manager_id") || !dataset.has_column("employee_id") {
        return;
    }

    let mut team_of: HashMap<&str, TeamId> = HashMap::new();
    for row in 0..dataset.num_rows() {
        if let (Some(employee), Some(team)) =
            (dataset.text(row, "employee_id"), dataset.text(row, team_col))
        {
            team_of.entry(employee).or_insert_with(|| TeamId::parse(team));
        }
    }

    for row in 0..dataset.num_rows() {
        let (Some(manager), Some(employee)) =
            (dataset.text(row, "manager_id"), dataset.text(row, "employee_id"))
        else {
            continue;
        };
        if manager == employee {
            continue;
        }
        let Some(employee_team) = dataset.text(row, team_col).map(TeamId::parse) else {
            continue;
        };
        if let Some(manager_team) = team_of.get(manager) {
            if *manager_team != employee_team {
                graph.strengthen_edge(&employee_team, manager_team, 1.0);
            }
        }
    }
}

fn derive_parameters(dataset: &Dataset, roster: &TeamRoster, has_network: bool) -> DerivedParameters {
    let all_rows: Vec<usize> = (0..dataset.num_rows()).collect();

    let hierarchy_levels = dataset
        .has_column("level")
        .then(|| distinct(dataset, &all_rows, "level") as u32)
        .filter(|&levels| levels > 0);

    // Average tenure T years implies roughly 1/T of staff leaving per year
    let turnover_rate = column_mean(dataset, &all_rows, "tenure_months")
        .map(|months| months / 12.0)
        .filter(|&years| years > 0.0)
        .map(|years| 1.0 / years);

    DerivedParameters {
        team_size: Some(roster.mean_of(|t| t.size() as f64)),
        hierarchy_levels,
        communication_density: has_network.then(|| roster.mean_of(|t| t.communication_density())),
        turnover_rate,
        performance_mean: column_mean(dataset, &all_rows, "performance_score"),
        innovation_mean: column_mean(dataset, &all_rows, "innovation_score"),
        satisfaction_mean: column_mean(dataset, &all_rows, "satisfaction_score"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEOPLE: &str = "employee_id,manager_id,team_id,tenure_months,level,role,performance_score,degree_centrality,projects\n\
        1,,1,60,3,lead,90,0.8,4\n\
        2,1,1,24,2,engineer,80,0.4,2\n\
        3,1,1,12,2,engineer,70,0.3,3\n\
        4,1,2,36,2,designer,60,0.2,1\n\
        5,4,2,6,1,designer,50,0.1,1\n";

    fn derive_people() -> DerivedOrganization {
        let ds = Dataset::from_csv_str(PEOPLE, "people").unwrap();
        derive(&ds, &ParameterSet::default(), &mut RngManager::new(1)).unwrap()
    }

    #[test]
    fn test_team_aggregates() {
        let org = derive_people();
        assert_eq!(org.roster.len(), 2);

        let t1 = org.roster.get(&TeamId::Number(1)).unwrap();
        assert_eq!(t1.size(), 3);
        assert!((t1.avg_tenure_years() - 32.0 / 12.0).abs() < 1e-9);
        assert_eq!(t1.hierarchy_levels(), 2);
        assert!((t1.performance() - 80.0).abs() < 1e-9);
        assert_eq!(t1.innovation(), 70.0);
        // lead, engineer, engineer
        assert!((t1.diversity_index() - (1.0 - (1.0 / 9.0 + 4.0 / 9.0))).abs() < 1e-9);
        assert_eq!(t1.communication_density(), 1.0);
        assert_eq!(t1.feature("projects"), Some(3.0));

        let t2 = org.roster.get(&TeamId::Number(2)).unwrap();
        assert_eq!(t2.performance(), 55.0);
        assert_eq!(t2.diversity_index(), 0.0);
    }

    #[test]
    fn test_reporting_edges() {
        let org = derive_people();
        // employee 4 (team 2) reports to manager 1 (team 1)
        assert_eq!(
            org.graph.edge_weight(&TeamId::Number(1), &TeamId::Number(2)),
            Some(1.0)
        );
        assert_eq!(org.graph.edge_count(), 1);
    }

    #[test]
    fn test_derived_parameters() {
        let org = derive_people();
        assert_eq!(org.derived.team_size, Some(2.5));
        assert_eq!(org.derived.hierarchy_levels, Some(3));
        assert_eq!(org.derived.performance_mean, Some(70.0));
        let rate = org.derived.turnover_rate.unwrap();
        assert!((rate - 12.0 / 27.6).abs() < 1e-9);
    }

    #[test]
    fn test_no_team_column() {
        let ds = Dataset::from_csv_str("employee_id,role\n1,engineer\n", "flat").unwrap();
        let reason = derive(&ds, &ParameterSet::default(), &mut RngManager::new(1)).unwrap_err();
        assert!(reason.contains("no team_id or team column"));
    }

    #[test]
    fn test_fallback_edges_without_reporting_lines() {
        let csv = "team,satisfaction_score\nalpha,80\nbeta,60\ngamma,70\n";
        let ds = Dataset::from_csv_str(csv, "teams").unwrap();
        let params = ParameterSet::from_value(&serde_json::json!({"communication_density": 1.0}));
        let org = derive(&ds, &params, &mut RngManager::new(3)).unwrap();
        assert_eq!(org.roster.len(), 3);
        // density 1.0 everywhere connects every pair
        assert_eq!(org.graph.edge_count(), 3);
        assert_eq!(org.roster.get(&TeamId::parse("alpha")).unwrap().satisfaction(), 80.0);
    }
}

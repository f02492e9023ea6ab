//! Initialization Tests
//!
//! Synthetic generation, real-data derivation and the fallback between them.

use org_simulator_core_rs::{ParameterSet, SimulationEngine, SimulationError, TeamId};
use serde_json::json;
use std::io::Write;
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

const PEOPLE_CSV: &str = "\
employee_id,manager_id,team_id,tenure_months,level,role,performance_score,satisfaction_score,projects
1,,10,60,3,lead,80,75,4
2,1,10,24,2,engineer,70,65,3
3,1,10,12,1,engineer,75,70,2
4,1,20,36,2,designer,60,80,1
5,4,20,12,1,designer,65,85,2
6,4,30,48,2,analyst,90,60,5
7,6,30,6,1,analyst,85,55,6
";

fn write_csv(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path.display().to_string()
}

fn real_data_engine(reference: &str, extra: serde_json::Value) -> SimulationEngine {
    let mut params = json!({
        "simulation_mode": "real_data",
        "data_source_reference": reference,
        "random_seed": 7,
    });
    if let (Some(base), Some(extra)) = (params.as_object_mut(), extra.as_object()) {
        base.extend(extra.clone());
    }
    SimulationEngine::new(ParameterSet::from_value(&params))
}

// ============================================================================
// Synthetic
// ============================================================================

#[test]
fn test_synthetic_team_count_follows_hierarchy() {
    for (levels, expected) in [(1, 5), (2, 6), (3, 9), (10, 30)] {
        let params = ParameterSet::from_value(&json!({"hierarchy_levels": levels}));
        let mut engine = SimulationEngine::new(params);
        let org = engine.initialize().unwrap();
        assert_eq!(org.num_teams, expected, "hierarchy_levels={}", levels);
        assert_eq!(engine.roster().len(), expected);
        assert_eq!(engine.graph().node_count(), expected);
    }
}

#[test]
fn test_synthetic_initial_record() {
    let mut engine = SimulationEngine::new(ParameterSet::default());
    let org = engine.initialize().unwrap();

    let summary = engine.summary();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].month, 0);
    assert_eq!(summary[0].turnover, 0.0);
    assert_eq!(org.total_employees, engine.roster().total_employees());
    assert!(org.dataset_id.is_none());
    assert!(org.warnings.is_empty());
}

#[test]
fn test_synthetic_team_ids_are_sequential() {
    let mut engine = SimulationEngine::new(ParameterSet::default());
    engine.initialize().unwrap();
    let ids = engine.roster().ids();
    let expected: Vec<TeamId> = (1..=ids.len() as i64).map(TeamId::Number).collect();
    assert_eq!(ids, expected);
    assert_eq!(engine.roster().teams()[0].name(), "Team_1");
}

// ============================================================================
// Real data
// ============================================================================

#[test]
fn test_real_data_groups_rows_by_team() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "people.csv", PEOPLE_CSV);
    let mut engine = real_data_engine(&path, json!({}));
    let org = engine.initialize().unwrap();

    assert_eq!(org.num_teams, 3);
    assert_eq!(org.total_employees, 7);
    assert_eq!(org.name, "people");
    assert_eq!(org.dataset_id.as_deref(), Some(path.as_str()));
    assert!(org.derived.is_some());

    let ids = engine.roster().ids();
    assert_eq!(ids, vec![TeamId::Number(10), TeamId::Number(20), TeamId::Number(30)]);

    let team = engine.roster().get(&TeamId::Number(10)).unwrap();
    assert_eq!(team.size(), 3);
    assert_eq!(team.performance(), 75.0);
    assert_eq!(team.satisfaction(), 70.0);
    assert!((team.avg_tenure_years() - 32.0 / 12.0).abs() < 1e-9);
    assert_eq!(team.feature("projects"), Some(3.0));
}

#[test]
fn test_real_data_keeps_padded_ids_distinct() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "padded.csv",
        "employee_id,team_id,performance_score\n1,007,80\n2,7,60\n3,7.0,70\n4,7,50\n",
    );
    let mut engine = real_data_engine(&path, json!({}));
    let org = engine.initialize().unwrap();

    assert_eq!(org.num_teams, 3);
    let roster = engine.roster();
    assert_eq!(roster.get(&TeamId::Key("007".into())).unwrap().size(), 1);
    assert_eq!(roster.get(&TeamId::Key("7.0".into())).unwrap().size(), 1);
    let seven = roster.get(&TeamId::Number(7)).unwrap();
    assert_eq!(seven.size(), 2);
    assert_eq!(seven.performance(), 55.0);
}

#[test]
fn test_real_data_reporting_lines_become_edges() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "people.csv", PEOPLE_CSV);
    let mut engine = real_data_engine(&path, json!({}));
    engine.initialize().unwrap();

    let graph = engine.graph();
    let (a, b, c) = (TeamId::Number(10), TeamId::Number(20), TeamId::Number(30));
    assert!(graph.edge_weight(&a, &b).is_some(), "Manager 1 in team 10 manages employee 4 in team 20");
    assert!(graph.edge_weight(&b, &c).is_some(), "Manager 4 in team 20 manages employee 6 in team 30");
}

#[test]
fn test_real_data_supplied_parameters_win() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "people.csv", PEOPLE_CSV);
    let mut engine = real_data_engine(&path, json!({"hierarchy_levels": 7}));
    engine.initialize().unwrap();

    assert_eq!(engine.parameters().hierarchy_levels(), 7);
    assert_eq!(engine.parameters().team_size(), 3, "Derived mean team size 7/3 rounds to 2, clamped to 3");
}

#[test]
fn test_missing_dataset_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    let mut engine = real_data_engine(&missing.display().to_string(), json!({}));

    match engine.initialize() {
        Err(SimulationError::DatasetNotFound { path }) => assert_eq!(path, missing),
        other => panic!("Expected DatasetNotFound, got {:?}", other),
    }
    assert!(!engine.is_initialized());
}

#[test]
fn test_dataset_without_team_column_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "flat.csv", "employee_id,role\n1,engineer\n2,designer\n");
    let mut engine = real_data_engine(&path, json!({"hierarchy_levels": 1}));
    let org = engine.initialize().unwrap();

    assert_eq!(org.num_teams, 5);
    assert_eq!(org.name, "Simulated Organization");
    assert!(
        org.warnings.iter().any(|w| w.contains("falling back to synthetic generation")),
        "Fallback must be reported: {:?}",
        org.warnings
    );
}

#[test]
fn test_real_data_without_reference_falls_back() {
    let params = ParameterSet::from_value(&json!({"simulation_mode": "real_data"}));
    let mut engine = SimulationEngine::new(params);
    let org = engine.initialize().unwrap();
    assert_eq!(org.num_teams, 9);
    assert_eq!(org.warnings.len(), 1);
}

#[test]
fn test_parameter_warnings_reach_metadata() {
    let params = ParameterSet::from_value(&json!({"team_size": 1000}));
    let mut engine = SimulationEngine::new(params);
    let org = engine.initialize().unwrap();
    assert_eq!(org.warnings.len(), 1);
    assert!(org.warnings[0].starts_with("team_size=1000"));
}

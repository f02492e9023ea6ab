//! Monthly Step Tests
//!
//! The step loop: one record per month, natural dynamics, turnover and the
//! end-to-end effect of an organization-wide leadership intervention.

use org_simulator_core_rs::orchestrator::metrics::monthly_turnover;
use org_simulator_core_rs::{
    Intervention, InterventionError, InterventionKind, ParameterSet, SimulationEngine, SimulationError,
};
use serde_json::json;

fn initialized(params: serde_json::Value) -> SimulationEngine {
    let mut engine = SimulationEngine::new(ParameterSet::from_value(&params));
    engine.initialize().unwrap();
    engine
}

#[test]
fn test_step_before_initialize_fails() {
    let mut engine = SimulationEngine::new(ParameterSet::default());
    let err = engine.step(1, Vec::new()).unwrap_err();
    assert!(matches!(err, SimulationError::NotInitialized));
    assert!(engine.summary().is_empty());
}

#[test]
fn test_one_record_per_month() {
    let mut engine = initialized(json!({}));
    engine.step(3, Vec::new()).unwrap();
    engine.step(2, Vec::new()).unwrap();

    let months: Vec<usize> = engine.summary().iter().map(|r| r.month).collect();
    assert_eq!(months, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(engine.current_step(), 5);
}

#[test]
fn test_zero_steps_only_schedules() {
    let mut engine = initialized(json!({}));
    let before = engine.summary().to_vec();
    let rng_before = engine.rng_state();

    engine
        .step(0, vec![Intervention::organization_wide(InterventionKind::Training, 1, 50)])
        .unwrap();

    assert_eq!(engine.summary(), before.as_slice());
    assert_eq!(engine.rng_state(), rng_before);
    assert_eq!(engine.ledger().len(), 1);
}

#[test]
fn test_invalid_batch_changes_nothing() {
    let mut engine = initialized(json!({}));
    let roster_before = engine.roster().clone();

    let batch = vec![
        Intervention::organization_wide(InterventionKind::Training, 1, 50),
        Intervention::organization_wide(InterventionKind::Leadership, 0, 50),
    ];
    let err = engine.step(2, batch).unwrap_err();

    assert!(matches!(
        err,
        SimulationError::InvalidIntervention(InterventionError::InvalidMonth(0))
    ));
    assert!(engine.ledger().is_empty());
    assert_eq!(engine.current_step(), 0);
    assert_eq!(engine.roster(), &roster_before);
}

#[test]
fn test_intensity_out_of_range_is_rejected() {
    let mut engine = initialized(json!({}));
    let err = engine
        .step(1, vec![Intervention::organization_wide(InterventionKind::Communication, 1, 101)])
        .unwrap_err();
    assert!(matches!(
        err,
        SimulationError::InvalidIntervention(InterventionError::InvalidIntensity(101))
    ));
}

#[test]
fn test_tenure_grows_one_month_per_step() {
    let mut engine = initialized(json!({}));
    let before: Vec<f64> = engine.roster().iter().map(|t| t.avg_tenure_years()).collect();
    engine.step(6, Vec::new()).unwrap();
    for (team, start) in engine.roster().iter().zip(before) {
        assert!(
            (team.avg_tenure_years() - (start + 0.5)).abs() < 1e-9,
            "Team {} tenure should grow by half a year",
            team.team_id()
        );
    }
}

#[test]
fn test_turnover_matches_mean_satisfaction() {
    let mut engine = initialized(json!({"turnover_rate": 0.12}));
    engine.step(4, Vec::new()).unwrap();

    for record in &engine.summary()[1..] {
        let expected = monthly_turnover(0.12, record.satisfaction);
        assert!((record.turnover - expected).abs() < 1e-12, "Month {}", record.month);
    }
}

#[test]
fn test_turnover_range_for_default_rate() {
    let low = monthly_turnover(0.05, 100.0);
    let high = monthly_turnover(0.05, 0.0);
    assert!((low - 0.00208).abs() < 1e-5);
    assert!((high - 0.00625).abs() < 1e-12);
}

#[test]
fn test_interventions_counted_in_their_month() {
    let mut engine = initialized(json!({}));
    let plan = vec![
        Intervention::organization_wide(InterventionKind::Communication, 2, 40),
        Intervention::organization_wide(InterventionKind::Training, 2, 40),
        Intervention::organization_wide(InterventionKind::Leadership, 3, 40),
    ];
    engine.step(4, plan).unwrap();

    let counts: Vec<usize> = engine.summary().iter().map(|r| r.interventions_applied).collect();
    assert_eq!(counts, vec![0, 0, 2, 1, 0]);
}

#[test]
fn test_past_months_never_fire() {
    let mut engine = initialized(json!({}));
    engine.step(3, Vec::new()).unwrap();
    engine
        .step(2, vec![Intervention::organization_wide(InterventionKind::Leadership, 2, 100)])
        .unwrap();
    assert!(engine.summary().iter().all(|r| r.interventions_applied == 0));
}

#[test]
fn test_leadership_lifts_satisfaction_and_performance() {
    let mut engine = initialized(json!({"random_seed": 42}));
    engine
        .step(1, vec![Intervention::organization_wide(InterventionKind::Leadership, 1, 100)])
        .unwrap();

    let summary = engine.summary();
    assert!(
        summary[1].satisfaction > summary[0].satisfaction,
        "Satisfaction {} -> {}",
        summary[0].satisfaction,
        summary[1].satisfaction
    );
    assert!(
        summary[1].performance > summary[0].performance,
        "Performance {} -> {}",
        summary[0].performance,
        summary[1].performance
    );
    assert_eq!(summary[1].interventions_applied, 1);
}

#[test]
fn test_metadata_tracks_progress() {
    let mut engine = initialized(json!({"simulation_duration": 6}));
    engine.step(4, Vec::new()).unwrap();

    let meta = engine.metadata();
    assert_eq!(meta.current_step, 4);
    assert_eq!(meta.remaining_planned_months, 2);
    assert_eq!(meta.num_teams, engine.roster().len());
    assert_eq!(meta.graph.nodes, engine.roster().len());
    assert!(meta.model_info.model_type.is_none());

    engine.step(4, Vec::new()).unwrap();
    assert_eq!(engine.metadata().remaining_planned_months, 0, "Duration is advisory only");
    assert_eq!(engine.current_step(), 8);
}

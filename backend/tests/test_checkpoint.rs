//! Checkpoint Tests - Save/Load Simulation State
//!
//! Critical invariants tested:
//! - Determinism: a restored simulation continues exactly like the original
//! - Integrity: tampered, foreign-version or inconsistent checkpoints are rejected
//! - Model handling: only the model reference is stored and re-resolved

use org_simulator_core_rs::orchestrator::checkpoint::{self, CHECKPOINT_FORMAT_VERSION};
use org_simulator_core_rs::{
    Intervention, InterventionKind, ModelDirectory, ParameterSet, SimulationEngine, SimulationError, TeamId,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

fn create_engine(seed: u64) -> SimulationEngine {
    let params = ParameterSet::from_value(&json!({"random_seed": seed, "hierarchy_levels": 2}));
    let mut engine = SimulationEngine::new(params);
    engine.initialize().unwrap();
    engine
}

fn checkpoint_path(dir: &TempDir) -> PathBuf {
    dir.path().join("sim_1.ckpt")
}

fn read_envelope(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn write_envelope(path: &Path, envelope: &Value) {
    std::fs::write(path, serde_json::to_string(envelope).unwrap()).unwrap();
}

fn later_plan() -> Vec<Intervention> {
    vec![
        Intervention::organization_wide(InterventionKind::Reorganization, 5, 70),
        Intervention::organization_wide(InterventionKind::Communication, 6, 30).targeting(vec![TeamId::Number(1)]),
    ]
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_save_and_load_restore_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = checkpoint_path(&dir);

    let mut engine = create_engine(42);
    engine.step(3, later_plan()).unwrap();
    engine.save(&path).unwrap();

    let restored = SimulationEngine::load(&path, None).unwrap();
    assert_eq!(restored.current_step(), 3);
    assert_eq!(restored.summary(), engine.summary());
    assert_eq!(restored.roster(), engine.roster());
    assert_eq!(restored.graph(), engine.graph());
    assert_eq!(restored.ledger(), engine.ledger());
    assert_eq!(restored.rng_state(), engine.rng_state());
    assert_eq!(restored.parameters(), engine.parameters());
    assert_eq!(restored.org_data(), engine.org_data());
}

#[test]
fn test_restored_engine_continues_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = checkpoint_path(&dir);

    let mut original = create_engine(2024);
    original.step(3, later_plan()).unwrap();
    original.save(&path).unwrap();

    let mut restored = SimulationEngine::load(&path, None).unwrap();

    let extra = vec![Intervention::organization_wide(InterventionKind::Leadership, 7, 90)];
    original.step(5, extra.clone()).unwrap();
    restored.step(5, extra).unwrap();

    assert_eq!(original.summary(), restored.summary());
    assert_eq!(original.roster(), restored.roster());
}

#[test]
fn test_summary_companion_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = checkpoint_path(&dir);

    let mut engine = create_engine(1);
    engine.step(2, Vec::new()).unwrap();
    engine.save(&path).unwrap();

    let summary_file = dir.path().join("sim_1_summary.json");
    assert_eq!(checkpoint::summary_path(&path), summary_file);

    let summary: Value = serde_json::from_str(&std::fs::read_to_string(&summary_file).unwrap()).unwrap();
    assert_eq!(summary["current_step"], json!(2));
    assert_eq!(summary["results"].as_array().map(Vec::len), Some(3));
    assert!(summary["saved_at"].is_string());
}

#[test]
fn test_save_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("sim.ckpt");
    create_engine(3).save(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_save_overwrites_previous_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = checkpoint_path(&dir);

    let mut engine = create_engine(5);
    engine.save(&path).unwrap();
    engine.step(4, Vec::new()).unwrap();
    engine.save(&path).unwrap();

    assert_eq!(SimulationEngine::load(&path, None).unwrap().current_step(), 4);
}

#[test]
fn test_uninitialized_engine_cannot_save() {
    let dir = tempfile::tempdir().unwrap();
    let engine = SimulationEngine::new(ParameterSet::default());
    assert!(matches!(engine.save(&checkpoint_path(&dir)), Err(SimulationError::NotInitialized)));
}

// ============================================================================
// Integrity
// ============================================================================

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SimulationEngine::load(&dir.path().join("absent.ckpt"), None).unwrap_err();
    assert!(matches!(err, SimulationError::CheckpointIo { .. }));
}

#[test]
fn test_tampered_payload_fails_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let path = checkpoint_path(&dir);
    create_engine(7).save(&path).unwrap();

    let mut envelope = read_envelope(&path);
    let payload = envelope["payload"].as_str().unwrap().replacen("\"current_step\":0", "\"current_step\":1", 1);
    envelope["payload"] = Value::String(payload);
    write_envelope(&path, &envelope);

    match SimulationEngine::load(&path, None) {
        Err(SimulationError::CheckpointCorrupt { detail, .. }) => assert!(detail.contains("checksum")),
        other => panic!("Expected CheckpointCorrupt, got {:?}", other),
    }
}

#[test]
fn test_unknown_format_version_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = checkpoint_path(&dir);
    create_engine(7).save(&path).unwrap();

    let mut envelope = read_envelope(&path);
    envelope["format_version"] = json!(CHECKPOINT_FORMAT_VERSION + 1);
    write_envelope(&path, &envelope);

    let err = SimulationEngine::load(&path, None).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::UnsupportedCheckpointVersion { found, supported, .. }
            if found == CHECKPOINT_FORMAT_VERSION + 1 && supported == CHECKPOINT_FORMAT_VERSION
    ));
}

#[test]
fn test_garbage_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = checkpoint_path(&dir);
    std::fs::write(&path, b"not a checkpoint").unwrap();
    assert!(matches!(
        SimulationEngine::load(&path, None),
        Err(SimulationError::CheckpointCorrupt { .. })
    ));
}

#[test]
fn test_parameter_hash_mismatch_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = checkpoint_path(&dir);

    let mut snapshot = create_engine(9).to_snapshot().unwrap();
    snapshot.config_hash = "0".repeat(64);
    std::fs::write(&path, checkpoint::encode(&snapshot).unwrap()).unwrap();

    let err = SimulationEngine::load(&path, None).unwrap_err();
    assert!(matches!(err, SimulationError::InvalidCheckpoint { .. }));
    assert!(matches!(err.root(), SimulationError::ConfigMismatch { .. }));
}

#[test]
fn test_inconsistent_results_rejected() {
    let mut engine = create_engine(11);
    engine.step(3, Vec::new()).unwrap();
    let mut snapshot = engine.to_snapshot().unwrap();
    snapshot.current_step = 5;

    assert!(matches!(
        SimulationEngine::from_snapshot(snapshot, None),
        Err(SimulationError::StateValidationError(_))
    ));
}

#[test]
fn test_duplicate_team_rejected() {
    let mut snapshot = create_engine(12).to_snapshot().unwrap();
    let first = snapshot.teams[0].clone();
    snapshot.teams.push(first);

    assert!(matches!(
        SimulationEngine::from_snapshot(snapshot, None),
        Err(SimulationError::StateValidationError(_))
    ));
}

#[test]
fn test_graph_node_without_team_rejected() {
    let mut snapshot = create_engine(13).to_snapshot().unwrap();
    snapshot.teams.pop();

    // The removed team is still a graph node
    assert!(matches!(
        SimulationEngine::from_snapshot(snapshot, None),
        Err(SimulationError::StateValidationError(_))
    ));
}

#[test]
fn test_load_errors_name_the_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("only_copy.ckpt");
    let engine = create_engine(14);
    let mut failures = Vec::new();

    // Foreign format version
    engine.save(&path).unwrap();
    let mut envelope = read_envelope(&path);
    envelope["format_version"] = json!(CHECKPOINT_FORMAT_VERSION + 1);
    write_envelope(&path, &envelope);
    failures.push(SimulationEngine::load(&path, None).unwrap_err());

    // Parameter hash mismatch
    let mut snapshot = engine.to_snapshot().unwrap();
    snapshot.config_hash = "f".repeat(64);
    std::fs::write(&path, checkpoint::encode(&snapshot).unwrap()).unwrap();
    failures.push(SimulationEngine::load(&path, None).unwrap_err());

    // Structurally inconsistent state
    let mut snapshot = engine.to_snapshot().unwrap();
    snapshot.current_step = 4;
    std::fs::write(&path, checkpoint::encode(&snapshot).unwrap()).unwrap();
    failures.push(SimulationEngine::load(&path, None).unwrap_err());

    // Tampered payload
    engine.save(&path).unwrap();
    let mut envelope = read_envelope(&path);
    envelope["checksum"] = json!("0".repeat(64));
    write_envelope(&path, &envelope);
    failures.push(SimulationEngine::load(&path, None).unwrap_err());

    assert!(matches!(failures[0], SimulationError::UnsupportedCheckpointVersion { .. }));
    assert!(matches!(failures[1].root(), SimulationError::ConfigMismatch { .. }));
    assert!(matches!(failures[2].root(), SimulationError::StateValidationError(_)));
    assert!(matches!(failures[3], SimulationError::CheckpointCorrupt { .. }));
    for err in &failures {
        assert!(err.to_string().contains("only_copy.ckpt"), "Missing path in: {}", err);
    }
}

#[test]
fn test_snapshot_errors_without_file_carry_no_path() {
    let mut snapshot = create_engine(15).to_snapshot().unwrap();
    snapshot.config_hash = "0".repeat(64);
    let err = SimulationEngine::from_snapshot(snapshot, None).unwrap_err();
    assert!(matches!(err, SimulationError::ConfigMismatch { .. }));
    assert!(matches!(
        err.at_checkpoint(Path::new("a.ckpt")),
        SimulationError::InvalidCheckpoint { .. }
    ));
}

// ============================================================================
// Model reference
// ============================================================================

#[test]
fn test_model_reference_reresolved_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let models_dir = dir.path().join("models");
    std::fs::create_dir_all(&models_dir).unwrap();
    std::fs::write(
        models_dir.join("m1_linear.json"),
        r#"{"feature_names": ["team_size"], "intercept": 60.0, "coefficients": [1.0]}"#,
    )
    .unwrap();
    let models = ModelDirectory::new(&models_dir);

    let params = ParameterSet::from_value(&json!({"model_reference": "m1"}));
    let mut engine = SimulationEngine::new(params);
    engine.initialize().unwrap();
    assert!(engine.resolve_predictor(&models));
    engine.step(2, Vec::new()).unwrap();

    let path = checkpoint_path(&dir);
    engine.save(&path).unwrap();

    let snapshot = checkpoint::load_from_path(&path).unwrap();
    assert_eq!(snapshot.model_reference.as_deref(), Some("m1"));

    let without = SimulationEngine::load(&path, None).unwrap();
    assert!(!without.has_predictor());

    let mut with = SimulationEngine::load(&path, Some(&models)).unwrap();
    assert!(with.has_predictor());

    engine.step(2, Vec::new()).unwrap();
    with.step(2, Vec::new()).unwrap();
    assert_eq!(engine.summary(), with.summary());
}

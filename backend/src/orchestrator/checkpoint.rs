//! Checkpoint - Save/Load Simulation State
//!
//! A simulation is reconstructed from its checkpoint for every operation, so
//! the checkpoint must capture everything a later `step` depends on.
//!
//! # File layout
//!
//! The checkpoint file is a JSON envelope:
//!
//! ```text
//! { "format_version": 1, "checksum": "<sha256 of payload>", "payload": "<EngineSnapshot JSON>" }
//! ```
//!
//! A companion `<stem>_summary.json` holds a pretty-printed, human-readable
//! view (parameters, current step, organization, results, interventions,
//! save time). It is for inspection only and is never read back.
//!
//! # Critical Invariants
//!
//! - **Determinism**: the RNG state is part of the snapshot, so a restored
//!   engine continues exactly where the saved one stopped
//! - **No model object**: only the model reference is stored
//! - **Atomic writes**: the file is written to a temp file in the same
//!   directory and renamed into place
//! - **Integrity**: checksum, parameter hash and structural checks must pass
//!   before a snapshot is accepted

use crate::config::ParameterSet;
use crate::models::graph::GraphSnapshot;
use crate::models::intervention::InterventionLedger;
use crate::models::organization::OrgMetadata;
use crate::models::results::ResultsSeries;
use crate::models::team::{Team, TeamId};
use crate::orchestrator::SimulationError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Current checkpoint format
pub const CHECKPOINT_FORMAT_VERSION: u32 = 1;

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub parameters: ParameterSet,

    /// SHA256 of the canonical parameter JSON (for validation)
    pub config_hash: String,

    /// Months completed
    pub current_step: usize,

    /// RNG state at time of snapshot (CRITICAL for determinism)
    pub rng_state: u64,

    pub org_data: OrgMetadata,

    /// Teams in roster order
    pub teams: Vec<Team>,

    pub results: ResultsSeries,

    pub interventions: InterventionLedger,

    pub graph: GraphSnapshot,

    /// Reference used to re-resolve the predictor on load
    pub model_reference: Option<String>,
}

/// On-disk wrapper around the serialized snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CheckpointEnvelope {
    format_version: u32,
    checksum: String,
    payload: String,
}

/// Human-readable companion file
#[derive(Debug, Clone, Serialize)]
pub struct CheckpointSummary<'a> {
    pub parameters: &'a ParameterSet,
    pub current_step: usize,
    pub org_data: &'a OrgMetadata,
    pub results: &'a ResultsSeries,
    pub interventions: &'a InterventionLedger,
    pub saved_at: String,
}

impl<'a> CheckpointSummary<'a> {
    pub fn of(snapshot: &'a EngineSnapshot) -> Self {
        Self {
            parameters: &snapshot.parameters,
            current_step: snapshot.current_step,
            org_data: &snapshot.org_data,
            results: &snapshot.results,
            interventions: &snapshot.interventions,
            saved_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of config
///
/// Uses canonical JSON serialization with sorted keys so the hash does not
/// depend on field or map iteration order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value)).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    Ok(sha256_hex(json.as_bytes()))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate snapshot integrity
///
/// Checks:
/// - Parameter hash matches the stored parameters
/// - Team ids are unique and every team is within bounds
/// - Results run month 0..=current_step without gaps
/// - Every graph node and edge endpoint is a roster team
/// - Every ledger entry is a valid intervention
pub fn validate_snapshot(snapshot: &EngineSnapshot) -> Result<(), SimulationError> {
    // 1. Parameters
    let actual = compute_config_hash(&snapshot.parameters)?;
    if actual != snapshot.config_hash {
        return Err(SimulationError::ConfigMismatch {
            expected: snapshot.config_hash.clone(),
            actual,
        });
    }

    // 2. Teams
    let mut ids: HashSet<&TeamId> = HashSet::new();
    for team in &snapshot.teams {
        if !ids.insert(team.team_id()) {
            return Err(SimulationError::StateValidationError(format!(
                "Duplicate team id: {}",
                team.team_id()
            )));
        }
        if let Some(field) = team.bounds_violation() {
            return Err(SimulationError::StateValidationError(format!(
                "Team {} has out-of-range {}",
                team.team_id(),
                field
            )));
        }
    }

    // 3. Results
    if !snapshot.results.is_contiguous() {
        return Err(SimulationError::StateValidationError(
            "Results months are not contiguous from month 0".to_string(),
        ));
    }
    if snapshot.results.len() != snapshot.current_step + 1 {
        return Err(SimulationError::StateValidationError(format!(
            "Expected {} results records for step {}, found {}",
            snapshot.current_step + 1,
            snapshot.current_step,
            snapshot.results.len()
        )));
    }

    // 4. Graph
    for node in &snapshot.graph.nodes {
        if !ids.contains(&node.team_id) {
            return Err(SimulationError::StateValidationError(format!(
                "Graph node {} is not a roster team",
                node.team_id
            )));
        }
    }
    for edge in &snapshot.graph.edges {
        if !ids.contains(&edge.source) || !ids.contains(&edge.target) {
            return Err(SimulationError::StateValidationError(format!(
                "Graph edge {}-{} references an unknown team",
                edge.source, edge.target
            )));
        }
    }

    // 5. Ledger
    for intervention in snapshot.interventions.entries() {
        intervention
            .validate()
            .map_err(|e| SimulationError::StateValidationError(format!("Ledger entry: {}", e)))?;
    }

    Ok(())
}

// ============================================================================
// Encoding
// ============================================================================

/// Serialize a snapshot into the checkpoint envelope
pub fn encode(snapshot: &EngineSnapshot) -> Result<String, SimulationError> {
    let payload = serde_json::to_string(snapshot).map_err(|e| {
        SimulationError::SerializationError(format!("Snapshot serialization failed: {}", e))
    })?;
    let envelope = CheckpointEnvelope {
        format_version: CHECKPOINT_FORMAT_VERSION,
        checksum: sha256_hex(payload.as_bytes()),
        payload,
    };
    serde_json::to_string(&envelope).map_err(|e| {
        SimulationError::SerializationError(format!("Checkpoint serialization failed: {}", e))
    })
}

/// Parse and validate a checkpoint envelope read from `path`
pub fn decode(contents: &str, path: &Path) -> Result<EngineSnapshot, SimulationError> {
    let corrupt = |detail: String| SimulationError::CheckpointCorrupt {
        path: path.to_path_buf(),
        detail,
    };

    let envelope: CheckpointEnvelope =
        serde_json::from_str(contents).map_err(|e| corrupt(format!("invalid envelope: {}", e)))?;

    if envelope.format_version != CHECKPOINT_FORMAT_VERSION {
        return Err(SimulationError::UnsupportedCheckpointVersion {
            path: path.to_path_buf(),
            found: envelope.format_version,
            supported: CHECKPOINT_FORMAT_VERSION,
        });
    }

    if sha256_hex(envelope.payload.as_bytes()) != envelope.checksum {
        return Err(corrupt("checksum mismatch".to_string()));
    }

    let snapshot: EngineSnapshot = serde_json::from_str(&envelope.payload)
        .map_err(|e| corrupt(format!("invalid snapshot: {}", e)))?;

    validate_snapshot(&snapshot).map_err(|e| e.at_checkpoint(path))?;
    Ok(snapshot)
}

// ============================================================================
// File I/O
// ============================================================================

/// Path of the human-readable companion file for a checkpoint
pub fn summary_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("checkpoint");
    path.with_file_name(format!("{}_summary.json", stem))
}

/// Write `contents` to `path` via a temp file in the same directory
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), SimulationError> {
    let io_err = |source: std::io::Error| SimulationError::CheckpointIo {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(io_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
    tmp.write_all(contents).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Write the checkpoint and its summary
///
/// A failure to write the summary is logged; the checkpoint itself is
/// already durable at that point.
pub fn save_to_path(snapshot: &EngineSnapshot, path: &Path) -> Result<(), SimulationError> {
    let encoded = encode(snapshot)?;
    write_atomic(path, encoded.as_bytes())?;

    let summary_file = summary_path(path);
    let summary = serde_json::to_string_pretty(&CheckpointSummary::of(snapshot))
        .map_err(|e| SimulationError::SerializationError(format!("Summary serialization failed: {}", e)))
        .and_then(|json| write_atomic(&summary_file, json.as_bytes()));
    if let Err(e) = summary {
        tracing::warn!(path = %summary_file.display(), error = %e, "Failed to write checkpoint summary");
    }
    Ok(())
}

/// Read and validate a checkpoint file
pub fn load_from_path(path: &Path) -> Result<EngineSnapshot, SimulationError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SimulationError::CheckpointIo {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&contents, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_config_hash_deterministic() {
        #[derive(Serialize)]
        struct TestConfig {
            value: i32,
            name: String,
        }

        let config1 = TestConfig {
            value: 42,
            name: "test".to_string(),
        };
        let config2 = TestConfig {
            value: 42,
            name: "test".to_string(),
        };

        let hash1 = compute_config_hash(&config1).unwrap();
        let hash2 = compute_config_hash(&config2).unwrap();

        assert_eq!(hash1, hash2, "Same config should produce same hash");
    }

    #[test]
    fn test_parameter_hash_changes_with_seed() {
        let a = ParameterSet::default();
        let b = ParameterSet::from_value(&serde_json::json!({"random_seed": 7}));
        assert_ne!(
            compute_config_hash(&a).unwrap(),
            compute_config_hash(&b).unwrap(),
            "Different parameters should produce different hashes"
        );
    }

    #[test]
    fn test_summary_path() {
        assert_eq!(
            summary_path(Path::new("/tmp/sim_3.ckpt")),
            PathBuf::from("/tmp/sim_3_summary.json")
        );
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.ckpt");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        // Only the target remains; temp files were renamed away
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let err = decode("not json", Path::new("x.ckpt")).unwrap_err();
        assert!(matches!(err, SimulationError::CheckpointCorrupt { .. }));
    }
}

//! Simulation Engine
//!
//! Owns the organization state and advances it one month at a time:
//! - Team roster (primary mutable state)
//! - Communication graph (structural view, rebuilt only on request)
//! - Intervention ledger
//! - Results series (one record per month, append-only)
//! - Optional predictor, shared read-only
//!
//! # Architecture
//!
//! ```text
//! For each month m:
//! 1. Advance the month counter
//! 2. Apply interventions scheduled for m (ledger order)
//! 3. Natural dynamics on every team
//! 4. Blend model predictions into performance (if a predictor is attached)
//! 5. Append the results record for m
//! ```
//!
//! All randomness flows through the engine's own [`RngManager`], so two
//! engines with the same seed and interventions produce identical
//! trajectories regardless of how their calls interleave.
//!
//! # Example
//!
//! ```rust
//! use org_simulator_core_rs::config::ParameterSet;
//! use org_simulator_core_rs::models::intervention::{Intervention, InterventionKind};
//! use org_simulator_core_rs::orchestrator::SimulationEngine;
//! use serde_json::json;
//!
//! let params = ParameterSet::from_value(&json!({"team_size": 8, "random_seed": 42}));
//! let mut engine = SimulationEngine::new(params);
//! engine.initialize().unwrap();
//!
//! let plan = vec![Intervention::organization_wide(InterventionKind::Leadership, 1, 100)];
//! engine.step(3, plan).unwrap();
//!
//! assert_eq!(engine.summary().len(), 4); // months 0..=3
//! ```

use crate::bootstrap::{self, Bootstrap, Dataset, DatasetError};
use crate::config::{ParameterSet, SimulationMode};
use crate::core::time::MonthClock;
use crate::models::graph::OrganizationGraph;
use crate::models::intervention::{Intervention, InterventionError, InterventionLedger};
use crate::models::organization::OrgMetadata;
use crate::models::results::{MonthlyResult, ResultsSeries};
use crate::models::roster::TeamRoster;
use crate::models::team::{
    Bounds, INNOVATION_BOUNDS, MIN_DYNAMIC_TEAM_SIZE, PERFORMANCE_BOUNDS, SATISFACTION_BOUNDS,
};
use crate::orchestrator::checkpoint::{self, EngineSnapshot};
use crate::orchestrator::metrics;
use crate::predictor::{FeatureFrame, Predictor, PredictorResolver};
use crate::rng::RngManager;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Dynamics Constants
// ============================================================================

/// Monthly noise on performance, innovation and satisfaction
const PERFORMANCE_NOISE_SD: f64 = 2.0;
const INNOVATION_NOISE_SD: f64 = 3.0;
const SATISFACTION_NOISE_SD: f64 = 2.0;

/// Drift of communication density in months without interventions
const DENSITY_NOISE_SD: f64 = 0.02;
const DENSITY_DRIFT_BOUNDS: Bounds = Bounds::new(0.1, 1.0);

/// Chance per team per month of a ±1 headcount change
const SIZE_CHANGE_PROBABILITY: f64 = 0.1;
const SIZE_CHANGES: [i64; 3] = [-1, 0, 1];

const MONTH_IN_YEARS: f64 = 1.0 / 12.0;

/// Share of the predictor's features the roster must provide before blending
const MIN_FEATURE_COVERAGE: f64 = 0.7;
/// Weight of the prediction in blended performance
const PREDICTION_WEIGHT: f64 = 0.7;

// ============================================================================
// Errors
// ============================================================================

/// Simulation error types
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Simulation not initialized; call initialize() first")]
    NotInitialized,

    #[error("Invalid intervention: {0}")]
    InvalidIntervention(#[from] InterventionError),

    #[error("Dataset file not found: {}", path.display())]
    DatasetNotFound { path: PathBuf },

    #[error("Failed to access checkpoint {}: {source}", path.display())]
    CheckpointIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt checkpoint {}: {detail}", path.display())]
    CheckpointCorrupt { path: PathBuf, detail: String },

    #[error("Checkpoint parameter hash mismatch: stored {expected}, computed {actual}")]
    ConfigMismatch { expected: String, actual: String },

    #[error(
        "Unsupported checkpoint format version {found} in {} (supported: {supported})",
        path.display()
    )]
    UnsupportedCheckpointVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    /// A readable checkpoint whose contents failed validation
    #[error("Invalid checkpoint {}: {source}", path.display())]
    InvalidCheckpoint {
        path: PathBuf,
        #[source]
        source: Box<SimulationError>,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("State validation failed: {0}")]
    StateValidationError(String),
}

impl SimulationError {
    /// Attach the checkpoint path to an error raised while restoring from it
    ///
    /// Errors that already name a checkpoint are returned unchanged.
    pub fn at_checkpoint(self, path: &Path) -> Self {
        match self {
            SimulationError::CheckpointIo { .. }
            | SimulationError::CheckpointCorrupt { .. }
            | SimulationError::UnsupportedCheckpointVersion { .. }
            | SimulationError::InvalidCheckpoint { .. } => self,
            other => SimulationError::InvalidCheckpoint {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying cause, looking through checkpoint path context
    pub fn root(&self) -> &SimulationError {
        match self {
            SimulationError::InvalidCheckpoint { source, .. } => source.root(),
            other => other,
        }
    }
}

// ============================================================================
// Metadata Types
// ============================================================================

/// Attached model description
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelInfo {
    pub model_reference: Option<String>,
    pub model_type: Option<String>,
    pub feature_names: Option<Vec<String>>,
}

/// Size of the communication graph
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
}

/// Organization, parameter and model information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationMetadata {
    pub org_data: Option<OrgMetadata>,
    pub current_step: usize,
    pub parameters: ParameterSet,
    pub num_teams: usize,
    pub model_info: ModelInfo,
    pub graph: GraphStats,
    /// Months left of the planned duration (advisory)
    pub remaining_planned_months: usize,
}

// ============================================================================
// Engine
// ============================================================================

/// Organizational simulation engine
pub struct SimulationEngine {
    parameters: ParameterSet,
    rng: RngManager,
    clock: MonthClock,
    roster: TeamRoster,
    graph: OrganizationGraph,
    ledger: InterventionLedger,
    results: ResultsSeries,
    /// `None` until initialized
    org_data: Option<OrgMetadata>,
    predictor: Option<Arc<dyn Predictor>>,
}

impl fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("current_step", &self.clock.current_month())
            .field("teams", &self.roster.len())
            .field("interventions", &self.ledger.len())
            .field("initialized", &self.is_initialized())
            .field("predictor", &self.predictor.as_ref().map(|p| p.model_type().to_string()))
            .finish()
    }
}

impl SimulationEngine {
    /// Create an uninitialized engine seeded from the parameters
    pub fn new(parameters: ParameterSet) -> Self {
        let rng = RngManager::new(parameters.random_seed());
        let clock = MonthClock::new(parameters.simulation_duration() as usize);
        Self {
            parameters,
            rng,
            clock,
            roster: TeamRoster::new(),
            graph: OrganizationGraph::new(),
            ledger: InterventionLedger::new(),
            results: ResultsSeries::new(),
            org_data: None,
            predictor: None,
        }
    }

    // ========================================================================
    // Initialization
    // ========================================================================

    /// Build the initial organization and emit the month-0 record
    ///
    /// In `real_data` mode the dataset at `data_source_reference` is read;
    /// a missing file is an error, any other problem falls back to synthetic
    /// generation with a warning. Re-initializing starts over from the seed
    /// and clears the ledger.
    pub fn initialize(&mut self) -> Result<OrgMetadata, SimulationError> {
        self.rng = RngManager::new(self.parameters.random_seed());

        let boot = match self.parameters.simulation_mode() {
            SimulationMode::Synthetic => bootstrap::synthetic(&self.parameters, &mut self.rng),
            SimulationMode::RealData => match self.parameters.data_source_reference() {
                Some(reference) => match Dataset::from_path(Path::new(reference)) {
                    Ok(dataset) => bootstrap::from_dataset(&dataset, &self.parameters, &mut self.rng),
                    Err(DatasetError::NotFound { path }) => {
                        return Err(SimulationError::DatasetNotFound { path });
                    }
                    Err(e) => bootstrap::fallback(&self.parameters, &mut self.rng, e.to_string()),
                },
                None => bootstrap::fallback(
                    &self.parameters,
                    &mut self.rng,
                    "real_data mode without a data_source_reference".to_string(),
                ),
            },
        };

        Ok(self.install(boot))
    }

    /// Initialize from an already loaded dataset
    pub fn initialize_with_dataset(&mut self, dataset: &Dataset) -> Result<OrgMetadata, SimulationError> {
        self.rng = RngManager::new(self.parameters.random_seed());
        let boot = bootstrap::from_dataset(dataset, &self.parameters, &mut self.rng);
        Ok(self.install(boot))
    }

    fn install(&mut self, boot: Bootstrap) -> OrgMetadata {
        let Bootstrap {
            roster,
            graph,
            parameters,
            metadata,
            initial_record,
        } = boot;

        self.parameters = parameters;
        self.clock = MonthClock::new(self.parameters.simulation_duration() as usize);
        self.roster = roster;
        self.graph = graph;
        self.ledger = InterventionLedger::new();
        self.results = ResultsSeries::new();
        self.results.push(initial_record);
        self.org_data = Some(metadata.clone());

        tracing::info!(
            simulation_id = %metadata.simulation_id,
            teams = metadata.num_teams,
            employees = metadata.total_employees,
            warnings = metadata.warnings.len(),
            "Initialized simulation"
        );
        metadata
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    /// Schedule `new_interventions` and advance `steps` months
    ///
    /// Interventions are validated as a batch before anything changes; an
    /// invalid one rejects the whole call. `steps == 0` only schedules.
    pub fn step(&mut self, steps: usize, new_interventions: Vec<Intervention>) -> Result<(), SimulationError> {
        if !self.is_initialized() {
            return Err(SimulationError::NotInitialized);
        }
        self.ledger.schedule(new_interventions)?;

        for _ in 0..steps {
            self.step_month();
        }
        Ok(())
    }

    fn step_month(&mut self) {
        let month = self.clock.advance_month();

        let mut applied = 0;
        for intervention in self.ledger.due_at(month) {
            intervention.apply(&mut self.roster, &mut self.rng);
            applied += 1;
        }

        self.apply_natural_dynamics(applied > 0);

        if let Some(predictor) = self.predictor.clone() {
            self.blend_predictions(month, predictor.as_ref());
        }

        let record = metrics::step_record(month, &self.roster, self.parameters.turnover_rate(), applied);
        tracing::debug!(
            month,
            interventions = applied,
            performance = record.performance,
            satisfaction = record.satisfaction,
            turnover = record.turnover,
            "Completed simulation month"
        );
        self.results.push(record);
    }

    /// Baseline drift of every team; draws are consumed team by team
    fn apply_natural_dynamics(&mut self, interventions_fired: bool) {
        let rng = &mut self.rng;
        for team in self.roster.iter_mut() {
            team.adjust_performance(rng.normal(0.0, PERFORMANCE_NOISE_SD), PERFORMANCE_BOUNDS);
            team.adjust_innovation(rng.normal(0.0, INNOVATION_NOISE_SD), INNOVATION_BOUNDS);
            team.adjust_satisfaction(rng.normal(0.0, SATISFACTION_NOISE_SD), SATISFACTION_BOUNDS);

            // Interventions own the density change in months they fire
            if !interventions_fired {
                team.adjust_communication_density(rng.normal(0.0, DENSITY_NOISE_SD), DENSITY_DRIFT_BOUNDS);
            }

            if rng.chance(SIZE_CHANGE_PROBABILITY) {
                let change = rng.choose(&SIZE_CHANGES);
                team.adjust_size(change as f64, MIN_DYNAMIC_TEAM_SIZE);
            }

            team.add_tenure(MONTH_IN_YEARS);
        }
    }

    /// Pull performance toward the model's predictions (best effort)
    fn blend_predictions(&mut self, month: usize, predictor: &dyn Predictor) {
        let features = predictor.feature_names();
        if features.is_empty() {
            return;
        }

        let (frame, available) = FeatureFrame::from_roster(&self.roster, features);
        if (available as f64) < MIN_FEATURE_COVERAGE * features.len() as f64 {
            tracing::warn!(
                month,
                available,
                required = features.len(),
                "Skipping model blending: too few features available"
            );
            return;
        }

        let evaluation = match predictor.evaluate(&frame) {
            Ok(evaluation) => evaluation,
            Err(e) => {
                tracing::warn!(month, error = %e, "Skipping model blending: prediction failed");
                return;
            }
        };

        let predictions = &evaluation.predictions;
        if predictions.len() != self.roster.len() || predictions.iter().any(|p| !p.is_finite()) {
            tracing::warn!(
                month,
                predictions = predictions.len(),
                teams = self.roster.len(),
                "Skipping model blending: incompatible predictions"
            );
            return;
        }

        let rng = &mut self.rng;
        for (team, predicted) in self.roster.iter_mut().zip(predictions) {
            let blended = PREDICTION_WEIGHT * predicted + (1.0 - PREDICTION_WEIGHT) * team.performance();
            team.set_performance(blended + rng.normal(0.0, PERFORMANCE_NOISE_SD));
        }
    }

    // ========================================================================
    // Predictor
    // ========================================================================

    pub fn attach_predictor(&mut self, predictor: Arc<dyn Predictor>) {
        self.predictor = Some(predictor);
    }

    pub fn has_predictor(&self) -> bool {
        self.predictor.is_some()
    }

    /// Resolve `model_reference` and attach the predictor
    ///
    /// Failure is logged and leaves the engine without a model. Returns
    /// whether a predictor is attached afterwards.
    pub fn resolve_predictor(&mut self, resolver: &dyn PredictorResolver) -> bool {
        let Some(reference) = self.parameters.model_reference().map(str::to_string) else {
            self.predictor = None;
            return false;
        };
        match resolver.resolve(&reference) {
            Ok(predictor) => {
                tracing::info!(
                    reference = %reference,
                    model_type = predictor.model_type(),
                    features = predictor.feature_names().len(),
                    "Attached predictor"
                );
                self.predictor = Some(predictor);
                true
            }
            Err(e) => {
                tracing::warn!(reference = %reference, error = %e, "Could not resolve predictor; continuing without a model");
                self.predictor = None;
                false
            }
        }
    }

    // ========================================================================
    // Graph
    // ========================================================================

    /// Regenerate probabilistic edges from the current roster
    ///
    /// Node snapshots are retaken from the current team values. Uses the
    /// engine RNG, so it changes every later draw.
    pub fn rebuild_graph(&mut self) -> Result<(), SimulationError> {
        if !self.is_initialized() {
            return Err(SimulationError::NotInitialized);
        }
        self.graph = OrganizationGraph::probabilistic(&self.roster, &mut self.rng);
        tracing::info!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "Rebuilt communication graph"
        );
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Results series, month 0 first
    pub fn summary(&self) -> &[MonthlyResult] {
        self.results.records()
    }

    pub fn metadata(&self) -> SimulationMetadata {
        let model_info = match &self.predictor {
            Some(p) => ModelInfo {
                model_reference: self.parameters.model_reference().map(str::to_string),
                model_type: Some(p.model_type().to_string()),
                feature_names: Some(p.feature_names().to_vec()),
            },
            None => ModelInfo::default(),
        };

        SimulationMetadata {
            org_data: self.org_data.clone(),
            current_step: self.clock.current_month(),
            parameters: self.parameters.clone(),
            num_teams: self.roster.len(),
            model_info,
            graph: GraphStats {
                nodes: self.graph.node_count(),
                edges: self.graph.edge_count(),
                density: self.graph.density(),
            },
            remaining_planned_months: self.clock.remaining_planned_months(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.org_data.is_some()
    }

    pub fn current_step(&self) -> usize {
        self.clock.current_month()
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn roster(&self) -> &TeamRoster {
        &self.roster
    }

    pub fn graph(&self) -> &OrganizationGraph {
        &self.graph
    }

    pub fn ledger(&self) -> &InterventionLedger {
        &self.ledger
    }

    pub fn results(&self) -> &ResultsSeries {
        &self.results
    }

    pub fn org_data(&self) -> Option<&OrgMetadata> {
        self.org_data.as_ref()
    }

    pub fn rng_state(&self) -> u64 {
        self.rng.get_state()
    }

    // ========================================================================
    // Checkpointing
    // ========================================================================

    /// Capture the full engine state (the predictor only by reference)
    pub fn to_snapshot(&self) -> Result<EngineSnapshot, SimulationError> {
        let org_data = self.org_data.clone().ok_or(SimulationError::NotInitialized)?;
        Ok(EngineSnapshot {
            config_hash: checkpoint::compute_config_hash(&self.parameters)?,
            parameters: self.parameters.clone(),
            current_step: self.clock.current_month(),
            rng_state: self.rng.get_state(),
            org_data,
            teams: self.roster.teams().to_vec(),
            results: self.results.clone(),
            interventions: self.ledger.clone(),
            graph: self.graph.to_snapshot(),
            model_reference: self.parameters.model_reference().map(str::to_string),
        })
    }

    /// Rebuild an engine from a snapshot
    ///
    /// With a resolver, the stored model reference is re-resolved; failure
    /// leaves the engine without a model.
    pub fn from_snapshot(
        snapshot: EngineSnapshot,
        resolver: Option<&dyn PredictorResolver>,
    ) -> Result<Self, SimulationError> {
        checkpoint::validate_snapshot(&snapshot)?;

        let roster = TeamRoster::from_teams(snapshot.teams)
            .map_err(|e| SimulationError::StateValidationError(e.to_string()))?;

        let mut engine = Self {
            clock: MonthClock::from_state(
                snapshot.current_step,
                snapshot.parameters.simulation_duration() as usize,
            ),
            rng: RngManager::from_state(snapshot.rng_state),
            parameters: snapshot.parameters,
            roster,
            graph: OrganizationGraph::from_snapshot(snapshot.graph),
            ledger: snapshot.interventions,
            results: snapshot.results,
            org_data: Some(snapshot.org_data),
            predictor: None,
        };

        if let Some(reference) = snapshot.model_reference {
            engine.parameters.set_model_reference(Some(reference));
            if let Some(resolver) = resolver {
                engine.resolve_predictor(resolver);
            }
        }
        Ok(engine)
    }

    /// Write the checkpoint (atomically) and its summary
    pub fn save(&self, path: &Path) -> Result<(), SimulationError> {
        let snapshot = self.to_snapshot()?;
        checkpoint::save_to_path(&snapshot, path)?;
        tracing::info!(path = %path.display(), step = snapshot.current_step, "Saved checkpoint");
        Ok(())
    }

    /// Load an engine from a checkpoint file
    pub fn load(path: &Path, resolver: Option<&dyn PredictorResolver>) -> Result<Self, SimulationError> {
        let snapshot = checkpoint::load_from_path(path)?;
        let engine = Self::from_snapshot(snapshot, resolver).map_err(|e| e.at_checkpoint(path))?;
        tracing::info!(
            path = %path.display(),
            step = engine.current_step(),
            model = engine.has_predictor(),
            "Loaded checkpoint"
        );
        Ok(engine)
    }
}

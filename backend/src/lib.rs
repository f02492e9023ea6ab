//! Organization Simulator Core - Rust Engine
//!
//! Month-by-month simulation of an organization's teams with deterministic
//! execution, scheduled interventions and optional model-driven performance.
//!
//! # Architecture
//!
//! - **config**: Parameter ingestion (clamping, warnings) and engine settings
//! - **core**: Month clock
//! - **models**: Domain types (Team, TeamRoster, OrganizationGraph, Intervention)
//! - **bootstrap**: Synthetic generation and real-data derivation of the roster
//! - **predictor**: Trained-model capability and the model directory
//! - **orchestrator**: Monthly step loop, metrics and checkpoints
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. All randomness is deterministic (seeded, engine-scoped RNG)
//! 2. Team attributes stay inside their bounds after every step
//! 3. The results series holds exactly one record per month, starting at 0
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod bootstrap;
pub mod config;
pub mod core;
pub mod models;
pub mod orchestrator;
pub mod predictor;
pub mod rng;

// Re-exports for convenience
pub use bootstrap::{Dataset, DatasetError};
pub use config::{EngineSettings, ParameterSet, SettingsError, SimulationMode, TrainingFrequency};
pub use core::time::MonthClock;
pub use models::{
    graph::OrganizationGraph,
    intervention::{Intervention, InterventionError, InterventionKind, InterventionLedger},
    organization::{DerivedParameters, OrgMetadata},
    results::{MonthlyResult, ResultsSeries},
    roster::TeamRoster,
    team::{Team, TeamAttributes, TeamId},
};
pub use orchestrator::{
    EngineSnapshot, GraphStats, ModelInfo, SimulationEngine, SimulationError, SimulationMetadata,
};
pub use predictor::{FeatureFrame, LinearPredictor, ModelDirectory, Predictor, PredictorError, PredictorResolver};
pub use rng::RngManager;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn org_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::engine::PySimulationEngine>()?;
    m.add_function(wrap_pyfunction!(ffi::engine::parameter_guide, m)?)?;
    Ok(())
}

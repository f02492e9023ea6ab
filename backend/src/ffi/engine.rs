//! PyO3 wrapper for SimulationEngine
//!
//! This module provides the Python interface to the Rust simulation engine.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use std::path::Path;

use super::types::{dict_to_map, from_py, simulation_error_to_py, to_py};
use crate::config::{EngineSettings, ParameterSet};
use crate::models::intervention::Intervention;
use crate::orchestrator::SimulationEngine as RustEngine;
use crate::predictor::ModelDirectory;

/// Python wrapper for the Rust simulation engine
///
/// # Example (from Python)
///
/// ```python
/// from org_simulator_core_rs import SimulationEngine
///
/// engine = SimulationEngine.new({"team_size": 8, "random_seed": 42})
/// meta = engine.initialize()
/// engine.step(3, [{"type": "leadership", "month": 1, "intensity": 100}])
/// for record in engine.summary():
///     print(record["month"], record["performance"])
/// engine.save("checkpoints/sim_1.ckpt")
/// ```
#[pyclass(name = "SimulationEngine")]
pub struct PySimulationEngine {
    inner: RustEngine,
    models: ModelDirectory,
}

fn model_directory() -> PyResult<ModelDirectory> {
    let settings = EngineSettings::load(None).map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(ModelDirectory::from_settings(&settings))
}

#[pymethods]
impl PySimulationEngine {
    /// Create an engine from a parameter dict
    ///
    /// Parameter ingestion never fails: bad values are clamped or ignored
    /// and reported in `metadata()["parameters"]["warnings"]`.
    #[staticmethod]
    #[pyo3(signature = (parameters=None))]
    fn new(parameters: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let params = match parameters {
            Some(dict) => ParameterSet::from_map(&dict_to_map(dict)?),
            None => ParameterSet::default(),
        };
        Ok(PySimulationEngine {
            inner: RustEngine::new(params),
            models: model_directory()?,
        })
    }

    /// Build the initial organization; returns the organization metadata
    ///
    /// Resolves `model_reference` (if set) against the model store.
    fn initialize(&mut self, py: Python) -> PyResult<PyObject> {
        let org = self.inner.initialize().map_err(simulation_error_to_py)?;
        self.inner.resolve_predictor(&self.models);
        to_py(py, &org)
    }

    /// Schedule interventions and advance `steps` months
    #[pyo3(signature = (steps=1, interventions=None))]
    fn step(&mut self, steps: usize, interventions: Option<&Bound<'_, PyList>>) -> PyResult<()> {
        let plan: Vec<Intervention> = match interventions {
            Some(list) => list
                .iter()
                .map(|item| from_py(&item, "intervention"))
                .collect::<PyResult<_>>()?,
            None => Vec::new(),
        };
        self.inner.step(steps, plan).map_err(simulation_error_to_py)
    }

    /// Results series as a list of dicts (month 0 first)
    fn summary(&self, py: Python) -> PyResult<PyObject> {
        to_py(py, &self.inner.summary())
    }

    /// Organization, parameter, model and graph information
    fn metadata(&self, py: Python) -> PyResult<PyObject> {
        to_py(py, &self.inner.metadata())
    }

    /// Current month (number of completed steps)
    fn current_step(&self) -> usize {
        self.inner.current_step()
    }

    /// Regenerate the communication graph from the current roster
    fn rebuild_graph(&mut self) -> PyResult<()> {
        self.inner.rebuild_graph().map_err(simulation_error_to_py)
    }

    /// Write a checkpoint (and its `_summary.json` companion)
    fn save(&self, path: &str) -> PyResult<()> {
        self.inner.save(Path::new(path)).map_err(simulation_error_to_py)
    }

    /// Load an engine from a checkpoint, re-attaching its model if possible
    #[staticmethod]
    fn load(path: &str) -> PyResult<Self> {
        let models = model_directory()?;
        let inner = RustEngine::load(Path::new(path), Some(&models)).map_err(simulation_error_to_py)?;
        Ok(PySimulationEngine { inner, models })
    }
}

/// Parameter documentation as a list of dicts
#[pyfunction]
pub fn parameter_guide(py: Python) -> PyResult<PyObject> {
    to_py(py, &ParameterSet::guide())
}

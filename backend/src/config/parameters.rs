//! Simulation parameters
//!
//! [`ParameterSet`] is the validated configuration of one simulation.
//! Ingestion from an untrusted key/value map is total: it never fails.
//! Out-of-range numbers are clamped to the nearest bound, values of the
//! wrong type or unknown categorical values are ignored, and each violation
//! leaves one warning string on the parameter set. Unknown keys are ignored.
//!
//! # Example
//!
//! ```rust
//! use org_simulator_core_rs::config::ParameterSet;
//! use serde_json::json;
//!
//! let params = ParameterSet::from_value(&json!({
//!     "team_size": 120,
//!     "training_frequency": "weekly",
//!     "random_seed": 7,
//! }));
//!
//! assert_eq!(params.team_size(), 50);
//! assert_eq!(params.random_seed(), 7);
//! assert_eq!(params.warnings().len(), 2);
//! ```

use crate::models::organization::DerivedParameters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

pub const TEAM_SIZE_RANGE: (u32, u32) = (3, 50);
pub const HIERARCHY_LEVELS_RANGE: (u32, u32) = (1, 10);
pub const COMMUNICATION_DENSITY_RANGE: (f64, f64) = (0.1, 1.0);
pub const TURNOVER_RATE_RANGE: (f64, f64) = (0.01, 0.5);
pub const SIMULATION_DURATION_RANGE: (u32, u32) = (1, 60);

/// How often scheduled training happens (advisory)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingFrequency {
    Monthly,
    Quarterly,
    Biannual,
    Annual,
}

impl TrainingFrequency {
    pub const ALL: [TrainingFrequency; 4] = [
        TrainingFrequency::Monthly,
        TrainingFrequency::Quarterly,
        TrainingFrequency::Biannual,
        TrainingFrequency::Annual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingFrequency::Monthly => "monthly",
            TrainingFrequency::Quarterly => "quarterly",
            TrainingFrequency::Biannual => "biannual",
            TrainingFrequency::Annual => "annual",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == raw)
    }
}

/// Initialization strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    Synthetic,
    RealData,
}

impl SimulationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationMode::Synthetic => "synthetic",
            SimulationMode::RealData => "real_data",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "synthetic" => Some(SimulationMode::Synthetic),
            "real_data" => Some(SimulationMode::RealData),
            _ => None,
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    team_size: u32,
    hierarchy_levels: u32,
    communication_density: f64,
    /// Annual turnover rate
    turnover_rate: f64,
    training_frequency: TrainingFrequency,
    /// Planned months (advisory)
    simulation_duration: u32,
    random_seed: u64,
    model_reference: Option<String>,
    data_source_reference: Option<String>,
    simulation_mode: SimulationMode,

    /// One entry per rejected or clamped value
    #[serde(default)]
    warnings: Vec<String>,

    /// Keys explicitly supplied by the caller (take precedence over derived values)
    #[serde(default)]
    supplied: BTreeSet<String>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            team_size: 8,
            hierarchy_levels: 3,
            communication_density: 0.6,
            turnover_rate: 0.05,
            training_frequency: TrainingFrequency::Quarterly,
            simulation_duration: 12,
            random_seed: 42,
            model_reference: None,
            data_source_reference: None,
            simulation_mode: SimulationMode::Synthetic,
            warnings: Vec::new(),
            supplied: BTreeSet::new(),
        }
    }
}

/// Canonical key for an incoming name (accepts the legacy aliases)
fn canonical_key(key: &str) -> Option<&'static str> {
    let canonical = match key {
        "team_size" => "team_size",
        "hierarchy_levels" => "hierarchy_levels",
        "communication_density" => "communication_density",
        "turnover_rate" => "turnover_rate",
        "training_frequency" => "training_frequency",
        "simulation_duration" => "simulation_duration",
        "random_seed" => "random_seed",
        "model_reference" | "model_id" => "model_reference",
        "data_source_reference" | "processed_dataset_id" => "data_source_reference",
        "simulation_mode" => "simulation_mode",
        _ => return None,
    };
    Some(canonical)
}

impl ParameterSet {
    /// Build from an untrusted map (never fails; see module docs)
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut params = Self::default();
        params.update(map);
        params
    }

    /// Build from any JSON value; non-objects yield defaults plus a warning
    pub fn from_value(value: &Value) -> Self {
        match value.as_object() {
            Some(map) => Self::from_map(map),
            None => {
                let mut params = Self::default();
                params
                    .warnings
                    .push(format!("parameters must be an object, got {}; using defaults", type_name(value)));
                params
            }
        }
    }

    /// Apply caller-supplied values on top of the current ones
    pub fn update(&mut self, map: &Map<String, Value>) {
        self.apply(map, true);
    }

    /// Merge values back-derived from a dataset
    ///
    /// Keys the caller supplied explicitly keep their values; every other
    /// derived value is applied through the same validation as caller input,
    /// so the merged set is re-validated and may gain warnings.
    pub fn merge_derived(&self, derived: &DerivedParameters) -> ParameterSet {
        let mut map = Map::new();
        if let Some(size) = derived.team_size {
            map.insert("team_size".into(), Value::from(size.round()));
        }
        if let Some(levels) = derived.hierarchy_levels {
            map.insert("hierarchy_levels".into(), Value::from(levels));
        }
        if let Some(density) = derived.communication_density {
            map.insert("communication_density".into(), Value::from(density));
        }
        if let Some(rate) = derived.turnover_rate {
            map.insert("turnover_rate".into(), Value::from(rate));
        }
        map.retain(|key, _| !self.supplied.contains(key.as_str()));

        let mut merged = self.clone();
        merged.apply(&map, false);
        merged
    }

    fn apply(&mut self, map: &Map<String, Value>, from_caller: bool) {
        for (raw_key, value) in map {
            let Some(key) = canonical_key(raw_key) else {
                continue;
            };
            let accepted = match key {
                "team_size" => self
                    .read_integer(key, value, TEAM_SIZE_RANGE)
                    .map(|v| self.team_size = v),
                "hierarchy_levels" => self
                    .read_integer(key, value, HIERARCHY_LEVELS_RANGE)
                    .map(|v| self.hierarchy_levels = v),
                "simulation_duration" => self
                    .read_integer(key, value, SIMULATION_DURATION_RANGE)
                    .map(|v| self.simulation_duration = v),
                "communication_density" => self
                    .read_float(key, value, COMMUNICATION_DENSITY_RANGE)
                    .map(|v| self.communication_density = v),
                "turnover_rate" => self
                    .read_float(key, value, TURNOVER_RATE_RANGE)
                    .map(|v| self.turnover_rate = v),
                "random_seed" => self.read_seed(value).map(|v| self.random_seed = v),
                "training_frequency" => match value.as_str().and_then(TrainingFrequency::parse) {
                    Some(f) => {
                        self.training_frequency = f;
                        Some(())
                    }
                    None => {
                        self.warnings.push(format!(
                            "training_frequency={} is not one of monthly, quarterly, biannual, annual; ignored",
                            value
                        ));
                        None
                    }
                },
                "simulation_mode" => match value.as_str().and_then(SimulationMode::parse) {
                    Some(m) => {
                        self.simulation_mode = m;
                        Some(())
                    }
                    None => {
                        self.warnings.push(format!(
                            "simulation_mode={} is not one of synthetic, real_data; ignored",
                            value
                        ));
                        None
                    }
                },
                "model_reference" => self
                    .read_reference(key, value)
                    .map(|v| self.model_reference = v),
                "data_source_reference" => self
                    .read_reference(key, value)
                    .map(|v| self.data_source_reference = v),
                _ => None,
            };
            if accepted.is_some() && from_caller {
                self.supplied.insert(key.to_string());
            }
        }
    }

    fn read_number(&mut self, key: &str, value: &Value) -> Option<f64> {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match number {
            Some(n) if n.is_finite() => Some(n),
            _ => {
                self.warnings
                    .push(format!("{} must be a number, got {}; ignored", key, type_name(value)));
                None
            }
        }
    }

    fn read_float(&mut self, key: &str, value: &Value, (min, max): (f64, f64)) -> Option<f64> {
        let n = self.read_number(key, value)?;
        Some(self.clamp_reported(key, n, min, max))
    }

    fn read_integer(&mut self, key: &str, value: &Value, (min, max): (u32, u32)) -> Option<u32> {
        let n = self.read_number(key, value)?;
        let rounded = n.round();
        if rounded != n {
            self.warnings
                .push(format!("{}={} is not an integer; rounded to {}", key, n, rounded));
        }
        Some(self.clamp_reported(key, rounded, min as f64, max as f64) as u32)
    }

    fn clamp_reported(&mut self, key: &str, n: f64, min: f64, max: f64) -> f64 {
        if n < min {
            self.warnings
                .push(format!("{}={} is below minimum {}; clamped to {}", key, n, min, min));
            min
        } else if n > max {
            self.warnings
                .push(format!("{}={} is above maximum {}; clamped to {}", key, n, max, max));
            max
        } else {
            n
        }
    }

    fn read_seed(&mut self, value: &Value) -> Option<u64> {
        let seed = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        if seed.is_none() {
            self.warnings.push(format!(
                "random_seed must be a non-negative integer, got {}; ignored",
                value
            ));
        }
        seed
    }

    /// Optional opaque handle: string or integer, `null` clears it
    fn read_reference(&mut self, key: &str, value: &Value) -> Option<Option<String>> {
        match value {
            Value::Null => Some(None),
            Value::String(s) if s.trim().is_empty() => Some(None),
            Value::String(s) => Some(Some(s.trim().to_string())),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Some(n.to_string())),
            other => {
                self.warnings.push(format!(
                    "{} must be a string or integer id, got {}; ignored",
                    key,
                    type_name(other)
                ));
                None
            }
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn team_size(&self) -> u32 {
        self.team_size
    }

    pub fn hierarchy_levels(&self) -> u32 {
        self.hierarchy_levels
    }

    pub fn communication_density(&self) -> f64 {
        self.communication_density
    }

    pub fn turnover_rate(&self) -> f64 {
        self.turnover_rate
    }

    pub fn training_frequency(&self) -> TrainingFrequency {
        self.training_frequency
    }

    pub fn simulation_duration(&self) -> u32 {
        self.simulation_duration
    }

    pub fn random_seed(&self) -> u64 {
        self.random_seed
    }

    pub fn model_reference(&self) -> Option<&str> {
        self.model_reference.as_deref()
    }

    pub fn data_source_reference(&self) -> Option<&str> {
        self.data_source_reference.as_deref()
    }

    pub fn simulation_mode(&self) -> SimulationMode {
        self.simulation_mode
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Whether the caller explicitly supplied a (valid) value for `key`
    pub fn was_supplied(&self, key: &str) -> bool {
        canonical_key(key).is_some_and(|k| self.supplied.contains(k))
    }

    /// Record the resolved model reference (e.g. the path it resolved to)
    pub fn set_model_reference(&mut self, reference: Option<String>) {
        self.model_reference = reference;
    }

    /// Documentation of every parameter, for UIs and the CLI
    pub fn guide() -> Vec<ParameterGuide> {
        let defaults = Self::default();
        vec![
            ParameterGuide::numeric(
                "team_size",
                "Average number of employees per team",
                TEAM_SIZE_RANGE.0 as f64,
                TEAM_SIZE_RANGE.1 as f64,
                Value::from(defaults.team_size),
            ),
            ParameterGuide::numeric(
                "hierarchy_levels",
                "Number of organizational hierarchy levels",
                HIERARCHY_LEVELS_RANGE.0 as f64,
                HIERARCHY_LEVELS_RANGE.1 as f64,
                Value::from(defaults.hierarchy_levels),
            ),
            ParameterGuide::numeric(
                "communication_density",
                "Density of communication network (0.1-1.0)",
                COMMUNICATION_DENSITY_RANGE.0,
                COMMUNICATION_DENSITY_RANGE.1,
                Value::from(defaults.communication_density),
            ),
            ParameterGuide::numeric(
                "turnover_rate",
                "Annual employee turnover rate (0.01-0.5)",
                TURNOVER_RATE_RANGE.0,
                TURNOVER_RATE_RANGE.1,
                Value::from(defaults.turnover_rate),
            ),
            ParameterGuide::options(
                "training_frequency",
                "How often training occurs",
                TrainingFrequency::ALL.iter().map(|f| f.as_str()).collect(),
                Value::from(defaults.training_frequency.as_str()),
            ),
            ParameterGuide::numeric(
                "simulation_duration",
                "Planned duration of the simulation in months",
                SIMULATION_DURATION_RANGE.0 as f64,
                SIMULATION_DURATION_RANGE.1 as f64,
                Value::from(defaults.simulation_duration),
            ),
            ParameterGuide::open(
                "random_seed",
                "Random seed for reproducibility",
                Value::from(defaults.random_seed),
            ),
            ParameterGuide::open(
                "model_reference",
                "Id or path of a trained model used to blend predicted performance",
                Value::Null,
            ),
            ParameterGuide::open(
                "data_source_reference",
                "Path or id of a processed team dataset (real_data mode)",
                Value::Null,
            ),
            ParameterGuide::options(
                "simulation_mode",
                "Initialization strategy: 'synthetic' or 'real_data'",
                vec!["synthetic", "real_data"],
                Value::from(defaults.simulation_mode.as_str()),
            ),
        ]
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Description of one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGuide {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    pub default_value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl ParameterGuide {
    fn numeric(name: &str, description: &str, min: f64, max: f64, default_value: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            min_value: Some(min),
            max_value: Some(max),
            default_value,
            options: None,
        }
    }

    fn options(name: &str, description: &str, options: Vec<&str>, default_value: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            min_value: None,
            max_value: None,
            default_value,
            options: Some(options.into_iter().map(String::from).collect()),
        }
    }

    fn open(name: &str, description: &str, default_value: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            min_value: None,
            max_value: None,
            default_value,
            options: None,
        }
    }
}

//! Predictor capability
//!
//! The engine consumes an externally trained model through the narrow
//! [`Predictor`] trait: it reads the declared feature names and asks for one
//! performance prediction per team. Predictors are shared read-only
//! (`Arc<dyn Predictor>`); the engine never mutates or serializes them.
//! Checkpoints store only the model reference, which a [`PredictorResolver`]
//! turns back into a predictor on load.

pub mod linear;
pub mod registry;

use crate::models::roster::TeamRoster;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub use linear::LinearPredictor;
pub use registry::ModelDirectory;

/// Errors raised by predictors and resolvers
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model {reference}: {detail}")]
    InvalidModel { reference: String, detail: String },

    #[error("Feature frame has {actual} columns, model expects {expected}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}

/// Feature table with one row per team
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureFrame {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Self { columns, rows }
    }

    /// Build a frame from the roster for the given feature names
    ///
    /// Returns the frame and the number of requested features the roster
    /// actually provides. A feature counts as provided when at least one
    /// team carries it; missing cells are filled with 0.
    pub fn from_roster(roster: &TeamRoster, feature_names: &[String]) -> (Self, usize) {
        let available = feature_names
            .iter()
            .filter(|name| roster.iter().any(|team| team.feature(name).is_some()))
            .count();

        let rows = roster
            .iter()
            .map(|team| {
                feature_names
                    .iter()
                    .map(|name| team.feature(name).unwrap_or(0.0))
                    .collect()
            })
            .collect();

        (Self::new(feature_names.to_vec(), rows), available)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Mean of one column (None for unknown columns or empty frames)
    pub fn column_mean(&self, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        if self.rows.is_empty() {
            return None;
        }
        let sum: f64 = self.rows.iter().filter_map(|r| r.get(idx)).sum();
        Some(sum / self.rows.len() as f64)
    }
}

/// Feature ranked by influence on the prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDriver {
    pub feature: String,
    pub importance: f64,
}

/// Feature whose team average deviates strongly from the training average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusualValue {
    pub team_value: f64,
    pub global_avg: f64,
    pub direction: String,
    pub impact: f64,
}

/// Structured diagnostics returned with predictions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationInsights {
    pub average_prediction: f64,
    pub top_drivers: Vec<FeatureDriver>,
    pub unusual_values: BTreeMap<String, UnusualValue>,
}

/// Output of [`Predictor::evaluate`]: one prediction per frame row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub predictions: Vec<f64>,
    pub insights: EvaluationInsights,
}

/// Read-only prediction interface of a trained model
pub trait Predictor: Send + Sync {
    /// Short model family name (e.g. "linear", "random_forest")
    fn model_type(&self) -> &str;

    /// Ordered feature names the model was trained on
    fn feature_names(&self) -> &[String];

    /// Predict team performance for every row of `features`
    fn evaluate(&self, features: &FeatureFrame) -> Result<Evaluation, PredictorError>;
}

/// Turns a stored model reference back into a predictor
pub trait PredictorResolver {
    fn resolve(&self, reference: &str) -> Result<Arc<dyn Predictor>, PredictorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::team::{Team, TeamAttributes, TeamId};

    fn roster() -> TeamRoster {
        let mk = |id: i64, perf: f64| {
            Team::new(
                TeamId::Number(id),
                format!("Team_{}", id),
                TeamAttributes {
                    size: 6,
                    avg_tenure_years: 2.0,
                    hierarchy_levels: 2,
                    communication_density: 0.5,
                    diversity_index: 0.4,
                    avg_skill_level: 6.0,
                    training_hours: 12.0,
                    manager_span: 4,
                    performance: perf,
                    innovation: 60.0,
                    satisfaction: 70.0,
                },
            )
        };
        TeamRoster::from_teams(vec![mk(1, 60.0), mk(2, 80.0)]).unwrap()
    }

    #[test]
    fn test_frame_fills_missing_with_zero() {
        let names = vec!["team_size".to_string(), "budget".to_string()];
        let (frame, available) = FeatureFrame::from_roster(&roster(), &names);
        assert_eq!(available, 1);
        assert_eq!(frame.rows(), &[vec![6.0, 0.0], vec![6.0, 0.0]]);
    }

    #[test]
    fn test_column_mean() {
        let names = vec!["performance".to_string()];
        let (frame, _) = FeatureFrame::from_roster(&roster(), &names);
        assert_eq!(frame.column_mean("performance"), Some(70.0));
        assert_eq!(frame.column_mean("missing"), None);
    }
}

//! Linear performance model
//!
//! A trained linear model serialized as JSON:
//!
//! ```json
//! {
//!   "model_type": "linear",
//!   "feature_names": ["team_size", "avg_skill_level"],
//!   "intercept": 40.0,
//!   "coefficients": [0.5, 4.0],
//!   "feature_means": [8.0, 6.5]
//! }
//! ```
//!
//! `feature_means` (optional) are the training-set means, used to flag
//! unusual feature values in the evaluation insights.

use crate::predictor::{
    Evaluation, EvaluationInsights, FeatureDriver, FeatureFrame, Predictor, PredictorError,
    UnusualValue,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Number of drivers reported in insights
const TOP_DRIVERS: usize = 5;
/// Minimum normalized importance for a feature to be flagged as unusual
const UNUSUAL_MIN_IMPORTANCE: f64 = 0.02;
/// Relative deviation from the training mean that counts as unusual
const UNUSUAL_RELATIVE_DEVIATION: f64 = 0.5;

fn default_model_type() -> String {
    "linear".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPredictor {
    #[serde(default = "default_model_type")]
    model_type: String,
    feature_names: Vec<String>,
    intercept: f64,
    coefficients: Vec<f64>,
    #[serde(default)]
    feature_means: Option<Vec<f64>>,
}

impl LinearPredictor {
    pub fn new(
        feature_names: Vec<String>,
        intercept: f64,
        coefficients: Vec<f64>,
    ) -> Result<Self, PredictorError> {
        let model = Self {
            model_type: default_model_type(),
            feature_names,
            intercept,
            coefficients,
            feature_means: None,
        };
        model.check("in-memory model")?;
        Ok(model)
    }

    pub fn with_feature_means(mut self, means: Vec<f64>) -> Result<Self, PredictorError> {
        self.feature_means = Some(means);
        self.check("in-memory model")?;
        Ok(self)
    }

    /// Parse a model from JSON text
    pub fn from_json_str(contents: &str, reference: &str) -> Result<Self, PredictorError> {
        let model: Self = serde_json::from_str(contents).map_err(|e| PredictorError::InvalidModel {
            reference: reference.to_string(),
            detail: e.to_string(),
        })?;
        model.check(reference)?;
        Ok(model)
    }

    /// Load a model file
    pub fn from_path(path: &Path) -> Result<Self, PredictorError> {
        let contents = std::fs::read_to_string(path).map_err(|source| PredictorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents, &path.display().to_string())
    }

    fn check(&self, reference: &str) -> Result<(), PredictorError> {
        let invalid = |detail: String| PredictorError::InvalidModel {
            reference: reference.to_string(),
            detail,
        };
        if self.feature_names.len() != self.coefficients.len() {
            return Err(invalid(format!(
                "{} feature names but {} coefficients",
                self.feature_names.len(),
                self.coefficients.len()
            )));
        }
        if let Some(means) = &self.feature_means {
            if means.len() != self.feature_names.len() {
                return Err(invalid(format!(
                    "{} feature means for {} features",
                    means.len(),
                    self.feature_names.len()
                )));
            }
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(invalid("non-finite parameters".to_string()));
        }
        Ok(())
    }

    /// Coefficient magnitudes normalized to sum to 1
    fn importances(&self) -> Vec<f64> {
        let total: f64 = self.coefficients.iter().map(|c| c.abs()).sum();
        if total == 0.0 {
            return vec![0.0; self.coefficients.len()];
        }
        self.coefficients.iter().map(|c| c.abs() / total).collect()
    }

    fn insights(&self, features: &FeatureFrame, predictions: &[f64]) -> EvaluationInsights {
        let importances = self.importances();

        let mut drivers: Vec<FeatureDriver> = self
            .feature_names
            .iter()
            .zip(&importances)
            .map(|(name, &importance)| FeatureDriver {
                feature: name.clone(),
                importance,
            })
            .collect();
        drivers.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.feature.cmp(&b.feature))
        });
        drivers.truncate(TOP_DRIVERS);

        let mut unusual_values = BTreeMap::new();
        if let Some(means) = &self.feature_means {
            for ((name, &global_avg), &importance) in
                self.feature_names.iter().zip(means).zip(&importances)
            {
                let Some(team_value) = features.column_mean(name) else {
                    continue;
                };
                if importance > UNUSUAL_MIN_IMPORTANCE
                    && (team_value - global_avg).abs() > UNUSUAL_RELATIVE_DEVIATION * global_avg.abs()
                {
                    let direction = if team_value > global_avg { "higher" } else { "lower" };
                    unusual_values.insert(
                        name.clone(),
                        UnusualValue {
                            team_value,
                            global_avg,
                            direction: direction.to_string(),
                            impact: importance,
                        },
                    );
                }
            }
        }

        let average_prediction = if predictions.is_empty() {
            0.0
        } else {
            predictions.iter().sum::<f64>() / predictions.len() as f64
        };

        EvaluationInsights {
            average_prediction,
            top_drivers: drivers,
            unusual_values,
        }
    }
}

impl Predictor for LinearPredictor {
    fn model_type(&self) -> &str {
        &self.model_type
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn evaluate(&self, features: &FeatureFrame) -> Result<Evaluation, PredictorError> {
        if features.columns() != self.feature_names.as_slice() {
            return Err(PredictorError::FeatureMismatch {
                expected: self.feature_names.len(),
                actual: features.columns().len(),
            });
        }

        let predictions: Vec<f64> = features
            .rows()
            .iter()
            .map(|row| {
                self.intercept
                    + row
                        .iter()
                        .zip(&self.coefficients)
                        .map(|(x, c)| x * c)
                        .sum::<f64>()
            })
            .collect();

        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(PredictorError::Evaluation(
                "model produced a non-finite prediction".to_string(),
            ));
        }

        let insights = self.insights(features, &predictions);
        Ok(Evaluation {
            predictions,
            insights,
        })
    }
}

//! Process-wide engine settings
//!
//! Where trained models and checkpoints live on disk. Settings come from an
//! optional TOML file and are then overridden by environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `ORGSIM_MODEL_STORAGE_PATH` | `model_storage_path` |
//! | `ORGSIM_CHECKPOINT_DIR` | `checkpoint_dir` |
//! | `ORGSIM_DEFAULT_STEPS` | `default_simulation_steps` |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {detail}")]
    Parse { path: String, detail: String },

    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Root of the model store; model files live in `<root>/models`
    pub model_storage_path: PathBuf,
    /// Default directory for checkpoints
    pub checkpoint_dir: PathBuf,
    /// Steps to run when a caller does not say
    pub default_simulation_steps: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            model_storage_path: PathBuf::from("model_storage"),
            checkpoint_dir: PathBuf::from("checkpoints"),
            default_simulation_steps: 24,
        }
    }
}

impl EngineSettings {
    /// Parse settings from TOML text (missing fields take defaults)
    pub fn from_toml_str(contents: &str, origin: &str) -> Result<Self, SettingsError> {
        toml::from_str(contents).map_err(|e| SettingsError::Parse {
            path: origin.to_string(),
            detail: e.to_string(),
        })
    }

    /// Load from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let base = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml_str(&contents, &path.display().to_string())?
            }
            None => Self::default(),
        };
        base.with_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from a variable lookup (the environment in production)
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        if let Some(path) = lookup("ORGSIM_MODEL_STORAGE_PATH") {
            self.model_storage_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("ORGSIM_CHECKPOINT_DIR") {
            self.checkpoint_dir = PathBuf::from(dir);
        }
        if let Some(steps) = lookup("ORGSIM_DEFAULT_STEPS") {
            self.default_simulation_steps =
                steps.trim().parse().map_err(|_| SettingsError::InvalidEnv {
                    var: "ORGSIM_DEFAULT_STEPS",
                    value: steps.clone(),
                })?;
        }
        Ok(self)
    }

    /// Directory scanned for model files
    pub fn models_dir(&self) -> PathBuf {
        self.model_storage_path.join("models")
    }
}

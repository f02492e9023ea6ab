//! Configuration: per-simulation parameters and per-process settings

pub mod parameters;
pub mod settings;

pub use parameters::{ParameterGuide, ParameterSet, SimulationMode, TrainingFrequency};
pub use settings::{EngineSettings, SettingsError};

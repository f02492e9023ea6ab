//! Orchestrator - simulation engine, metrics and checkpoints
//!
//! See `engine.rs` for the monthly step loop.

pub mod checkpoint;
pub mod engine;
pub mod metrics;

// Re-export main types for convenience
pub use engine::{GraphStats, ModelInfo, SimulationEngine, SimulationError, SimulationMetadata};

// Re-export checkpoint types
pub use checkpoint::{EngineSnapshot, CHECKPOINT_FORMAT_VERSION};

//! # orgsim
//!
//! Command-line driver for the organization simulator. Every invocation is
//! one request: it loads a checkpoint (or creates one), acts, and saves.
//!
//! ## Usage
//!
//! ```bash
//! # Show parameter documentation
//! orgsim guide
//!
//! # Create a simulation from inline parameters and run 6 months
//! orgsim init --set team_size=8 --set random_seed=42 --steps 6
//!
//! # Continue it with interventions from a JSON file
//! orgsim step --steps 3 --interventions plan.json
//!
//! # Print the results series
//! orgsim summary
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use org_simulator_core_rs::{EngineSettings, Intervention, ModelDirectory, ParameterSet, SimulationEngine};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "orgsim")]
#[command(about = "Organizational simulation engine")]
#[command(version)]
struct Args {
    /// Engine settings file (TOML)
    #[arg(long, global = true, env = "ORGSIM_SETTINGS")]
    settings: Option<PathBuf>,

    /// Checkpoint file (default: <checkpoint_dir>/simulation.ckpt)
    #[arg(short, long, global = true)]
    checkpoint: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the parameter guide as JSON
    Guide,

    /// Create and initialize a simulation, then save it
    Init {
        /// JSON file with a parameter object
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Inline parameter, `key=value` (value parsed as JSON when possible)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Months to run right after initialization
        #[arg(long, default_value = "0")]
        steps: usize,
    },

    /// Load a simulation, advance it and save it
    Step {
        /// Months to advance (default: settings' default_simulation_steps)
        #[arg(short, long)]
        steps: Option<usize>,

        /// JSON file with an array of interventions
        #[arg(short, long)]
        interventions: Option<PathBuf>,
    },

    /// Print the results series (or the metadata) as JSON
    Summary {
        #[arg(long)]
        metadata: bool,
    },
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Expected KEY=VALUE, got '{}'", raw);
    };
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}

fn read_json(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn parameter_map(params: Option<&Path>, set: &[String]) -> Result<Map<String, Value>> {
    let mut map = match params {
        Some(path) => match read_json(path)? {
            Value::Object(map) => map,
            _ => bail!("{} must contain a JSON object", path.display()),
        },
        None => Map::new(),
    };
    for raw in set {
        let (key, value) = parse_assignment(raw)?;
        map.insert(key, value);
    }
    Ok(map)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = EngineSettings::load(args.settings.as_deref()).context("Failed to load settings")?;
    let models = ModelDirectory::from_settings(&settings);
    let checkpoint = args
        .checkpoint
        .clone()
        .unwrap_or_else(|| settings.checkpoint_dir.join("simulation.ckpt"));

    match args.command {
        Command::Guide => print_json(&ParameterSet::guide())?,

        Command::Init { params, set, steps } => {
            let map = parameter_map(params.as_deref(), &set)?;
            let mut engine = SimulationEngine::new(ParameterSet::from_map(&map));
            let org = engine.initialize()?;
            engine.resolve_predictor(&models);
            if steps > 0 {
                engine.step(steps, Vec::new())?;
            }
            engine.save(&checkpoint)?;
            info!(teams = org.num_teams, path = %checkpoint.display(), "Initialized simulation");
            print_json(&engine.metadata())?;
        }

        Command::Step { steps, interventions } => {
            let mut engine = SimulationEngine::load(&checkpoint, Some(&models))
                .with_context(|| format!("Failed to load {}", checkpoint.display()))?;
            let plan: Vec<Intervention> = match interventions {
                Some(path) => serde_json::from_value(read_json(&path)?)
                    .with_context(|| format!("Invalid interventions in {}", path.display()))?,
                None => Vec::new(),
            };
            engine.step(steps.unwrap_or(settings.default_simulation_steps), plan)?;
            engine.save(&checkpoint)?;
            if let Some(latest) = engine.results().latest() {
                print_json(latest)?;
            }
        }

        Command::Summary { metadata } => {
            let engine = SimulationEngine::load(&checkpoint, Some(&models))
                .with_context(|| format!("Failed to load {}", checkpoint.display()))?;
            if metadata {
                print_json(&engine.metadata())?;
            } else {
                print_json(&engine.summary())?;
            }
        }
    }

    Ok(())
}

//! Interventions and the intervention ledger
//!
//! An intervention is a scheduled, one-time organizational action. The
//! ledger keeps every intervention ever scheduled, in scheduling order;
//! entries are matched by month when the engine steps but are never removed,
//! so the full plan stays inspectable.
//!
//! # Effects
//!
//! Each kind maps to a fixed transformation of the targeted teams, scaled by
//! `intensity / 100`:
//!
//! | Kind | Effect |
//! |---|---|
//! | communication | density `+0.2s` (≤1.0), satisfaction `+3s` (≤100) |
//! | training | skill `+1s` (≤10), training hours `+10s`, performance `+5s` (≤100) |
//! | reorganization | size `+(u-0.3)·5s` (≥3), satisfaction `-10s` (≥40), innovation `+10s` (≤100), density `+(u-0.3)·0.4s` ([0.2,1.0]) |
//! | leadership | satisfaction `+8s` (≤100), performance `+4s` (≤100), density `+0.1s` (≤1.0) |
//!
//! `u` is a fresh uniform draw per targeted team. Attributes are updated one
//! at a time across all targeted teams, so random draws are consumed in
//! (attribute, team) order.

use crate::models::roster::TeamRoster;
use crate::models::team::{
    Bounds, COMMUNICATION_BOUNDS, INNOVATION_BOUNDS, MIN_DYNAMIC_TEAM_SIZE, PERFORMANCE_BOUNDS,
    SATISFACTION_BOUNDS, TeamId,
};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reorganization never pushes satisfaction below this floor
const REORG_SATISFACTION_FLOOR: f64 = 40.0;
/// Reorganization keeps communication density within [0.2, 1.0]
const REORG_DENSITY_BOUNDS: Bounds = Bounds::new(0.2, 1.0);

#[derive(Debug, Error, PartialEq)]
pub enum InterventionError {
    #[error("Intervention month must be >= 1, got {0}")]
    InvalidMonth(usize),

    #[error("Intervention intensity must be within 1..=100, got {0}")]
    InvalidIntensity(u32),
}

/// Kind of organizational action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionKind {
    Communication,
    Training,
    Reorganization,
    Leadership,
}

impl fmt::Display for InterventionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterventionKind::Communication => "communication",
            InterventionKind::Training => "training",
            InterventionKind::Reorganization => "reorganization",
            InterventionKind::Leadership => "leadership",
        };
        f.write_str(name)
    }
}

fn default_intensity() -> u32 {
    50
}

/// A scheduled intervention
///
/// # Example
///
/// ```rust
/// use org_simulator_core_rs::models::intervention::{Intervention, InterventionKind};
///
/// let plan: Intervention = serde_json::from_str(
///     r#"{"type": "leadership", "month": 1, "intensity": 100, "target_teams": []}"#,
/// ).unwrap();
/// assert_eq!(plan.kind, InterventionKind::Leadership);
/// assert!(plan.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    #[serde(rename = "type")]
    pub kind: InterventionKind,

    /// Step at which the intervention fires (exactly once)
    pub month: usize,

    /// Strength, 1..=100
    #[serde(default = "default_intensity")]
    pub intensity: u32,

    /// Targeted teams; empty means every team
    #[serde(default)]
    pub target_teams: Vec<TeamId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Intervention {
    /// Convenience constructor targeting every team
    pub fn organization_wide(kind: InterventionKind, month: usize, intensity: u32) -> Self {
        Self {
            kind,
            month,
            intensity,
            target_teams: Vec::new(),
            description: None,
        }
    }

    /// Same intervention restricted to the given teams
    pub fn targeting(mut self, teams: Vec<TeamId>) -> Self {
        self.target_teams = teams;
        self
    }

    pub fn validate(&self) -> Result<(), InterventionError> {
        if self.month < 1 {
            return Err(InterventionError::InvalidMonth(self.month));
        }
        if !(1..=100).contains(&self.intensity) {
            return Err(InterventionError::InvalidIntensity(self.intensity));
        }
        Ok(())
    }

    /// Intensity on the 0..1 scale used by the effect formulas
    pub fn scale(&self) -> f64 {
        self.intensity as f64 / 100.0
    }

    /// Apply this intervention's effects to the targeted teams
    pub fn apply(&self, roster: &mut TeamRoster, rng: &mut RngManager) {
        let targets = roster.resolve_targets(&self.target_teams);
        let s = self.scale();
        let cap = |max: f64| Bounds::new(f64::NEG_INFINITY, max);
        let floor = |min: f64| Bounds::new(min, f64::INFINITY);

        match self.kind {
            InterventionKind::Communication => {
                for_each(roster, &targets, |t| {
                    t.adjust_communication_density(s * 0.2, cap(COMMUNICATION_BOUNDS.max))
                });
                for_each(roster, &targets, |t| {
                    t.adjust_satisfaction(s * 3.0, cap(SATISFACTION_BOUNDS.max))
                });
            }
            InterventionKind::Training => {
                for_each(roster, &targets, |t| t.adjust_skill(s * 1.0));
                for_each(roster, &targets, |t| t.add_training_hours(s * 10.0));
                for_each(roster, &targets, |t| {
                    t.adjust_performance(s * 5.0, cap(PERFORMANCE_BOUNDS.max))
                });
            }
            InterventionKind::Reorganization => {
                for_each(roster, &targets, |t| {
                    let delta = (rng.next_f64() - 0.3) * s * 5.0;
                    t.adjust_size(delta, MIN_DYNAMIC_TEAM_SIZE)
                });
                for_each(roster, &targets, |t| {
                    t.adjust_satisfaction(-s * 10.0, floor(REORG_SATISFACTION_FLOOR))
                });
                for_each(roster, &targets, |t| {
                    t.adjust_innovation(s * 10.0, cap(INNOVATION_BOUNDS.max))
                });
                for_each(roster, &targets, |t| {
                    let delta = (rng.next_f64() - 0.3) * s * 0.4;
                    t.adjust_communication_density(delta, REORG_DENSITY_BOUNDS)
                });
            }
            InterventionKind::Leadership => {
                for_each(roster, &targets, |t| {
                    t.adjust_satisfaction(s * 8.0, cap(SATISFACTION_BOUNDS.max))
                });
                for_each(roster, &targets, |t| {
                    t.adjust_performance(s * 4.0, cap(PERFORMANCE_BOUNDS.max))
                });
                for_each(roster, &targets, |t| {
                    t.adjust_communication_density(s * 0.1, cap(COMMUNICATION_BOUNDS.max))
                });
            }
        }
    }
}

fn for_each(
    roster: &mut TeamRoster,
    targets: &[usize],
    mut f: impl FnMut(&mut crate::models::team::Team),
) {
    for &pos in targets {
        if let Some(team) = roster.at_mut(pos) {
            f(team);
        }
    }
}

/// Ordered, append-only list of scheduled interventions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterventionLedger {
    entries: Vec<Intervention>,
}

impl InterventionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append interventions, all-or-nothing
    pub fn schedule(&mut self, interventions: Vec<Intervention>) -> Result<(), InterventionError> {
        for intervention in &interventions {
            intervention.validate()?;
        }
        self.entries.extend(interventions);
        Ok(())
    }

    /// Interventions firing at `month`, in scheduling order
    pub fn due_at(&self, month: usize) -> Vec<&Intervention> {
        self.entries.iter().filter(|i| i.month == month).collect()
    }

    pub fn entries(&self) -> &[Intervention] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut plan = Intervention::organization_wide(InterventionKind::Training, 0, 50);
        assert_eq!(plan.validate(), Err(InterventionError::InvalidMonth(0)));
        plan.month = 2;
        plan.intensity = 101;
        assert_eq!(plan.validate(), Err(InterventionError::InvalidIntensity(101)));
    }

    #[test]
    fn test_schedule_is_all_or_nothing() {
        let mut ledger = InterventionLedger::new();
        let good = Intervention::organization_wide(InterventionKind::Leadership, 1, 80);
        let bad = Intervention::organization_wide(InterventionKind::Leadership, 1, 0);
        assert!(ledger.schedule(vec![good, bad]).is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_due_at_preserves_order_and_history() {
        let mut ledger = InterventionLedger::new();
        ledger
            .schedule(vec![
                Intervention::organization_wide(InterventionKind::Training, 2, 10),
                Intervention::organization_wide(InterventionKind::Communication, 1, 20),
                Intervention::organization_wide(InterventionKind::Leadership, 2, 30),
            ])
            .unwrap();

        let due: Vec<_> = ledger.due_at(2).iter().map(|i| i.kind).collect();
        assert_eq!(due, vec![InterventionKind::Training, InterventionKind::Leadership]);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_default_intensity_when_missing() {
        let plan: Intervention = serde_json::from_str(r#"{"type": "training", "month": 3}"#).unwrap();
        assert_eq!(plan.intensity, 50);
        assert!(plan.target_teams.is_empty());
    }
}

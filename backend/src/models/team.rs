//! Team model
//!
//! A team is the atomic unit of simulation state: an aggregate of employees
//! that is never modeled individually. Each team carries structural
//! attributes (size, hierarchy, span of control), capability attributes
//! (tenure, skill, training) and three outcome scores.
//!
//! # Critical Invariants
//!
//! Every bounded field is clamped to its range after every mutation. The
//! mutators on [`Team`] are the only way the engine changes a team, and each
//! one clamps before returning.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Closed numeric interval used for clamping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

pub const PERFORMANCE_BOUNDS: Bounds = Bounds::new(40.0, 100.0);
pub const INNOVATION_BOUNDS: Bounds = Bounds::new(30.0, 100.0);
pub const SATISFACTION_BOUNDS: Bounds = Bounds::new(30.0, 100.0);
pub const COMMUNICATION_BOUNDS: Bounds = Bounds::new(0.0, 1.0);
pub const DIVERSITY_BOUNDS: Bounds = Bounds::new(0.0, 1.0);
pub const SKILL_BOUNDS: Bounds = Bounds::new(1.0, 10.0);

/// Smallest team the dynamics and reorganizations will shrink a team to
pub const MIN_DYNAMIC_TEAM_SIZE: u32 = 3;

/// Team identifier: a stable integer or an external key from a dataset
///
/// Serialized untagged, so `7` and `"platform"` are both valid ids in JSON.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TeamId {
    Number(i64),
    Key(String),
}

impl TeamId {
    /// Parse a dataset cell: canonical integers become `Number`, anything
    /// else `Key`
    ///
    /// `"007"`, `"+7"` and `"7.0"` stay keys so they never merge with team 7.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(n) if n.to_string() == trimmed => TeamId::Number(n),
            _ => TeamId::Key(trimmed.to_string()),
        }
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamId::Number(n) => write!(f, "{}", n),
            TeamId::Key(k) => write!(f, "{}", k),
        }
    }
}

impl From<i64> for TeamId {
    fn from(n: i64) -> Self {
        TeamId::Number(n)
    }
}

impl From<&str> for TeamId {
    fn from(key: &str) -> Self {
        TeamId::Key(key.to_string())
    }
}

/// One organizational team
///
/// Field names match the feature columns a predictor is trained on, see
/// [`Team::feature`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    team_id: TeamId,
    name: String,
    size: u32,
    avg_tenure_years: f64,
    hierarchy_levels: u32,
    communication_density: f64,
    diversity_index: f64,
    avg_skill_level: f64,
    training_hours: f64,
    manager_span: u32,
    performance: f64,
    innovation: f64,
    satisfaction: f64,

    /// Additional per-team numeric features (real-data mode)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    extra_features: BTreeMap<String, f64>,
}

/// Builder-style input for [`Team::new`]; values are clamped on construction
#[derive(Debug, Clone)]
pub struct TeamAttributes {
    pub size: u32,
    pub avg_tenure_years: f64,
    pub hierarchy_levels: u32,
    pub communication_density: f64,
    pub diversity_index: f64,
    pub avg_skill_level: f64,
    pub training_hours: f64,
    pub manager_span: u32,
    pub performance: f64,
    pub innovation: f64,
    pub satisfaction: f64,
}

impl Team {
    /// Create a team, clamping every attribute into its valid range
    ///
    /// # Example
    /// ```
    /// use org_simulator_core_rs::models::team::{Team, TeamAttributes, TeamId};
    ///
    /// let team = Team::new(
    ///     TeamId::Number(1),
    ///     "Team_1",
    ///     TeamAttributes {
    ///         size: 8,
    ///         avg_tenure_years: 3.0,
    ///         hierarchy_levels: 2,
    ///         communication_density: 1.4, // clamped to 1.0
    ///         diversity_index: 0.6,
    ///         avg_skill_level: 7.0,
    ///         training_hours: 20.0,
    ///         manager_span: 5,
    ///         performance: 75.0,
    ///         innovation: 65.0,
    ///         satisfaction: 70.0,
    ///     },
    /// );
    /// assert_eq!(team.communication_density(), 1.0);
    /// ```
    pub fn new(team_id: TeamId, name: impl Into<String>, attrs: TeamAttributes) -> Self {
        Self {
            team_id,
            name: name.into(),
            size: attrs.size.max(1),
            avg_tenure_years: non_negative(attrs.avg_tenure_years),
            hierarchy_levels: attrs.hierarchy_levels.max(1),
            communication_density: COMMUNICATION_BOUNDS.clamp(finite_or(attrs.communication_density, 0.6)),
            diversity_index: DIVERSITY_BOUNDS.clamp(finite_or(attrs.diversity_index, 0.6)),
            avg_skill_level: SKILL_BOUNDS.clamp(finite_or(attrs.avg_skill_level, 1.0)),
            training_hours: non_negative(attrs.training_hours),
            manager_span: attrs.manager_span.max(1),
            performance: PERFORMANCE_BOUNDS.clamp(finite_or(attrs.performance, 70.0)),
            innovation: INNOVATION_BOUNDS.clamp(finite_or(attrs.innovation, 70.0)),
            satisfaction: SATISFACTION_BOUNDS.clamp(finite_or(attrs.satisfaction, 70.0)),
            extra_features: BTreeMap::new(),
        }
    }

    /// Attach additional numeric features (non-finite values are dropped)
    pub fn with_extra_features(mut self, features: BTreeMap<String, f64>) -> Self {
        self.extra_features = features.into_iter().filter(|(_, v)| v.is_finite()).collect();
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn team_id(&self) -> &TeamId {
        &self.team_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn avg_tenure_years(&self) -> f64 {
        self.avg_tenure_years
    }

    pub fn hierarchy_levels(&self) -> u32 {
        self.hierarchy_levels
    }

    pub fn communication_density(&self) -> f64 {
        self.communication_density
    }

    pub fn diversity_index(&self) -> f64 {
        self.diversity_index
    }

    pub fn avg_skill_level(&self) -> f64 {
        self.avg_skill_level
    }

    pub fn training_hours(&self) -> f64 {
        self.training_hours
    }

    pub fn manager_span(&self) -> u32 {
        self.manager_span
    }

    pub fn performance(&self) -> f64 {
        self.performance
    }

    pub fn innovation(&self) -> f64 {
        self.innovation
    }

    pub fn satisfaction(&self) -> f64 {
        self.satisfaction
    }

    pub fn extra_features(&self) -> &BTreeMap<String, f64> {
        &self.extra_features
    }

    /// Look up a feature column by name
    ///
    /// Accepts both the roster field names and the column names used by the
    /// trained models (`team_size`, `avg_tenure`). Unknown names fall back to
    /// the extra features carried from the dataset.
    pub fn feature(&self, name: &str) -> Option<f64> {
        let value = match name {
            "size" | "team_size" => self.size as f64,
            "avg_tenure_years" | "avg_tenure" => self.avg_tenure_years,
            "hierarchy_levels" => self.hierarchy_levels as f64,
            "communication_density" => self.communication_density,
            "diversity_index" => self.diversity_index,
            "avg_skill_level" => self.avg_skill_level,
            "training_hours" => self.training_hours,
            "manager_span" => self.manager_span as f64,
            "performance" => self.performance,
            "innovation" => self.innovation,
            "satisfaction" => self.satisfaction,
            other => return self.extra_features.get(other).copied(),
        };
        Some(value)
    }

    // ========================================================================
    // Mutators (all clamp)
    // ========================================================================

    /// Add to performance, clamped to `bounds` (a sub-range of the field range)
    pub fn adjust_performance(&mut self, delta: f64, bounds: Bounds) {
        self.performance = clamp_within(self.performance + delta, bounds, PERFORMANCE_BOUNDS);
    }

    /// Replace performance outright (model blending), clamped to the field range
    pub fn set_performance(&mut self, value: f64) {
        self.performance = PERFORMANCE_BOUNDS.clamp(finite_or(value, self.performance));
    }

    pub fn adjust_innovation(&mut self, delta: f64, bounds: Bounds) {
        self.innovation = clamp_within(self.innovation + delta, bounds, INNOVATION_BOUNDS);
    }

    pub fn adjust_satisfaction(&mut self, delta: f64, bounds: Bounds) {
        self.satisfaction = clamp_within(self.satisfaction + delta, bounds, SATISFACTION_BOUNDS);
    }

    pub fn adjust_communication_density(&mut self, delta: f64, bounds: Bounds) {
        self.communication_density =
            clamp_within(self.communication_density + delta, bounds, COMMUNICATION_BOUNDS);
    }

    pub fn adjust_skill(&mut self, delta: f64) {
        self.avg_skill_level = SKILL_BOUNDS.clamp(self.avg_skill_level + delta);
    }

    pub fn add_training_hours(&mut self, hours: f64) {
        self.training_hours = non_negative(self.training_hours + hours);
    }

    /// Change the headcount by a (possibly fractional) delta, rounded, with a floor
    pub fn adjust_size(&mut self, delta: f64, floor: u32) {
        let next = (self.size as f64 + delta).round();
        let next = if next.is_finite() { next.max(floor as f64) } else { self.size as f64 };
        self.size = next as u32;
    }

    /// Age the team by a number of years
    pub fn add_tenure(&mut self, years: f64) {
        self.avg_tenure_years = non_negative(self.avg_tenure_years + years);
    }

    /// Check every documented bound; returns the first violated field name
    pub fn bounds_violation(&self) -> Option<&'static str> {
        if self.size < 1 {
            return Some("size");
        }
        if !(self.avg_tenure_years >= 0.0) {
            return Some("avg_tenure_years");
        }
        if self.hierarchy_levels < 1 {
            return Some("hierarchy_levels");
        }
        if !COMMUNICATION_BOUNDS.contains(self.communication_density) {
            return Some("communication_density");
        }
        if !DIVERSITY_BOUNDS.contains(self.diversity_index) {
            return Some("diversity_index");
        }
        if !SKILL_BOUNDS.contains(self.avg_skill_level) {
            return Some("avg_skill_level");
        }
        if !(self.training_hours >= 0.0) {
            return Some("training_hours");
        }
        if self.manager_span < 1 {
            return Some("manager_span");
        }
        if !PERFORMANCE_BOUNDS.contains(self.performance) {
            return Some("performance");
        }
        if !INNOVATION_BOUNDS.contains(self.innovation) {
            return Some("innovation");
        }
        if !SATISFACTION_BOUNDS.contains(self.satisfaction) {
            return Some("satisfaction");
        }
        None
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Clamp to the operation's bounds, then to the field's own range
fn clamp_within(value: f64, op: Bounds, field: Bounds) -> f64 {
    field.clamp(op.clamp(value))
}

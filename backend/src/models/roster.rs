//! Team roster
//!
//! The roster is the simulation's primary mutable state: an arena of team
//! records with O(1) lookup by id and a stable iteration order (insertion
//! order). Stable order matters because random draws are consumed team by
//! team; iterating a hash map would break replay.

use crate::models::team::{Team, TeamId};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RosterError {
    #[error("Duplicate team id: {0}")]
    DuplicateTeam(TeamId),
}

/// Indexed collection of teams
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamRoster {
    teams: Vec<Team>,
    index: HashMap<TeamId, usize>,
}

impl TeamRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from teams, rejecting duplicate ids
    pub fn from_teams(teams: Vec<Team>) -> Result<Self, RosterError> {
        let mut roster = Self::new();
        for team in teams {
            roster.insert(team)?;
        }
        Ok(roster)
    }

    /// Append a team at the end of the iteration order
    pub fn insert(&mut self, team: Team) -> Result<(), RosterError> {
        if self.index.contains_key(team.team_id()) {
            return Err(RosterError::DuplicateTeam(team.team_id().clone()));
        }
        self.index.insert(team.team_id().clone(), self.teams.len());
        self.teams.push(team);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn get(&self, id: &TeamId) -> Option<&Team> {
        self.index.get(id).map(|&idx| &self.teams[idx])
    }

    pub fn contains(&self, id: &TeamId) -> bool {
        self.index.contains_key(id)
    }

    /// Teams in stable order
    pub fn iter(&self) -> impl Iterator<Item = &Team> {
        self.teams.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Team> {
        self.teams.iter_mut()
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Team ids in stable order
    pub fn ids(&self) -> Vec<TeamId> {
        self.teams.iter().map(|t| t.team_id().clone()).collect()
    }

    /// Positions (in iteration order) of the targeted teams
    ///
    /// An empty target list selects every team. Ids not present in the
    /// roster are skipped; duplicates in the target list are applied once
    /// per occurrence, matching the order in which they were listed.
    pub fn resolve_targets(&self, targets: &[TeamId]) -> Vec<usize> {
        if targets.is_empty() {
            return (0..self.teams.len()).collect();
        }
        targets
            .iter()
            .filter_map(|id| self.index.get(id).copied())
            .collect()
    }

    /// Mutable access by position (as returned by `resolve_targets`)
    pub fn at_mut(&mut self, position: usize) -> Option<&mut Team> {
        self.teams.get_mut(position)
    }

    /// Sum of all team sizes
    pub fn total_employees(&self) -> u64 {
        self.teams.iter().map(|t| t.size() as u64).sum()
    }

    /// Mean of a per-team quantity (0.0 for an empty roster)
    pub fn mean_of(&self, f: impl Fn(&Team) -> f64) -> f64 {
        if self.teams.is_empty() {
            return 0.0;
        }
        self.teams.iter().map(f).sum::<f64>() / self.teams.len() as f64
    }
}

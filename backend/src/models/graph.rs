//! Organization graph
//!
//! Undirected weighted graph whose vertices are teams and whose edges carry
//! inter-team communication strength. Node attributes are a snapshot taken
//! when the graph is built; the graph is a structural view, not a live
//! mirror of the roster.
//!
//! # Determinism
//!
//! - Nodes and edges live in `BTreeMap`s for sorted iteration
//! - Edge keys are normalized so `(a, b)` and `(b, a)` are the same edge
//! - Probabilistic construction visits pairs in roster order

use crate::models::roster::TeamRoster;
use crate::models::team::{Team, TeamId};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node attributes captured at construction time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    pub size: u32,
    pub performance: f64,
}

impl From<&Team> for NodeSnapshot {
    fn from(team: &Team) -> Self {
        Self {
            name: team.name().to_string(),
            size: team.size(),
            performance: team.performance(),
        }
    }
}

/// Serialized edge (for checkpoints)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: TeamId,
    pub target: TeamId,
    pub weight: f64,
}

/// Serialized node (for checkpoints)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub team_id: TeamId,
    #[serde(flatten)]
    pub attributes: NodeSnapshot,
}

/// Serializable form of the whole graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Team communication graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizationGraph {
    nodes: BTreeMap<TeamId, NodeSnapshot>,
    edges: BTreeMap<(TeamId, TeamId), f64>,
}

fn edge_key(a: &TeamId, b: &TeamId) -> (TeamId, TeamId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

impl OrganizationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph with one node per team and no edges
    pub fn with_nodes(roster: &TeamRoster) -> Self {
        let mut graph = Self::new();
        for team in roster.iter() {
            graph.add_node(team);
        }
        graph
    }

    /// Build nodes from the roster and draw edges probabilistically
    ///
    /// Every unordered pair (in roster order) is connected with probability
    /// equal to the mean of the two teams' communication densities; weights
    /// are uniform in (0.1, 1.0].
    pub fn probabilistic(roster: &TeamRoster, rng: &mut RngManager) -> Self {
        let mut graph = Self::with_nodes(roster);
        graph.add_probabilistic_edges(roster, rng);
        graph
    }

    /// Draw edges for every pair of roster teams (see [`Self::probabilistic`])
    pub fn add_probabilistic_edges(&mut self, roster: &TeamRoster, rng: &mut RngManager) {
        let teams = roster.teams();
        for i in 0..teams.len() {
            for j in (i + 1)..teams.len() {
                let p = (teams[i].communication_density() + teams[j].communication_density()) / 2.0;
                if rng.chance(p) {
                    let weight = rng.uniform_exclusive_low(0.1, 1.0);
                    self.set_edge(teams[i].team_id(), teams[j].team_id(), weight);
                }
            }
        }
    }

    pub fn add_node(&mut self, team: &Team) {
        self.nodes.insert(team.team_id().clone(), NodeSnapshot::from(team));
    }

    /// Insert or overwrite an edge; self-loops are ignored
    pub fn set_edge(&mut self, a: &TeamId, b: &TeamId, weight: f64) {
        if a == b {
            return;
        }
        self.edges.insert(edge_key(a, b), weight);
    }

    /// Add `amount` to an edge's weight, creating it if needed
    pub fn strengthen_edge(&mut self, a: &TeamId, b: &TeamId, amount: f64) {
        if a == b {
            return;
        }
        *self.edges.entry(edge_key(a, b)).or_insert(0.0) += amount;
    }

    pub fn edge_weight(&self, a: &TeamId, b: &TeamId) -> Option<f64> {
        self.edges.get(&edge_key(a, b)).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Fraction of possible undirected edges that exist
    pub fn density(&self) -> f64 {
        let n = self.nodes.len();
        if n < 2 {
            return 0.0;
        }
        let possible = n * (n - 1) / 2;
        self.edges.len() as f64 / possible as f64
    }

    /// Sorted neighbor ids of a node
    pub fn neighbors(&self, id: &TeamId) -> Vec<TeamId> {
        self.edges
            .keys()
            .filter_map(|(a, b)| {
                if a == id {
                    Some(b.clone())
                } else if b == id {
                    Some(a.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &TeamId> {
        self.nodes.keys()
    }

    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .nodes
                .iter()
                .map(|(id, attrs)| GraphNode {
                    team_id: id.clone(),
                    attributes: attrs.clone(),
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|((a, b), w)| GraphEdge {
                    source: a.clone(),
                    target: b.clone(),
                    weight: *w,
                })
                .collect(),
        }
    }

    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut graph = Self::new();
        for node in snapshot.nodes {
            graph.nodes.insert(node.team_id, node.attributes);
        }
        for edge in snapshot.edges {
            graph.set_edge(&edge.source, &edge.target, edge.weight);
        }
        graph
    }
}

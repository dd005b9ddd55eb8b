use crate::ActorEdge;
use actorgraph_core::{ActorId, ActorType, EvidenceMode, SourceTier, TimeWindow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Graph node for one capped-in actor. Built independently of edge
/// survival: an actor with no surviving edges still appears here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: ActorId,
    #[serde(default)]
    pub label: Option<String>,
    pub actor_type: ActorType,
    pub source_tier: SourceTier,
    pub score: f64,
    pub volume_usd: f64,
    pub coverage: f64,
    /// Coarse display cluster membership; `None` when unassigned.
    #[serde(default)]
    pub cluster_id: Option<String>,
}

/// Greedy display-only grouping. Never confused with confirmation
/// clusters, which live in the cluster crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphCluster {
    pub id: String,
    pub anchor: ActorId,
    pub members: Vec<ActorId>,
    pub combined_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub network: String,
    pub window: TimeWindow,
    pub generated_at: DateTime<Utc>,
    /// Actors inside the cap, i.e. the node count.
    pub actor_count: usize,
    /// Pairs with at least one non-null signal, before floor/truncation.
    pub candidate_edges: usize,
    pub emitted_edges: usize,
    pub min_weight: f64,
    pub evidence_mode: EvidenceMode,
}

/// The full graph snapshot returned by the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<ActorEdge>,
    pub clusters: Vec<GraphCluster>,
    pub metadata: GraphMetadata,
}

impl ActorGraph {
    pub fn node(&self, actor_id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == actor_id)
    }

    pub fn edge_between(&self, a: &str, b: &str) -> Option<&ActorEdge> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.edges.iter().find(|e| e.a == lo && e.b == hi)
    }
}

use actorgraph_core::{ActorId, ActorRecord, InfraRegistry};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::resolver::{non_blank, resolve_cluster, ClusterKind, ResolutionRule};

/// Aggregated confirmation cluster. Distinct from the display-only
/// grouping in the graph snapshot; this one feeds the confirmation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub cluster_id: String,
    pub kind: ClusterKind,
    pub total_weight: f64,
    pub actor_ids: Vec<ActorId>,
    /// Distinct member types, first-seen order.
    pub actor_types: Vec<String>,
    /// Distinct member source groups, first-seen order.
    pub source_groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    pub actor_id: ActorId,
    pub cluster_id: String,
    pub rule: ResolutionRule,
}

/// Resolves every actor and groups them into clusters, preserving
/// first-seen cluster order. Non-finite or negative actor weights
/// contribute 0 to the cluster total.
pub fn build_clusters(
    actors: &[ActorRecord],
    registry: &dyn InfraRegistry,
) -> (Vec<Cluster>, Vec<TraceEntry>) {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: FxHashMap<String, Cluster> = FxHashMap::default();
    let mut trace: Vec<TraceEntry> = Vec::with_capacity(actors.len());

    for actor in actors {
        if actor.actor_id.trim().is_empty() {
            continue;
        }
        let assignment = resolve_cluster(actor, registry);
        trace.push(TraceEntry {
            actor_id: actor.actor_id.clone(),
            cluster_id: assignment.cluster_id.clone(),
            rule: assignment.rule,
        });

        let cluster = by_id
            .entry(assignment.cluster_id.clone())
            .or_insert_with(|| {
                order.push(assignment.cluster_id.clone());
                Cluster {
                    cluster_id: assignment.cluster_id.clone(),
                    kind: assignment.kind,
                    total_weight: 0.0,
                    actor_ids: Vec::new(),
                    actor_types: Vec::new(),
                    source_groups: Vec::new(),
                }
            });

        let weight = if actor.weight.is_finite() && actor.weight > 0.0 {
            actor.weight
        } else {
            0.0
        };
        cluster.total_weight += weight;
        cluster.actor_ids.push(actor.actor_id.clone());
        let type_name = actor.actor_type.to_string();
        if !cluster.actor_types.contains(&type_name) {
            cluster.actor_types.push(type_name);
        }
        if let Some(group) = non_blank(&actor.source_group) {
            if !cluster.source_groups.iter().any(|g| g == group) {
                cluster.source_groups.push(group.to_string());
            }
        }
    }

    let clusters: Vec<Cluster> = order
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect();
    debug!(
        "Resolved {} actors into {} clusters",
        trace.len(),
        clusters.len()
    );
    (clusters, trace)
}

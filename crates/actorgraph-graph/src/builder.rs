// ABOUTME: Pairwise evidence evaluation and graph assembly for one network window
// ABOUTME: Emits the ActorGraph snapshot with nodes, weighted edges and coarse display clusters

use std::cmp::Ordering;

use actorgraph_core::util::{round_ratio, round_usd};
use actorgraph_core::{
    ActorGraphError, ActorId, ActorRecord, Confidence, GraphBuilderConfig, Result, SourceTier,
    TimeWindow,
};
use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::edge::{ActorEdge, EdgeEvidence};
use crate::evidence::{
    DirectInteractionSource, EvidenceContext, EvidenceSource, FlowCorrelationSource,
    TokenOverlapSource,
};
use crate::snapshot::{ActorGraph, GraphCluster, GraphMetadata, GraphNode};

/// Builds the weighted actor graph for one network and time window.
///
/// The three standard evidence sources are installed by `new`; additional
/// sources can be appended with [`GraphBuilder::with_source`] without
/// touching the pipeline.
pub struct GraphBuilder {
    config: GraphBuilderConfig,
    sources: Vec<Box<dyn EvidenceSource>>,
}

impl GraphBuilder {
    pub fn new(config: GraphBuilderConfig) -> Self {
        Self {
            config,
            sources: vec![
                Box::new(FlowCorrelationSource),
                Box::new(TokenOverlapSource),
                Box::new(DirectInteractionSource),
            ],
        }
    }

    pub fn with_source(mut self, source: Box<dyn EvidenceSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn build(
        &self,
        network: &str,
        window: TimeWindow,
        actors: &[ActorRecord],
    ) -> Result<ActorGraph> {
        self.build_at(network, window, actors, Utc::now())
    }

    /// Same as [`build`](Self::build) with an explicit snapshot timestamp.
    pub fn build_at(
        &self,
        network: &str,
        window: TimeWindow,
        actors: &[ActorRecord],
        generated_at: DateTime<Utc>,
    ) -> Result<ActorGraph> {
        if network.trim().is_empty() {
            return Err(ActorGraphError::InvalidOperation(
                "network name is empty".to_string(),
            ));
        }
        debug!("Building actor graph for {} over {}", network, window);

        let mut seen = FxHashSet::default();
        let mut pool: Vec<&ActorRecord> = actors
            .iter()
            .filter(|a| !a.actor_id.trim().is_empty())
            .filter(|a| seen.insert(a.actor_id.as_str()))
            .collect();
        let skipped = actors.len() - pool.len();
        if skipped > 0 {
            debug!("Skipped {} blank or duplicate actor records", skipped);
        }
        if pool.len() > self.config.max_actors {
            warn!(
                "Capping {} actors to {} for {}",
                pool.len(),
                self.config.max_actors,
                network
            );
            pool.sort_by(|x, y| {
                y.score
                    .partial_cmp(&x.score)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| x.actor_id.cmp(&y.actor_id))
            });
            pool.truncate(self.config.max_actors);
        }

        let mut ctx = EvidenceContext::new(&self.config);
        let mut candidate_edges = 0usize;
        let mut edges: Vec<ActorEdge> = Vec::new();
        for i in 0..pool.len() {
            for j in (i + 1)..pool.len() {
                let (a, b) = (pool[i], pool[j]);
                let evidence: Vec<EdgeEvidence> = self
                    .sources
                    .iter()
                    .filter_map(|source| source.evaluate(a, b, &mut ctx))
                    .collect();
                if evidence.is_empty() {
                    continue;
                }
                candidate_edges += 1;

                let weight = self.combined_weight(a, b, &evidence);
                if weight < self.config.min_edge_weight {
                    continue;
                }
                let confidence = self.classify_confidence(a, b, weight);
                edges.push(
                    ActorEdge::new(a.actor_id.clone(), b.actor_id.clone())
                        .with_weight(weight)
                        .with_confidence(confidence)
                        .with_evidence(evidence),
                );
            }
        }

        edges.sort_by(|x, y| {
            y.weight
                .partial_cmp(&x.weight)
                .unwrap_or(Ordering::Equal)
                .then_with(|| x.a.cmp(&y.a))
                .then_with(|| x.b.cmp(&y.b))
        });
        if edges.len() > self.config.max_edges {
            warn!(
                "Truncating {} edges to {} for {}",
                edges.len(),
                self.config.max_edges,
                network
            );
            edges.truncate(self.config.max_edges);
        }

        let (assignments, clusters) = self.coarse_clusters(&pool, &edges);

        for edge in &mut edges {
            edge.weight = round_ratio(edge.weight);
            for signal in &mut edge.evidence {
                match signal {
                    EdgeEvidence::FlowCorrelation {
                        shared_volume_usd,
                        overlap_ratio,
                        ..
                    } => {
                        *shared_volume_usd = round_usd(*shared_volume_usd);
                        *overlap_ratio = round_ratio(*overlap_ratio);
                    }
                    EdgeEvidence::TokenOverlap { jaccard, .. } => {
                        *jaccard = round_ratio(*jaccard);
                    }
                    EdgeEvidence::DirectInteraction { volume_usd, .. } => {
                        *volume_usd = round_usd(*volume_usd);
                    }
                }
            }
        }

        let nodes: Vec<GraphNode> = pool
            .iter()
            .map(|a| GraphNode {
                id: a.actor_id.clone(),
                label: a.label.clone(),
                actor_type: a.actor_type.clone(),
                source_tier: a.source_tier,
                score: a.score,
                volume_usd: round_usd(a.volume_usd),
                coverage: round_ratio(a.coverage),
                cluster_id: assignments.get(a.actor_id.as_str()).cloned(),
            })
            .collect();

        debug!(
            "Graph for {} has {} nodes, {} edges, {} coarse clusters",
            network,
            nodes.len(),
            edges.len(),
            clusters.len()
        );

        Ok(ActorGraph {
            metadata: GraphMetadata {
                network: network.to_string(),
                window,
                generated_at,
                actor_count: nodes.len(),
                candidate_edges,
                emitted_edges: edges.len(),
                min_weight: self.config.min_edge_weight,
                evidence_mode: self.config.evidence_mode.clone(),
            },
            nodes,
            edges,
            clusters,
        })
    }

    /// Weighted sum of the signal strengths plus the shared-coverage term,
    /// scaled by the weaker endpoint's trust factor.
    fn combined_weight(&self, a: &ActorRecord, b: &ActorRecord, evidence: &[EdgeEvidence]) -> f64 {
        let mut s_flow = 0.0;
        let mut s_token = 0.0;
        let mut s_direct = 0.0;
        for signal in evidence {
            let strength = signal.strength(self.config.direct_strength_scale);
            match signal {
                EdgeEvidence::FlowCorrelation { .. } => s_flow = strength,
                EdgeEvidence::TokenOverlap { .. } => s_token = strength,
                EdgeEvidence::DirectInteraction { .. } => s_direct = strength,
            }
        }
        let clamp01 = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        let s_cov = clamp01(a.coverage).min(clamp01(b.coverage));

        let raw = self.config.weight_flow * s_flow
            + self.config.weight_token * s_token
            + self.config.weight_direct * s_direct
            + self.config.weight_coverage * s_cov;
        let trust = a
            .source_tier
            .trust_factor()
            .min(b.source_tier.trust_factor());
        raw * trust
    }

    fn classify_confidence(&self, a: &ActorRecord, b: &ActorRecord, weight: f64) -> Confidence {
        let both_verified =
            a.source_tier == SourceTier::Verified && b.source_tier == SourceTier::Verified;
        let any_behavioral =
            a.source_tier == SourceTier::Behavioral || b.source_tier == SourceTier::Behavioral;
        if weight >= self.config.confidence_high_min && both_verified {
            Confidence::High
        } else if weight >= self.config.confidence_medium_min && !any_behavioral {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// Greedy display clustering: highest-score non-behavioral anchors
    /// absorb adjacent unassigned nodes, strongest surviving edge first.
    fn coarse_clusters(
        &self,
        pool: &[&ActorRecord],
        edges: &[ActorEdge],
    ) -> (FxHashMap<ActorId, String>, Vec<GraphCluster>) {
        let mut adjacency: FxHashMap<&str, Vec<(&str, f64)>> = FxHashMap::default();
        for edge in edges {
            adjacency
                .entry(edge.a.as_str())
                .or_default()
                .push((edge.b.as_str(), edge.weight));
            adjacency
                .entry(edge.b.as_str())
                .or_default()
                .push((edge.a.as_str(), edge.weight));
        }

        let score_of: FxHashMap<&str, f64> = pool
            .iter()
            .map(|a| (a.actor_id.as_str(), a.score))
            .collect();
        let mut anchors: Vec<&ActorRecord> = pool
            .iter()
            .copied()
            .filter(|a| a.source_tier != SourceTier::Behavioral)
            .collect();
        anchors.sort_by(|x, y| {
            y.score
                .partial_cmp(&x.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| x.actor_id.cmp(&y.actor_id))
        });

        let mut assignments: FxHashMap<ActorId, String> = FxHashMap::default();
        let mut clusters = Vec::new();
        for anchor in anchors {
            if assignments.contains_key(anchor.actor_id.as_str()) {
                continue;
            }
            let cluster_id = format!("cluster-{}", clusters.len() + 1);
            let mut members = vec![anchor.actor_id.clone()];
            assignments.insert(anchor.actor_id.clone(), cluster_id.clone());

            while members.len() < self.config.max_cluster_size {
                let mut best: Option<(&str, f64)> = None;
                for member in &members {
                    let Some(peers) = adjacency.get(member.as_str()) else {
                        continue;
                    };
                    for &(peer, weight) in peers {
                        if assignments.contains_key(peer) {
                            continue;
                        }
                        let better = match best {
                            None => true,
                            Some((best_peer, best_weight)) => {
                                weight > best_weight
                                    || (weight == best_weight && peer < best_peer)
                            }
                        };
                        if better {
                            best = Some((peer, weight));
                        }
                    }
                }
                match best {
                    Some((peer, _)) => {
                        assignments.insert(peer.to_string(), cluster_id.clone());
                        members.push(peer.to_string());
                    }
                    None => break,
                }
            }

            let combined_score = members
                .iter()
                .map(|m| score_of.get(m.as_str()).copied().unwrap_or(0.0))
                .sum();
            clusters.push(GraphCluster {
                id: cluster_id,
                anchor: anchor.actor_id.clone(),
                members,
                combined_score,
            });
        }

        (assignments, clusters)
    }
}

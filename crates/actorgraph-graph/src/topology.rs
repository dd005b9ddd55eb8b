use std::cmp::Ordering;

use actorgraph_core::util::{round_ratio, round_usd};
use actorgraph_core::{
    ActorId, ActorRole, MarketRegime, RelationRecord, RiskConfig, RiskLevel, TimeWindow,
    TopologyConfig,
};
use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::metrics::{
    brokerage_scores, gini_coefficient, k_core_decomposition, shannon_entropy, weighted_pagerank,
    PAGERANK_DAMPING, PAGERANK_ITERATIONS,
};

/// Per-actor topology profile. Ratios carry 4 decimal places and USD 2;
/// role and risk are classified before any rounding happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyRow {
    pub actor_id: ActorId,
    pub in_degree: usize,
    pub out_degree: usize,
    pub weighted_in_usd: f64,
    pub weighted_out_usd: f64,
    pub net_flow_usd: f64,
    pub output_entropy: f64,
    pub hub_score: f64,
    pub pagerank: f64,
    pub k_core: usize,
    pub brokerage: f64,
    pub role: ActorRole,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTopologyRow {
    pub network: String,
    pub window: TimeWindow,
    pub as_of: DateTime<Utc>,
    pub node_count: usize,
    pub edge_count: usize,
    pub centralization: f64,
    pub corridor_concentration: f64,
    pub entropy_index: f64,
    pub regime: MarketRegime,
}

/// Unrounded accumulation of one relation batch, shared by both topology
/// services so regime and role decisions never read rounded values. Flow
/// values are provider-weighted (`volume_usd × weight`); a non-positive
/// effective value contributes degree only.
struct FlowIndex {
    nodes: Vec<ActorId>,
    in_degree: FxHashMap<ActorId, usize>,
    out_degree: FxHashMap<ActorId, usize>,
    in_usd: FxHashMap<ActorId, f64>,
    out_usd: FxHashMap<ActorId, f64>,
    outflows: FxHashMap<ActorId, FxHashMap<ActorId, f64>>,
    corridors: FxHashMap<(ActorId, ActorId), f64>,
}

impl FlowIndex {
    fn build(relations: &[RelationRecord], config: &TopologyConfig) -> Self {
        if relations.len() > config.max_relations {
            warn!(
                "Capping {} relations to {}",
                relations.len(),
                config.max_relations
            );
        }
        let capped = &relations[..relations.len().min(config.max_relations)];
        let mut index = Self {
            nodes: Vec::new(),
            in_degree: FxHashMap::default(),
            out_degree: FxHashMap::default(),
            in_usd: FxHashMap::default(),
            out_usd: FxHashMap::default(),
            outflows: FxHashMap::default(),
            corridors: FxHashMap::default(),
        };
        let mut known: FxHashSet<String> = FxHashSet::default();
        let mut node_capped = 0usize;

        for relation in capped {
            let from = relation.from.trim();
            let to = relation.to.trim();
            if from.is_empty() || to.is_empty() || from == to {
                continue;
            }
            let mut incoming = 0;
            if !known.contains(from) {
                incoming += 1;
            }
            if !known.contains(to) {
                incoming += 1;
            }
            if known.len() + incoming > config.max_nodes {
                node_capped += 1;
                continue;
            }
            for id in [from, to] {
                if known.insert(id.to_string()) {
                    index.nodes.push(id.to_string());
                }
            }

            let volume = if relation.volume_usd.is_finite() && relation.volume_usd > 0.0 {
                relation.volume_usd
            } else {
                0.0
            };
            let weight = if relation.weight.is_finite() && relation.weight > 0.0 {
                relation.weight
            } else {
                0.0
            };
            let value = volume * weight;
            *index.out_degree.entry(from.to_string()).or_insert(0) += 1;
            *index.in_degree.entry(to.to_string()).or_insert(0) += 1;
            *index.out_usd.entry(from.to_string()).or_insert(0.0) += value;
            *index.in_usd.entry(to.to_string()).or_insert(0.0) += value;
            if value > 0.0 {
                *index
                    .outflows
                    .entry(from.to_string())
                    .or_default()
                    .entry(to.to_string())
                    .or_insert(0.0) += value;
                *index
                    .corridors
                    .entry((from.to_string(), to.to_string()))
                    .or_insert(0.0) += value;
            }
        }
        if node_capped > 0 {
            warn!(
                "Dropped {} relations at the {}-node cap",
                node_capped, config.max_nodes
            );
        }
        index
    }

    /// Weighted degree (in + out USD) per node, normalized by the maximum.
    fn hub_scores(&self) -> FxHashMap<ActorId, f64> {
        let mut scores = FxHashMap::default();
        let mut max = 0.0f64;
        for node in &self.nodes {
            let degree = self.in_usd.get(node).unwrap_or(&0.0)
                + self.out_usd.get(node).unwrap_or(&0.0);
            max = max.max(degree);
            scores.insert(node.clone(), degree);
        }
        if max > 0.0 {
            for value in scores.values_mut() {
                *value /= max;
            }
        }
        scores
    }

    fn directed_edges(&self) -> Vec<(&str, &str, f64)> {
        self.corridors
            .iter()
            .map(|((from, to), volume)| (from.as_str(), to.as_str(), *volume))
            .collect()
    }

    fn undirected_pairs(&self) -> Vec<(&str, &str)> {
        let mut seen = FxHashSet::default();
        let mut pairs = Vec::new();
        for (from, to) in self.corridors.keys() {
            let (lo, hi) = if from <= to {
                (from.as_str(), to.as_str())
            } else {
                (to.as_str(), from.as_str())
            };
            if seen.insert((lo, hi)) {
                pairs.push((lo, hi));
            }
        }
        pairs
    }

    fn output_entropy(&self, node: &str) -> f64 {
        match self.outflows.get(node) {
            Some(flows) => {
                let values: Vec<f64> = flows.values().copied().collect();
                shannon_entropy(&values)
            }
            None => 0.0,
        }
    }
}

fn classify_role(config: &TopologyConfig, hub: f64, entropy: f64, net: f64) -> ActorRole {
    if hub >= config.router_hub_min && entropy >= config.router_entropy_min {
        ActorRole::Router
    } else if net > 0.0 && entropy < config.accumulator_entropy_max {
        ActorRole::Accumulator
    } else if net < 0.0 && entropy > config.distributor_entropy_min {
        ActorRole::Distributor
    } else {
        ActorRole::Neutral
    }
}

fn classify_risk(
    config: &RiskConfig,
    role: ActorRole,
    hub: f64,
    k_core: usize,
    brokerage: f64,
) -> RiskLevel {
    if role == ActorRole::Router && k_core >= config.critical_k_core && hub >= config.critical_hub_min
    {
        RiskLevel::Critical
    } else if hub >= config.high_hub_min || k_core >= config.critical_k_core {
        RiskLevel::High
    } else if hub >= config.medium_hub_min || brokerage >= config.medium_brokerage_min {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Per-actor topology rows for one relation batch.
pub struct ActorTopologyService {
    config: TopologyConfig,
}

impl ActorTopologyService {
    pub fn new(config: TopologyConfig) -> Self {
        Self { config }
    }

    pub fn compute(&self, relations: &[RelationRecord]) -> Vec<TopologyRow> {
        let index = FlowIndex::build(relations, &self.config);
        debug!(
            "Computing actor topology over {} nodes, {} corridors",
            index.nodes.len(),
            index.corridors.len()
        );
        if index.nodes.is_empty() {
            return Vec::new();
        }

        let node_refs: Vec<&str> = index.nodes.iter().map(String::as_str).collect();
        let directed = index.directed_edges();
        let undirected = index.undirected_pairs();
        let pagerank =
            weighted_pagerank(&node_refs, &directed, PAGERANK_DAMPING, PAGERANK_ITERATIONS);
        let cores = k_core_decomposition(&node_refs, &undirected);
        let brokerage = brokerage_scores(&node_refs, &directed);
        let hub_scores = index.hub_scores();

        let mut rows: Vec<TopologyRow> = index
            .nodes
            .iter()
            .map(|node| {
                let in_usd = index.in_usd.get(node).copied().unwrap_or(0.0);
                let out_usd = index.out_usd.get(node).copied().unwrap_or(0.0);
                let net = in_usd - out_usd;
                let entropy = index.output_entropy(node);
                let hub = hub_scores.get(node).copied().unwrap_or(0.0);
                let core = cores.get(node).copied().unwrap_or(0);
                let broker = brokerage.get(node).copied().unwrap_or(0.0);
                let role = classify_role(&self.config, hub, entropy, net);
                let risk_level = classify_risk(&self.config.risk, role, hub, core, broker);

                TopologyRow {
                    actor_id: node.clone(),
                    in_degree: index.in_degree.get(node).copied().unwrap_or(0),
                    out_degree: index.out_degree.get(node).copied().unwrap_or(0),
                    weighted_in_usd: round_usd(in_usd),
                    weighted_out_usd: round_usd(out_usd),
                    net_flow_usd: round_usd(net),
                    output_entropy: round_ratio(entropy),
                    hub_score: round_ratio(hub),
                    pagerank: round_ratio(pagerank.get(node).copied().unwrap_or(0.0)),
                    k_core: core,
                    brokerage: round_ratio(broker),
                    role,
                    risk_level,
                }
            })
            .collect();

        rows.sort_by(|x, y| {
            let hx = hub_scores.get(&x.actor_id).copied().unwrap_or(0.0);
            let hy = hub_scores.get(&y.actor_id).copied().unwrap_or(0.0);
            hy.partial_cmp(&hx)
                .unwrap_or(Ordering::Equal)
                .then_with(|| x.actor_id.cmp(&y.actor_id))
        });
        rows
    }
}

/// Network-wide concentration profile for one relation batch.
pub struct MarketTopologyService {
    config: TopologyConfig,
}

impl MarketTopologyService {
    pub fn new(config: TopologyConfig) -> Self {
        Self { config }
    }

    pub fn compute(
        &self,
        network: &str,
        window: TimeWindow,
        as_of: DateTime<Utc>,
        relations: &[RelationRecord],
    ) -> MarketTopologyRow {
        let index = FlowIndex::build(relations, &self.config);
        debug!(
            "Computing market topology for {} over {}: {} nodes, {} corridors",
            network,
            window,
            index.nodes.len(),
            index.corridors.len()
        );
        if index.nodes.is_empty() {
            return MarketTopologyRow {
                network: network.to_string(),
                window,
                as_of,
                node_count: 0,
                edge_count: 0,
                centralization: 0.0,
                corridor_concentration: 0.0,
                entropy_index: 0.0,
                regime: MarketRegime::Neutral,
            };
        }

        let hub_scores = index.hub_scores();
        let hubs: Vec<f64> = index
            .nodes
            .iter()
            .map(|node| hub_scores.get(node).copied().unwrap_or(0.0))
            .collect();
        let centralization = gini_coefficient(&hubs);

        // Top outflow nodes' share of total outflow.
        let mut node_outflows: Vec<f64> = index
            .nodes
            .iter()
            .map(|node| index.out_usd.get(node).copied().unwrap_or(0.0))
            .collect();
        let total: f64 = node_outflows.iter().sum();
        node_outflows.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
        let top: f64 = node_outflows
            .iter()
            .take(self.config.top_outflow_count)
            .sum();
        let corridor_concentration = if total > 0.0 {
            (top / total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut ranked: Vec<(&ActorId, f64)> = index
            .nodes
            .iter()
            .map(|node| (node, hub_scores.get(node).copied().unwrap_or(0.0)))
            .collect();
        ranked.sort_by(|x, y| {
            y.1.partial_cmp(&x.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| x.0.cmp(y.0))
        });
        let top_entropies: Vec<f64> = ranked
            .iter()
            .take(self.config.top_hub_count)
            .map(|(node, _)| index.output_entropy(node))
            .collect();
        let entropy_index = if top_entropies.is_empty() {
            0.0
        } else {
            top_entropies.iter().sum::<f64>() / top_entropies.len() as f64
        };

        let regime = if centralization >= self.config.centralized_gini_min
            && entropy_index <= self.config.centralized_entropy_max
        {
            MarketRegime::Centralized
        } else if centralization <= self.config.distributed_gini_max
            && entropy_index >= self.config.distributed_entropy_min
        {
            MarketRegime::Distributed
        } else {
            MarketRegime::Neutral
        };

        MarketTopologyRow {
            network: network.to_string(),
            window,
            as_of,
            node_count: index.nodes.len(),
            edge_count: index.corridors.len(),
            centralization: round_ratio(centralization),
            corridor_concentration: round_ratio(corridor_concentration),
            entropy_index: round_ratio(entropy_index),
            regime,
        }
    }
}

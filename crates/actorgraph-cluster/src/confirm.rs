// ABOUTME: Falsification-style confirmation rules over resolved clusters
// ABOUTME: Verdict plus structured penalty tags and confidence adjustment

use actorgraph_core::ConfirmationConfig;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::builder::{Cluster, TraceEntry};
use crate::resolver::ClusterKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PenaltyTag {
    ClusterDominanceHigh,
    LowTypeDiversity,
    InfraClusterDetected,
}

impl fmt::Display for PenaltyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PenaltyTag::ClusterDominanceHigh => "CLUSTER_DOMINANCE_HIGH",
            PenaltyTag::LowTypeDiversity => "LOW_TYPE_DIVERSITY",
            PenaltyTag::InfraClusterDetected => "INFRA_CLUSTER_DETECTED",
        };
        write!(f, "{}", s)
    }
}

/// Verdict over one cluster set. Metrics are kept unrounded because the
/// penalty application reads them; rounding belongs to the presentation
/// layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResult {
    pub passed: bool,
    /// First falsifying rule, `None` when confirmed.
    pub reason: Option<String>,
    pub cluster_count: usize,
    pub total_weight: f64,
    pub top_cluster_weight: f64,
    /// Top cluster weight over total, defined as 1 when the total is 0.
    pub dominance: f64,
    pub source_diversity: usize,
    /// Sorted distinct source groups across all clusters;
    /// `source_diversity` is its length.
    pub source_groups: Vec<String>,
    pub mean_type_diversity: f64,
    pub penalties: Vec<PenaltyTag>,
    /// Per-actor resolution trail; populated by callers that resolved
    /// from actor records.
    #[serde(default)]
    pub trace: Vec<TraceEntry>,
}

impl ConfirmationResult {
    pub fn with_trace(mut self, trace: Vec<TraceEntry>) -> Self {
        self.trace = trace;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyStep {
    pub tag: PenaltyTag,
    pub multiplier: f64,
    /// Confidence removed by this step: `pre × (1 − multiplier)`.
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceAdjustment {
    pub raw: f64,
    pub adjusted: f64,
    /// Whether the failed-decision cap clamped the running value.
    pub capped: bool,
    pub steps: Vec<PenaltyStep>,
}

/// Applies the falsification rules in order; the first failing rule sets
/// the reason. Penalty tags are computed regardless of the verdict.
pub fn confirm_clusters(clusters: &[Cluster], config: &ConfirmationConfig) -> ConfirmationResult {
    let cluster_count = clusters.len();
    let mut total_weight = 0.0f64;
    let mut top_cluster_weight = 0.0f64;
    for cluster in clusters {
        let weight = if cluster.total_weight.is_finite() && cluster.total_weight > 0.0 {
            cluster.total_weight
        } else {
            0.0
        };
        total_weight += weight;
        top_cluster_weight = top_cluster_weight.max(weight);
    }
    let dominance = if total_weight > 0.0 {
        (top_cluster_weight / total_weight).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let mut groups: FxHashSet<&str> = FxHashSet::default();
    for cluster in clusters {
        for group in &cluster.source_groups {
            groups.insert(group.as_str());
        }
    }
    let mut source_groups: Vec<String> = groups.iter().map(|g| g.to_string()).collect();
    source_groups.sort();
    let source_diversity = source_groups.len();

    let mean_type_diversity = if cluster_count == 0 {
        0.0
    } else {
        clusters
            .iter()
            .map(|c| c.actor_types.len() as f64)
            .sum::<f64>()
            / cluster_count as f64
    };

    let reason = if cluster_count < config.min_cluster_count {
        Some("below minimum cluster count".to_string())
    } else if total_weight < config.min_total_weight {
        Some("below minimum total weight".to_string())
    } else if source_diversity < config.min_source_diversity {
        Some("insufficient source diversity".to_string())
    } else if cluster_count >= 2 && source_diversity == 1 {
        Some("all clusters from a single source".to_string())
    } else {
        None
    };

    let mut penalties = Vec::new();
    if dominance > config.dominance_soft_threshold {
        penalties.push(PenaltyTag::ClusterDominanceHigh);
    }
    if mean_type_diversity < config.type_diversity_min_mean {
        penalties.push(PenaltyTag::LowTypeDiversity);
    }
    if clusters.iter().any(|c| c.kind == ClusterKind::Infra) {
        penalties.push(PenaltyTag::InfraClusterDetected);
    }

    debug!(
        "Confirmation over {} clusters: passed={} dominance={:.4} diversity={}",
        cluster_count,
        reason.is_none(),
        dominance,
        source_diversity
    );

    ConfirmationResult {
        passed: reason.is_none(),
        reason,
        cluster_count,
        total_weight,
        top_cluster_weight,
        dominance,
        source_diversity,
        source_groups,
        mean_type_diversity,
        penalties,
        trace: Vec::new(),
    }
}

/// Applies the tagged penalties to a raw confidence score. The dominance
/// tag applies exactly one multiplier: the strong one at or above the
/// strong threshold, the soft one otherwise. A failed verdict caps the
/// final value; the cap is a clamp, never a multiplier.
pub fn apply_penalties(
    result: &ConfirmationResult,
    raw_confidence: f64,
    config: &ConfirmationConfig,
) -> ConfidenceAdjustment {
    let raw = if raw_confidence.is_finite() {
        raw_confidence
    } else {
        0.0
    };
    let mut running = raw;
    let mut steps = Vec::new();

    if result.penalties.contains(&PenaltyTag::ClusterDominanceHigh) {
        let multiplier = if result.dominance >= config.dominance_strong_threshold {
            config.dominance_strong_multiplier
        } else {
            config.dominance_soft_multiplier
        };
        let impact = running * (1.0 - multiplier);
        running *= multiplier;
        steps.push(PenaltyStep {
            tag: PenaltyTag::ClusterDominanceHigh,
            multiplier,
            impact,
        });
    }
    if result.penalties.contains(&PenaltyTag::LowTypeDiversity) {
        let multiplier = config.type_diversity_multiplier;
        let impact = running * (1.0 - multiplier);
        running *= multiplier;
        steps.push(PenaltyStep {
            tag: PenaltyTag::LowTypeDiversity,
            multiplier,
            impact,
        });
    }

    let mut capped = false;
    if !result.passed && running > config.failed_confidence_cap {
        running = config.failed_confidence_cap;
        capped = true;
    }

    ConfidenceAdjustment {
        raw,
        adjusted: running,
        capped,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cluster(id: &str, weight: f64, types: &[&str], groups: &[&str]) -> Cluster {
        Cluster {
            cluster_id: id.to_string(),
            kind: ClusterKind::Entity,
            total_weight: weight,
            actor_ids: vec![format!("{}-member", id)],
            actor_types: types.iter().map(|t| t.to_string()).collect(),
            source_groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn config() -> ConfirmationConfig {
        ConfirmationConfig::default()
    }

    #[test]
    fn empty_cluster_list_fails_on_count() {
        let result = confirm_clusters(&[], &config());
        assert!(!result.passed);
        assert_eq!(result.reason.as_deref(), Some("below minimum cluster count"));
        assert_eq!(result.cluster_count, 0);
        assert_eq!(result.total_weight, 0.0);
        assert_eq!(result.dominance, 1.0);
        assert!(result.source_groups.is_empty());
    }

    #[test]
    fn healthy_cluster_set_passes() {
        let clusters = vec![
            cluster("entity:a", 1.0, &["whale", "fund"], &["nansen"]),
            cluster("entity:b", 0.9, &["exchange", "whale"], &["arkham"]),
        ];
        let result = confirm_clusters(&clusters, &config());
        assert!(result.passed);
        assert!(result.reason.is_none());
        assert_relative_eq!(result.total_weight, 1.9);
        assert_relative_eq!(result.dominance, 1.0 / 1.9);
        assert_eq!(result.source_diversity, 2);
        assert_eq!(result.source_groups, ["arkham", "nansen"]);
        assert!(result.penalties.is_empty());
    }

    #[test]
    fn low_total_weight_fails_second() {
        let clusters = vec![
            cluster("entity:a", 0.5, &["whale", "fund"], &["nansen"]),
            cluster("entity:b", 0.5, &["exchange", "bot"], &["arkham"]),
        ];
        let result = confirm_clusters(&clusters, &config());
        assert!(!result.passed);
        assert_eq!(result.reason.as_deref(), Some("below minimum total weight"));
    }

    #[test]
    fn same_source_backstop_rejects_single_group() {
        let mut config = config();
        config.min_source_diversity = 1;
        let clusters = vec![
            cluster("entity:a", 1.0, &["whale", "fund"], &["nansen"]),
            cluster("entity:b", 1.0, &["exchange", "bot"], &["nansen"]),
        ];
        let result = confirm_clusters(&clusters, &config);
        assert!(!result.passed);
        assert_eq!(
            result.reason.as_deref(),
            Some("all clusters from a single source")
        );
        assert_eq!(result.source_groups, ["nansen"]);
    }

    #[test]
    fn same_source_backstop_spares_a_lone_cluster() {
        let mut config = config();
        config.min_cluster_count = 1;
        config.min_source_diversity = 1;
        let clusters = vec![cluster("entity:a", 1.5, &["whale", "fund"], &["nansen"])];
        let result = confirm_clusters(&clusters, &config);
        assert!(result.passed);
        assert!(result.reason.is_none());
        // penalties still accumulate on the degenerate shape
        assert!(result.penalties.contains(&PenaltyTag::ClusterDominanceHigh));
    }

    #[test]
    fn dominance_and_diversity_penalties_are_tagged_even_on_pass() {
        let clusters = vec![
            cluster("entity:a", 8.0, &["whale"], &["nansen"]),
            cluster("entity:b", 1.0, &["whale"], &["arkham"]),
        ];
        let result = confirm_clusters(&clusters, &config());
        assert!(result.passed);
        assert!(result.penalties.contains(&PenaltyTag::ClusterDominanceHigh));
        assert!(result.penalties.contains(&PenaltyTag::LowTypeDiversity));
    }

    #[test]
    fn infra_cluster_is_informational() {
        let mut infra = cluster("infra:kraken_hot", 2.0, &["whale", "bot"], &["nansen"]);
        infra.kind = ClusterKind::Infra;
        let clusters = vec![
            infra,
            cluster("entity:b", 2.0, &["exchange", "whale"], &["arkham"]),
        ];
        let result = confirm_clusters(&clusters, &config());
        assert!(result.passed);
        assert_eq!(result.penalties, vec![PenaltyTag::InfraClusterDetected]);

        let adjustment = apply_penalties(&result, 90.0, &config());
        assert!(adjustment.steps.is_empty());
        assert_relative_eq!(adjustment.adjusted, 90.0);
    }

    #[test]
    fn strong_dominance_applies_only_the_strong_multiplier() {
        let clusters = vec![
            cluster("entity:a", 9.0, &["whale", "fund"], &["nansen"]),
            cluster("entity:b", 1.0, &["exchange", "bot"], &["arkham"]),
        ];
        let result = confirm_clusters(&clusters, &config());
        assert_relative_eq!(result.dominance, 0.9);

        let adjustment = apply_penalties(&result, 80.0, &config());
        assert_eq!(adjustment.steps.len(), 1);
        assert_relative_eq!(adjustment.steps[0].multiplier, 0.70);
        assert_relative_eq!(adjustment.steps[0].impact, 80.0 * 0.30);
        assert_relative_eq!(adjustment.adjusted, 56.0);
        assert!(!adjustment.capped);
    }

    #[test]
    fn soft_dominance_band_uses_soft_multiplier() {
        let clusters = vec![
            cluster("entity:a", 3.0, &["whale", "fund"], &["nansen"]),
            cluster("entity:b", 1.0, &["exchange", "bot"], &["arkham"]),
        ];
        let result = confirm_clusters(&clusters, &config());
        assert_relative_eq!(result.dominance, 0.75);

        let adjustment = apply_penalties(&result, 80.0, &config());
        assert_eq!(adjustment.steps.len(), 1);
        assert_relative_eq!(adjustment.steps[0].multiplier, 0.85);
        assert_relative_eq!(adjustment.adjusted, 68.0);
    }

    #[test]
    fn failed_confirmation_caps_at_seventy_nine() {
        let clusters = vec![
            cluster("entity:a", 0.5, &["whale", "fund"], &["nansen"]),
            cluster("entity:b", 0.5, &["exchange", "bot"], &["arkham"]),
        ];
        let result = confirm_clusters(&clusters, &config());
        assert!(!result.passed);
        assert!(result.penalties.is_empty());

        let adjustment = apply_penalties(&result, 95.0, &config());
        assert!(adjustment.steps.is_empty());
        assert!(adjustment.capped);
        assert_relative_eq!(adjustment.adjusted, 79.0);
    }

    #[test]
    fn penalties_stack_before_the_cap() {
        let clusters = vec![
            cluster("entity:a", 9.0, &["whale"], &["nansen"]),
            cluster("entity:b", 1.0, &["whale"], &["nansen"]),
        ];
        let result = confirm_clusters(&clusters, &config());
        assert!(!result.passed); // single source group

        let adjustment = apply_penalties(&result, 100.0, &config());
        // strong dominance 0.70, then type diversity 0.85
        assert_eq!(adjustment.steps.len(), 2);
        assert_relative_eq!(adjustment.steps[0].impact, 30.0);
        assert_relative_eq!(adjustment.steps[1].impact, 70.0 * 0.15);
        assert_relative_eq!(adjustment.adjusted, 59.5);
        assert!(!adjustment.capped);
    }
}

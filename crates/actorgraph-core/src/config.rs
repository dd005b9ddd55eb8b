use std::path::Path;

use anyhow::{Context, Result};
use config as cfg;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How the synthetic evidence heuristics behave. `Deterministic` (the
/// default) makes every build reproducible; `Sampled` scales the
/// direct-interaction estimates by a random factor, optionally seeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EvidenceMode {
    Deterministic,
    Sampled {
        #[serde(default)]
        seed: Option<u64>,
    },
}

impl Default for EvidenceMode {
    fn default() -> Self {
        EvidenceMode::Deterministic
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GraphBuilderConfig {
    /// Input cap applied before the pairwise evidence loop.
    #[serde(default = "GraphBuilderConfig::default_max_actors")]
    pub max_actors: usize,
    /// Estimated shared volume below this floor produces no flow signal.
    #[serde(default = "GraphBuilderConfig::default_flow_volume_floor_usd")]
    pub flow_volume_floor_usd: f64,
    /// Inflow/outflow ratio beyond which an actor counts as directional.
    #[serde(default = "GraphBuilderConfig::default_balanced_ratio")]
    pub balanced_ratio: f64,
    #[serde(default = "GraphBuilderConfig::default_direct_min_tx_count")]
    pub direct_min_tx_count: u64,
    #[serde(default = "GraphBuilderConfig::default_direct_tx_divisor")]
    pub direct_tx_divisor: u64,
    #[serde(default = "GraphBuilderConfig::default_direct_volume_share")]
    pub direct_volume_share: f64,
    #[serde(default = "GraphBuilderConfig::default_direct_strength_scale")]
    pub direct_strength_scale: f64,
    #[serde(default = "GraphBuilderConfig::default_weight_flow")]
    pub weight_flow: f64,
    #[serde(default = "GraphBuilderConfig::default_weight_token")]
    pub weight_token: f64,
    #[serde(default = "GraphBuilderConfig::default_weight_direct")]
    pub weight_direct: f64,
    #[serde(default = "GraphBuilderConfig::default_weight_coverage")]
    pub weight_coverage: f64,
    /// Trust-adjusted weights below this floor are discarded.
    #[serde(default = "GraphBuilderConfig::default_min_edge_weight")]
    pub min_edge_weight: f64,
    #[serde(default = "GraphBuilderConfig::default_confidence_high_min")]
    pub confidence_high_min: f64,
    #[serde(default = "GraphBuilderConfig::default_confidence_medium_min")]
    pub confidence_medium_min: f64,
    #[serde(default = "GraphBuilderConfig::default_max_edges")]
    pub max_edges: usize,
    #[serde(default = "GraphBuilderConfig::default_max_cluster_size")]
    pub max_cluster_size: usize,
    #[serde(default)]
    pub evidence_mode: EvidenceMode,
}

impl GraphBuilderConfig {
    fn default_max_actors() -> usize {
        150
    }

    fn default_flow_volume_floor_usd() -> f64 {
        10_000.0
    }

    fn default_balanced_ratio() -> f64 {
        1.5
    }

    fn default_direct_min_tx_count() -> u64 {
        5
    }

    fn default_direct_tx_divisor() -> u64 {
        10
    }

    fn default_direct_volume_share() -> f64 {
        0.05
    }

    fn default_direct_strength_scale() -> f64 {
        20.0
    }

    fn default_weight_flow() -> f64 {
        0.40
    }

    fn default_weight_token() -> f64 {
        0.20
    }

    fn default_weight_direct() -> f64 {
        0.25
    }

    fn default_weight_coverage() -> f64 {
        0.15
    }

    fn default_min_edge_weight() -> f64 {
        0.15
    }

    fn default_confidence_high_min() -> f64 {
        0.65
    }

    fn default_confidence_medium_min() -> f64 {
        0.40
    }

    fn default_max_edges() -> usize {
        400
    }

    fn default_max_cluster_size() -> usize {
        8
    }
}

impl Default for GraphBuilderConfig {
    fn default() -> Self {
        Self {
            max_actors: Self::default_max_actors(),
            flow_volume_floor_usd: Self::default_flow_volume_floor_usd(),
            balanced_ratio: Self::default_balanced_ratio(),
            direct_min_tx_count: Self::default_direct_min_tx_count(),
            direct_tx_divisor: Self::default_direct_tx_divisor(),
            direct_volume_share: Self::default_direct_volume_share(),
            direct_strength_scale: Self::default_direct_strength_scale(),
            weight_flow: Self::default_weight_flow(),
            weight_token: Self::default_weight_token(),
            weight_direct: Self::default_weight_direct(),
            weight_coverage: Self::default_weight_coverage(),
            min_edge_weight: Self::default_min_edge_weight(),
            confidence_high_min: Self::default_confidence_high_min(),
            confidence_medium_min: Self::default_confidence_medium_min(),
            max_edges: Self::default_max_edges(),
            max_cluster_size: Self::default_max_cluster_size(),
            evidence_mode: EvidenceMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RiskConfig {
    #[serde(default = "RiskConfig::default_critical_k_core")]
    pub critical_k_core: usize,
    #[serde(default = "RiskConfig::default_critical_hub_min")]
    pub critical_hub_min: f64,
    #[serde(default = "RiskConfig::default_high_hub_min")]
    pub high_hub_min: f64,
    #[serde(default = "RiskConfig::default_medium_hub_min")]
    pub medium_hub_min: f64,
    #[serde(default = "RiskConfig::default_medium_brokerage_min")]
    pub medium_brokerage_min: f64,
}

impl RiskConfig {
    fn default_critical_k_core() -> usize {
        3
    }

    fn default_critical_hub_min() -> f64 {
        0.80
    }

    fn default_high_hub_min() -> f64 {
        0.60
    }

    fn default_medium_hub_min() -> f64 {
        0.30
    }

    fn default_medium_brokerage_min() -> f64 {
        0.50
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            critical_k_core: Self::default_critical_k_core(),
            critical_hub_min: Self::default_critical_hub_min(),
            high_hub_min: Self::default_high_hub_min(),
            medium_hub_min: Self::default_medium_hub_min(),
            medium_brokerage_min: Self::default_medium_brokerage_min(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TopologyConfig {
    /// Relation cap applied before any accumulation.
    #[serde(default = "TopologyConfig::default_max_relations")]
    pub max_relations: usize,
    /// Distinct-node cap; relations introducing nodes past it are skipped.
    #[serde(default = "TopologyConfig::default_max_nodes")]
    pub max_nodes: usize,
    #[serde(default = "TopologyConfig::default_router_hub_min")]
    pub router_hub_min: f64,
    #[serde(default = "TopologyConfig::default_router_entropy_min")]
    pub router_entropy_min: f64,
    #[serde(default = "TopologyConfig::default_accumulator_entropy_max")]
    pub accumulator_entropy_max: f64,
    #[serde(default = "TopologyConfig::default_distributor_entropy_min")]
    pub distributor_entropy_min: f64,
    /// Outflow-node count feeding the corridor concentration share.
    #[serde(default = "TopologyConfig::default_top_outflow_count")]
    pub top_outflow_count: usize,
    #[serde(default = "TopologyConfig::default_top_hub_count")]
    pub top_hub_count: usize,
    #[serde(default = "TopologyConfig::default_centralized_gini_min")]
    pub centralized_gini_min: f64,
    #[serde(default = "TopologyConfig::default_centralized_entropy_max")]
    pub centralized_entropy_max: f64,
    #[serde(default = "TopologyConfig::default_distributed_gini_max")]
    pub distributed_gini_max: f64,
    #[serde(default = "TopologyConfig::default_distributed_entropy_min")]
    pub distributed_entropy_min: f64,
    #[serde(default)]
    pub risk: RiskConfig,
}

impl TopologyConfig {
    fn default_max_relations() -> usize {
        20_000
    }

    fn default_max_nodes() -> usize {
        2_000
    }

    fn default_router_hub_min() -> f64 {
        0.60
    }

    fn default_router_entropy_min() -> f64 {
        0.50
    }

    fn default_accumulator_entropy_max() -> f64 {
        0.40
    }

    fn default_distributor_entropy_min() -> f64 {
        0.60
    }

    fn default_top_outflow_count() -> usize {
        10
    }

    fn default_top_hub_count() -> usize {
        20
    }

    fn default_centralized_gini_min() -> f64 {
        0.65
    }

    fn default_centralized_entropy_max() -> f64 {
        0.45
    }

    fn default_distributed_gini_max() -> f64 {
        0.45
    }

    fn default_distributed_entropy_min() -> f64 {
        0.60
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            max_relations: Self::default_max_relations(),
            max_nodes: Self::default_max_nodes(),
            router_hub_min: Self::default_router_hub_min(),
            router_entropy_min: Self::default_router_entropy_min(),
            accumulator_entropy_max: Self::default_accumulator_entropy_max(),
            distributor_entropy_min: Self::default_distributor_entropy_min(),
            top_outflow_count: Self::default_top_outflow_count(),
            top_hub_count: Self::default_top_hub_count(),
            centralized_gini_min: Self::default_centralized_gini_min(),
            centralized_entropy_max: Self::default_centralized_entropy_max(),
            distributed_gini_max: Self::default_distributed_gini_max(),
            distributed_entropy_min: Self::default_distributed_entropy_min(),
            risk: RiskConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConfirmationConfig {
    #[serde(default = "ConfirmationConfig::default_min_cluster_count")]
    pub min_cluster_count: usize,
    #[serde(default = "ConfirmationConfig::default_min_total_weight")]
    pub min_total_weight: f64,
    #[serde(default = "ConfirmationConfig::default_min_source_diversity")]
    pub min_source_diversity: usize,
    /// Dominance above this gets the tag and the soft multiplier.
    #[serde(default = "ConfirmationConfig::default_dominance_soft_threshold")]
    pub dominance_soft_threshold: f64,
    /// Dominance at or above this swaps the soft multiplier for the strong one.
    #[serde(default = "ConfirmationConfig::default_dominance_strong_threshold")]
    pub dominance_strong_threshold: f64,
    #[serde(default = "ConfirmationConfig::default_dominance_soft_multiplier")]
    pub dominance_soft_multiplier: f64,
    #[serde(default = "ConfirmationConfig::default_dominance_strong_multiplier")]
    pub dominance_strong_multiplier: f64,
    #[serde(default = "ConfirmationConfig::default_type_diversity_min_mean")]
    pub type_diversity_min_mean: f64,
    #[serde(default = "ConfirmationConfig::default_type_diversity_multiplier")]
    pub type_diversity_multiplier: f64,
    /// Hard cap applied to adjusted confidence when the decision failed.
    #[serde(default = "ConfirmationConfig::default_failed_confidence_cap")]
    pub failed_confidence_cap: f64,
}

impl ConfirmationConfig {
    fn default_min_cluster_count() -> usize {
        2
    }

    fn default_min_total_weight() -> f64 {
        1.2
    }

    fn default_min_source_diversity() -> usize {
        2
    }

    fn default_dominance_soft_threshold() -> f64 {
        0.70
    }

    fn default_dominance_strong_threshold() -> f64 {
        0.85
    }

    fn default_dominance_soft_multiplier() -> f64 {
        0.85
    }

    fn default_dominance_strong_multiplier() -> f64 {
        0.70
    }

    fn default_type_diversity_min_mean() -> f64 {
        1.2
    }

    fn default_type_diversity_multiplier() -> f64 {
        0.85
    }

    fn default_failed_confidence_cap() -> f64 {
        79.0
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            min_cluster_count: Self::default_min_cluster_count(),
            min_total_weight: Self::default_min_total_weight(),
            min_source_diversity: Self::default_min_source_diversity(),
            dominance_soft_threshold: Self::default_dominance_soft_threshold(),
            dominance_strong_threshold: Self::default_dominance_strong_threshold(),
            dominance_soft_multiplier: Self::default_dominance_soft_multiplier(),
            dominance_strong_multiplier: Self::default_dominance_strong_multiplier(),
            type_diversity_min_mean: Self::default_type_diversity_min_mean(),
            type_diversity_multiplier: Self::default_type_diversity_multiplier(),
            failed_confidence_cap: Self::default_failed_confidence_cap(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct Settings {
    #[serde(default)]
    pub graph: GraphBuilderConfig,
    #[serde(default)]
    pub topology: TopologyConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
}

impl Settings {
    /// Loads layered configuration: `default.toml`, then `local.toml`,
    /// then `ACTORGRAPH_`-prefixed environment variables. Every source is
    /// optional; absent sources leave the compiled defaults in place.
    pub fn load_from_dir(config_dir: &Path) -> Result<Settings> {
        let builder = cfg::Config::builder()
            .add_source(cfg::File::from(config_dir.join("default.toml")).required(false))
            .add_source(cfg::File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                cfg::Environment::with_prefix("ACTORGRAPH")
                    .separator("__")
                    .try_parsing(true),
            );

        let settings = builder
            .build()
            .context("failed to assemble configuration sources")?
            .try_deserialize::<Settings>()
            .context("failed to deserialize configuration")?;
        Ok(settings)
    }
}

// ABOUTME: Pluggable evidence sources that score actor pairs for the graph builder
// ABOUTME: Flow correlation, token overlap, and direct interaction, with optional sampling

use crate::EdgeEvidence;
use actorgraph_core::{ActorRecord, EvidenceMode, FlowDirection, GraphBuilderConfig};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowBias {
    Inbound,
    Outbound,
    Balanced,
}

fn flow_bias(record: &ActorRecord, balanced_ratio: f64) -> FlowBias {
    let inflow = record.inflow_usd.max(0.0);
    let outflow = record.outflow_usd.max(0.0);
    if inflow > outflow * balanced_ratio {
        FlowBias::Inbound
    } else if outflow > inflow * balanced_ratio {
        FlowBias::Outbound
    } else {
        FlowBias::Balanced
    }
}

/// Per-build evaluation state shared by all sources. Holds the config and
/// the sampling RNG, so the builder stays free of module-level state.
pub struct EvidenceContext<'a> {
    pub config: &'a GraphBuilderConfig,
    rng: Option<SmallRng>,
}

impl<'a> EvidenceContext<'a> {
    pub fn new(config: &'a GraphBuilderConfig) -> Self {
        let rng = match &config.evidence_mode {
            EvidenceMode::Deterministic => None,
            EvidenceMode::Sampled { seed } => Some(match seed {
                Some(seed) => SmallRng::seed_from_u64(*seed),
                None => SmallRng::from_os_rng(),
            }),
        };
        Self { config, rng }
    }

    /// Scaling factor for synthetic estimates: uniform in [0.5, 1.0] when
    /// sampling, exactly 1.0 in deterministic mode.
    pub fn sample_factor(&mut self) -> f64 {
        match self.rng.as_mut() {
            Some(rng) => rng.random_range(0.5..=1.0),
            None => 1.0,
        }
    }
}

/// One evidence signal. Sources are stateless; anything mutable lives in
/// the [`EvidenceContext`].
pub trait EvidenceSource: Send + Sync {
    fn evaluate(
        &self,
        a: &ActorRecord,
        b: &ActorRecord,
        ctx: &mut EvidenceContext<'_>,
    ) -> Option<EdgeEvidence>;
}

/// Shared-volume estimate from relative volume overlap, with a USD floor.
pub struct FlowCorrelationSource;

impl EvidenceSource for FlowCorrelationSource {
    fn evaluate(
        &self,
        a: &ActorRecord,
        b: &ActorRecord,
        ctx: &mut EvidenceContext<'_>,
    ) -> Option<EdgeEvidence> {
        let (lo, hi) = if a.volume_usd <= b.volume_usd {
            (a.volume_usd, b.volume_usd)
        } else {
            (b.volume_usd, a.volume_usd)
        };
        if !hi.is_finite() || hi <= 0.0 || !lo.is_finite() || lo <= 0.0 {
            return None;
        }
        let overlap_ratio = (lo / hi).clamp(0.0, 1.0);
        let shared_volume_usd = lo * overlap_ratio;
        if !shared_volume_usd.is_finite() || shared_volume_usd < ctx.config.flow_volume_floor_usd {
            return None;
        }

        let ratio = ctx.config.balanced_ratio;
        let direction = match (flow_bias(a, ratio), flow_bias(b, ratio)) {
            (FlowBias::Inbound, FlowBias::Inbound) => FlowDirection::InIn,
            (FlowBias::Outbound, FlowBias::Outbound) => FlowDirection::OutOut,
            (FlowBias::Inbound, FlowBias::Outbound) | (FlowBias::Outbound, FlowBias::Inbound) => {
                FlowDirection::InOut
            }
            _ => FlowDirection::Bidirectional,
        };

        Some(EdgeEvidence::FlowCorrelation {
            shared_volume_usd,
            overlap_ratio,
            direction,
        })
    }
}

/// Jaccard index over the two actors' normalized token sets.
pub struct TokenOverlapSource;

impl EvidenceSource for TokenOverlapSource {
    fn evaluate(
        &self,
        a: &ActorRecord,
        b: &ActorRecord,
        _ctx: &mut EvidenceContext<'_>,
    ) -> Option<EdgeEvidence> {
        let tokens_a: HashSet<String> = a.effective_tokens().into_iter().collect();
        let tokens_b: HashSet<String> = b.effective_tokens().into_iter().collect();
        let intersection = tokens_a.intersection(&tokens_b).count();
        if intersection == 0 {
            return None;
        }
        let union = tokens_a.union(&tokens_b).count();
        let jaccard = intersection as f64 / union as f64;

        let mut shared_tokens: Vec<String> =
            tokens_a.intersection(&tokens_b).cloned().collect();
        shared_tokens.sort();

        Some(EdgeEvidence::TokenOverlap {
            jaccard,
            shared_tokens,
        })
    }
}

/// Synthetic interaction estimate for pairs touching a market venue.
pub struct DirectInteractionSource;

impl EvidenceSource for DirectInteractionSource {
    fn evaluate(
        &self,
        a: &ActorRecord,
        b: &ActorRecord,
        ctx: &mut EvidenceContext<'_>,
    ) -> Option<EdgeEvidence> {
        if !(a.actor_type.is_market_venue() || b.actor_type.is_market_venue()) {
            return None;
        }
        let floor_tx = a.tx_count.min(b.tx_count);
        if floor_tx < ctx.config.direct_min_tx_count {
            return None;
        }

        let factor = ctx.sample_factor();
        let divisor = ctx.config.direct_tx_divisor.max(1);
        let base_tx = (floor_tx / divisor).max(1);
        let tx_count = ((base_tx as f64 * factor).round() as u64).max(1);
        let volume_usd =
            a.volume_usd.min(b.volume_usd).max(0.0) * ctx.config.direct_volume_share * factor;

        Some(EdgeEvidence::DirectInteraction {
            tx_count,
            volume_usd,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actorgraph_core::{ActorType, SourceTier};
    use approx::assert_relative_eq;

    fn whale(id: &str, inflow: f64, outflow: f64) -> ActorRecord {
        ActorRecord::new(id, ActorType::Whale, SourceTier::Verified).with_flows(inflow, outflow)
    }

    fn ctx_config() -> GraphBuilderConfig {
        GraphBuilderConfig::default()
    }

    #[test]
    fn flow_correlation_below_floor_is_null() {
        let config = ctx_config();
        let mut ctx = EvidenceContext::new(&config);
        let a = whale("a", 3_000.0, 2_000.0);
        let b = whale("b", 2_500.0, 2_500.0);
        assert!(FlowCorrelationSource.evaluate(&a, &b, &mut ctx).is_none());
    }

    #[test]
    fn flow_correlation_ratio_and_shared_volume() {
        let config = ctx_config();
        let mut ctx = EvidenceContext::new(&config);
        let a = whale("a", 100_000.0, 100_000.0); // volume 200k
        let b = whale("b", 50_000.0, 50_000.0); // volume 100k
        let evidence = FlowCorrelationSource.evaluate(&a, &b, &mut ctx).unwrap();
        match evidence {
            EdgeEvidence::FlowCorrelation {
                shared_volume_usd,
                overlap_ratio,
                direction,
            } => {
                assert_relative_eq!(overlap_ratio, 0.5);
                assert_relative_eq!(shared_volume_usd, 50_000.0);
                assert_eq!(direction, FlowDirection::Bidirectional);
            }
            other => panic!("unexpected evidence: {:?}", other),
        }
    }

    #[test]
    fn flow_direction_tags() {
        let config = ctx_config();
        let mut ctx = EvidenceContext::new(&config);

        let sink_a = whale("a", 900_000.0, 100_000.0);
        let sink_b = whale("b", 800_000.0, 100_000.0);
        match FlowCorrelationSource.evaluate(&sink_a, &sink_b, &mut ctx).unwrap() {
            EdgeEvidence::FlowCorrelation { direction, .. } => {
                assert_eq!(direction, FlowDirection::InIn)
            }
            _ => unreachable!(),
        }

        let source_b = whale("b", 100_000.0, 800_000.0);
        match FlowCorrelationSource.evaluate(&sink_a, &source_b, &mut ctx).unwrap() {
            EdgeEvidence::FlowCorrelation { direction, .. } => {
                assert_eq!(direction, FlowDirection::InOut)
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn token_overlap_jaccard() {
        let config = ctx_config();
        let mut ctx = EvidenceContext::new(&config);
        let a = whale("a", 0.0, 0.0).with_tokens(vec!["PEPE".into(), "WIF".into(), "BONK".into()]);
        let b = whale("b", 0.0, 0.0).with_tokens(vec!["pepe".into(), "wif".into(), "JUP".into()]);
        match TokenOverlapSource.evaluate(&a, &b, &mut ctx).unwrap() {
            EdgeEvidence::TokenOverlap {
                jaccard,
                shared_tokens,
            } => {
                assert_relative_eq!(jaccard, 0.5);
                assert_eq!(shared_tokens, vec!["pepe".to_string(), "wif".to_string()]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn disjoint_token_sets_are_null() {
        let config = ctx_config();
        let mut ctx = EvidenceContext::new(&config);
        let a = whale("a", 0.0, 0.0).with_tokens(vec!["PEPE".into()]);
        let b = whale("b", 0.0, 0.0).with_tokens(vec!["JUP".into()]);
        assert!(TokenOverlapSource.evaluate(&a, &b, &mut ctx).is_none());
    }

    #[test]
    fn empty_token_sets_fall_back_to_type() {
        let config = ctx_config();
        let mut ctx = EvidenceContext::new(&config);
        let a = whale("a", 0.0, 0.0);
        let b = whale("b", 0.0, 0.0);
        match TokenOverlapSource.evaluate(&a, &b, &mut ctx).unwrap() {
            EdgeEvidence::TokenOverlap { jaccard, .. } => assert_relative_eq!(jaccard, 1.0),
            _ => unreachable!(),
        }
    }

    #[test]
    fn direct_interaction_requires_market_venue() {
        let config = ctx_config();
        let mut ctx = EvidenceContext::new(&config);
        let a = whale("a", 100_000.0, 100_000.0).with_tx_count(50);
        let b = whale("b", 100_000.0, 100_000.0).with_tx_count(50);
        assert!(DirectInteractionSource.evaluate(&a, &b, &mut ctx).is_none());

        let venue = ActorRecord::new("cex", ActorType::Exchange, SourceTier::Verified)
            .with_flows(1_000_000.0, 1_000_000.0)
            .with_tx_count(500);
        let evidence = DirectInteractionSource.evaluate(&a, &venue, &mut ctx).unwrap();
        match evidence {
            EdgeEvidence::DirectInteraction {
                tx_count,
                volume_usd,
            } => {
                assert_eq!(tx_count, 5); // min(50, 500) / 10
                assert_relative_eq!(volume_usd, 200_000.0 * 0.05);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn direct_interaction_tx_floor() {
        let config = ctx_config();
        let mut ctx = EvidenceContext::new(&config);
        let quiet = whale("a", 100_000.0, 100_000.0).with_tx_count(3);
        let venue = ActorRecord::new("cex", ActorType::Exchange, SourceTier::Verified)
            .with_flows(1_000_000.0, 1_000_000.0)
            .with_tx_count(500);
        assert!(DirectInteractionSource.evaluate(&quiet, &venue, &mut ctx).is_none());
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let mut config = ctx_config();
        config.evidence_mode = EvidenceMode::Sampled { seed: Some(99) };
        let a = whale("a", 100_000.0, 100_000.0).with_tx_count(200);
        let venue = ActorRecord::new("cex", ActorType::Exchange, SourceTier::Verified)
            .with_flows(1_000_000.0, 1_000_000.0)
            .with_tx_count(500);

        let mut ctx1 = EvidenceContext::new(&config);
        let mut ctx2 = EvidenceContext::new(&config);
        let first = DirectInteractionSource.evaluate(&a, &venue, &mut ctx1);
        let second = DirectInteractionSource.evaluate(&a, &venue, &mut ctx2);
        assert_eq!(first, second);
    }

    #[test]
    fn deterministic_factor_is_unity() {
        let config = ctx_config();
        let mut ctx = EvidenceContext::new(&config);
        assert_eq!(ctx.sample_factor(), 1.0);
        assert_eq!(ctx.sample_factor(), 1.0);
    }
}

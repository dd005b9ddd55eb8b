use actorgraph_core::{ActorId, Confidence, FlowDirection};
use serde::{Deserialize, Serialize};

/// Undirected evidence-backed relationship between two actors. The pair is
/// canonical: `a` sorts lexicographically before `b`, and at most one edge
/// exists per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorEdge {
    pub a: ActorId,
    pub b: ActorId,
    pub weight: f64,
    pub confidence: Confidence,
    pub evidence: Vec<EdgeEvidence>,
}

impl ActorEdge {
    pub fn new(a: impl Into<ActorId>, b: impl Into<ActorId>) -> Self {
        let (mut a, mut b) = (a.into(), b.into());
        if b < a {
            std::mem::swap(&mut a, &mut b);
        }
        Self {
            a,
            b,
            weight: 0.0,
            confidence: Confidence::Low,
            evidence: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<EdgeEvidence>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn touches(&self, actor_id: &str) -> bool {
        self.a == actor_id || self.b == actor_id
    }

    /// The other endpoint, if `actor_id` is one of the pair.
    pub fn peer_of(&self, actor_id: &str) -> Option<&str> {
        if self.a == actor_id {
            Some(&self.b)
        } else if self.b == actor_id {
            Some(&self.a)
        } else {
            None
        }
    }
}

/// One evidence signal behind an edge. Tagged so consumers can branch on
/// the kind without sniffing optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EdgeEvidence {
    #[serde(rename_all = "camelCase")]
    FlowCorrelation {
        shared_volume_usd: f64,
        overlap_ratio: f64,
        direction: FlowDirection,
    },
    #[serde(rename_all = "camelCase")]
    TokenOverlap {
        jaccard: f64,
        shared_tokens: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    DirectInteraction { tx_count: u64, volume_usd: f64 },
}

impl EdgeEvidence {
    /// Signal strength in [0, 1] feeding the combined edge weight.
    pub fn strength(&self, direct_scale: f64) -> f64 {
        match self {
            EdgeEvidence::FlowCorrelation { overlap_ratio, .. } => overlap_ratio.clamp(0.0, 1.0),
            EdgeEvidence::TokenOverlap { jaccard, .. } => jaccard.clamp(0.0, 1.0),
            EdgeEvidence::DirectInteraction { tx_count, .. } => {
                if direct_scale <= 0.0 {
                    1.0
                } else {
                    (*tx_count as f64 / direct_scale).min(1.0)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_canonicalized() {
        let edge = ActorEdge::new("zeta", "alpha");
        assert_eq!(edge.a, "alpha");
        assert_eq!(edge.b, "zeta");
        assert_eq!(edge.peer_of("alpha"), Some("zeta"));
        assert_eq!(edge.peer_of("omega"), None);
    }

    #[test]
    fn evidence_serializes_with_kind_tag() {
        let evidence = EdgeEvidence::FlowCorrelation {
            shared_volume_usd: 120_000.0,
            overlap_ratio: 0.42,
            direction: FlowDirection::InOut,
        };
        let json = serde_json::to_value(&evidence).unwrap();
        assert_eq!(json["kind"], "flowCorrelation");
        assert_eq!(json["direction"], "in-out");
        assert_eq!(json["sharedVolumeUsd"], 120_000.0);
    }

    #[test]
    fn direct_strength_saturates() {
        let evidence = EdgeEvidence::DirectInteraction {
            tx_count: 100,
            volume_usd: 1.0,
        };
        assert_eq!(evidence.strength(20.0), 1.0);
        let small = EdgeEvidence::DirectInteraction {
            tx_count: 5,
            volume_usd: 1.0,
        };
        assert_eq!(small.strength(20.0), 0.25);
    }
}
